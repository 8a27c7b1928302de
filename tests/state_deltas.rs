use sofa_terminal::state::{
    apply_delta, AnalysisResult, AppState, Delta, MatchReference, MatchStats, Resolution,
    RunPhase, StatsSource, Strategy,
};

fn resolved(url: &str) -> Resolution {
    Resolution {
        reference: MatchReference::found(url),
        strategy: Some(Strategy::SearchApi),
        candidates: Vec::new(),
        notes: vec!["search API: 1 candidate(s)".to_string()],
    }
}

#[test]
fn run_started_clears_previous_results() {
    let mut state = AppState::new();
    state.stats = Some(MatchStats::empty(StatsSource::EventApi));
    state.analysis = Some(AnalysisResult {
        text: "old".to_string(),
        is_error: false,
    });
    apply_delta(&mut state, Delta::RunStarted);
    assert!(state.stats.is_none());
    assert!(state.analysis.is_none());
    assert_eq!(state.phase, RunPhase::Resolving);
}

#[test]
fn unresolved_resolution_finishes_the_run() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::RunStarted);
    apply_delta(
        &mut state,
        Delta::SetResolution(Resolution::not_found(vec![
            "no strategy located the match".to_string(),
        ])),
    );
    assert_eq!(state.phase, RunPhase::Done);
    assert!(
        state
            .resolution
            .as_ref()
            .is_some_and(|r| !r.reference.resolved)
    );
    assert!(!state.logs.is_empty());
}

#[test]
fn resolved_run_advances_through_phases() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::RunStarted);
    apply_delta(
        &mut state,
        Delta::SetResolution(resolved("https://www.sofascore.com/event/1")),
    );
    assert_eq!(state.phase, RunPhase::Extracting);
    apply_delta(
        &mut state,
        Delta::SetStats(MatchStats::empty(StatsSource::EventApi)),
    );
    assert_eq!(state.phase, RunPhase::Analyzing);
    apply_delta(
        &mut state,
        Delta::SetAnalysis(AnalysisResult {
            text: "ok".to_string(),
            is_error: false,
        }),
    );
    apply_delta(&mut state, Delta::RunFinished);
    assert_eq!(state.phase, RunPhase::Done);
    assert!(state.analysis.is_some());
}

#[test]
fn stats_unavailable_keeps_the_reason() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::RunStarted);
    apply_delta(
        &mut state,
        Delta::SetResolution(resolved("https://www.sofascore.com/event/1")),
    );
    apply_delta(
        &mut state,
        Delta::StatsUnavailable("no data (request failed)".to_string()),
    );
    assert!(state.stats.is_none());
    assert!(
        state
            .stats_error
            .as_deref()
            .is_some_and(|r| r.starts_with("no data"))
    );
}

#[test]
fn log_tape_is_bounded() {
    let mut state = AppState::new();
    for i in 0..500 {
        state.push_log(format!("line {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 300"));
}
