use std::collections::VecDeque;

const LOG_CAP: usize = 200;

/// User input for one run. Immutable once submitted; consumed by the provider
/// thread and never retained across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
}

impl SearchCriteria {
    pub fn new(home_team: &str, away_team: &str, league: &str) -> Self {
        Self {
            home_team: home_team.trim().to_string(),
            away_team: away_team.trim().to_string(),
            league: league.trim().to_string(),
        }
    }
}

/// `resolved=false` means "not found", a normal terminal state rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReference {
    pub identifier: String,
    pub resolved: bool,
}

impl MatchReference {
    pub fn found(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            resolved: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            identifier: String::new(),
            resolved: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SiteSearchForm,
    SearchPageMatchAnchors,
    SearchPageAnyAnchor,
    SearchApi,
    SlugProbe,
}

pub fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::SiteSearchForm => "site search form",
        Strategy::SearchPageMatchAnchors => "search page (match links)",
        Strategy::SearchPageAnyAnchor => "search page (any link)",
        Strategy::SearchApi => "search API",
        Strategy::SlugProbe => "slug probe",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub label: String,
    pub url: String,
    pub event_id: Option<u64>,
}

/// Outcome of the resolver cascade. The first candidate is the canonical
/// reference; the search API strategy may leave further candidates here for
/// the user to disambiguate by eye.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub reference: MatchReference,
    pub strategy: Option<Strategy>,
    pub candidates: Vec<MatchCandidate>,
    pub notes: Vec<String>,
}

impl Resolution {
    pub fn not_found(notes: Vec<String>) -> Self {
        Self {
            reference: MatchReference::not_found(),
            strategy: None,
            candidates: Vec::new(),
            notes,
        }
    }
}

/// One extracted field. Fields are filled independently; values sourced from
/// different strategies are allowed to disagree.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Pair { home: f64, away: f64 },
    Total(f64),
    Text(String),
    Unavailable,
}

impl StatValue {
    pub fn is_available(&self) -> bool {
        !matches!(self, StatValue::Unavailable)
    }

    pub fn display(&self) -> String {
        match self {
            StatValue::Pair { home, away } => format!("{home} - {away}"),
            StatValue::Total(total) => format!("{total}"),
            StatValue::Text(text) => text.clone(),
            StatValue::Unavailable => "not available".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    EventApi,
    MatchPage,
}

pub fn stats_source_label(source: StatsSource) -> &'static str {
    match source {
        StatsSource::EventApi => "event API",
        StatsSource::MatchPage => "match page",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchStats {
    pub source: StatsSource,
    pub score_ht: StatValue,
    pub score_ft: StatValue,
    pub corners: StatValue,
    pub corners_ft_total: StatValue,
    pub corners_ht_total: StatValue,
    pub over_under_ht: StatValue,
    pub over_under_ft: StatValue,
    pub over_under_detail: StatValue,
    /// Bounded sample of the raw content, kept for eyeballing missed fields.
    pub raw_snippet: String,
}

impl MatchStats {
    pub fn empty(source: StatsSource) -> Self {
        Self {
            source,
            score_ht: StatValue::Unavailable,
            score_ft: StatValue::Unavailable,
            corners: StatValue::Unavailable,
            corners_ft_total: StatValue::Unavailable,
            corners_ht_total: StatValue::Unavailable,
            over_under_ht: StatValue::Unavailable,
            over_under_ft: StatValue::Unavailable,
            over_under_detail: StatValue::Unavailable,
            raw_snippet: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Resolving,
    Extracting,
    Analyzing,
    Done,
}

pub fn phase_label(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::Idle => "idle",
        RunPhase::Resolving => "locating match",
        RunPhase::Extracting => "collecting statistics",
        RunPhase::Analyzing => "requesting analysis",
        RunPhase::Done => "done",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Home,
    Away,
    League,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Home => FormField::Away,
            FormField::Away => FormField::League,
            FormField::League => FormField::Home,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Home => FormField::League,
            FormField::Away => FormField::Home,
            FormField::League => FormField::Away,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub home_input: String,
    pub away_input: String,
    pub league_input: String,
    pub focus: FormField,
    pub phase: RunPhase,
    pub resolution: Option<Resolution>,
    pub stats: Option<MatchStats>,
    pub stats_error: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            home_input: String::new(),
            away_input: String::new(),
            league_input: String::new(),
            focus: FormField::Home,
            phase: RunPhase::Idle,
            resolution: None,
            stats: None,
            stats_error: None,
            analysis: None,
            logs: VecDeque::with_capacity(LOG_CAP),
        }
    }

    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria::new(&self.home_input, &self.away_input, &self.league_input)
    }

    pub fn running(&self) -> bool {
        matches!(
            self.phase,
            RunPhase::Resolving | RunPhase::Extracting | RunPhase::Analyzing
        )
    }

    pub fn focused_input_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Home => &mut self.home_input,
            FormField::Away => &mut self.away_input,
            FormField::League => &mut self.league_input,
        }
    }

    pub fn clear_results(&mut self) {
        self.resolution = None;
        self.stats = None;
        self.stats_error = None;
        self.analysis = None;
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > LOG_CAP {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    RunStarted,
    SetResolution(Resolution),
    SetStats(MatchStats),
    StatsUnavailable(String),
    SetAnalysis(AnalysisResult),
    RunFinished,
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Analyze(SearchCriteria),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::RunStarted => {
            state.clear_results();
            state.phase = RunPhase::Resolving;
        }
        Delta::SetResolution(resolution) => {
            for note in &resolution.notes {
                state.push_log(format!("[INFO] {note}"));
            }
            state.phase = if resolution.reference.resolved {
                RunPhase::Extracting
            } else {
                RunPhase::Done
            };
            state.resolution = Some(resolution);
        }
        Delta::SetStats(stats) => {
            state.stats = Some(stats);
            state.stats_error = None;
            state.phase = RunPhase::Analyzing;
        }
        Delta::StatsUnavailable(reason) => {
            state.stats = None;
            state.stats_error = Some(reason);
        }
        Delta::SetAnalysis(result) => {
            state.analysis = Some(result);
        }
        Delta::RunFinished => {
            state.phase = RunPhase::Done;
        }
        Delta::Log(line) => state.push_log(line),
    }
}
