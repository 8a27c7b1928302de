use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::ai_analysis::{self, AiConfig};
use crate::http_client::HttpFetch;
use crate::query;
use crate::resolve;
use crate::state::{Delta, ProviderCommand, SearchCriteria};
use crate::stats_fetch;

/// Single provider thread: owns all network work so the UI thread never
/// blocks. Commands are processed one at a time, in arrival order; runs are
/// never overlapped.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let fetch = HttpFetch;
        let ai_cfg = AiConfig::from_env();
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::Analyze(criteria) => run_pipeline(&tx, &fetch, &ai_cfg, &criteria),
            }
        }
    });
}

fn run_pipeline(tx: &Sender<Delta>, fetch: &HttpFetch, ai_cfg: &AiConfig, criteria: &SearchCriteria) {
    let _ = tx.send(Delta::RunStarted);
    let _ = tx.send(Delta::Log(format!(
        "[INFO] Searching for \"{}\"",
        query::build_search_query(criteria)
    )));

    let resolution = resolve::resolve_match(fetch, criteria);
    let reference = resolution.reference.clone();
    let _ = tx.send(Delta::SetResolution(resolution));

    if !reference.resolved {
        let _ = tx.send(Delta::Log("[WARN] Match not found".to_string()));
        let _ = tx.send(Delta::RunFinished);
        return;
    }
    let _ = tx.send(Delta::Log(format!("[INFO] Match found: {}", reference.identifier)));

    match stats_fetch::fetch_match_stats(fetch, &reference) {
        Ok(stats) => {
            let _ = tx.send(Delta::SetStats(stats.clone()));
            if !ai_cfg.is_configured() {
                let _ = tx.send(Delta::Log(
                    "[INFO] No analysis credential configured".to_string(),
                ));
            }
            let result = ai_analysis::request_analysis(ai_cfg, criteria, &stats);
            let _ = tx.send(Delta::SetAnalysis(result));
        }
        Err(err) => {
            let _ = tx.send(Delta::StatsUnavailable(format!("no data ({err:#})")));
            let _ = tx.send(Delta::Log(
                "[WARN] Statistics retrieval failed; skipping analysis".to_string(),
            ));
        }
    }
    let _ = tx.send(Delta::RunFinished);
}
