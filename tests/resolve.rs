use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use sofa_terminal::http_client::Fetch;
use sofa_terminal::resolve::resolve_match;
use sofa_terminal::state::{SearchCriteria, Strategy};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Serves canned bodies by URL substring (first pattern wins) and records
/// every request, so tests can assert which strategies actually ran.
struct FixtureFetch {
    responses: Vec<(&'static str, String)>,
    requests: RefCell<Vec<String>>,
}

impl FixtureFetch {
    fn new(responses: Vec<(&'static str, String)>) -> Self {
        Self {
            responses,
            requests: RefCell::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetch for FixtureFetch {
    fn get_text(&self, url: &str) -> Result<String> {
        self.requests.borrow_mut().push(url.to_string());
        for (pattern, body) in &self.responses {
            if url.contains(pattern) {
                return Ok(body.clone());
            }
        }
        Err(anyhow::anyhow!("no fixture for {url}"))
    }
}

const LANDING_NO_FORM: &str = "<html><body><p>landing</p></body></html>";
const SEARCH_NO_ANCHORS: &str = "<html><body><div>No results</div></body></html>";

fn criteria() -> SearchCriteria {
    SearchCriteria::new("Flamengo", "São Paulo", "")
}

#[test]
fn site_search_form_is_tried_first() {
    let landing = r#"<html><body>
        <form action="/search"><input type="search" placeholder="Search" /></form>
    </body></html>"#;
    let results =
        r#"<html><body><a href="/event/987">Flamengo vs São Paulo</a></body></html>"#;
    let fetch = FixtureFetch::new(vec![
        ("/search?q=", results.to_string()),
        ("sofascore.com", landing.to_string()),
    ]);

    let resolution = resolve_match(&fetch, &criteria());
    assert!(resolution.reference.resolved);
    assert_eq!(resolution.strategy, Some(Strategy::SiteSearchForm));
    assert_eq!(resolution.candidates.len(), 1);
    assert_eq!(resolution.candidates[0].event_id, Some(987));
    assert_eq!(fetch.requests().len(), 2);
}

#[test]
fn search_page_match_anchor_wins_and_later_strategies_stay_idle() {
    let search_html = r#"<html><body>
        <a href="/">home</a>
        <a href="/football/match/flamengo-sao-paulo/abc#id:123">Flamengo - São Paulo</a>
    </body></html>"#;
    let fetch = FixtureFetch::new(vec![
        ("/search/", search_html.to_string()),
        ("sofascore.com", LANDING_NO_FORM.to_string()),
    ]);

    let resolution = resolve_match(&fetch, &criteria());
    assert!(resolution.reference.resolved);
    assert_eq!(resolution.strategy, Some(Strategy::SearchPageMatchAnchors));
    assert!(resolution.reference.identifier.contains("/football/match/"));
    assert_eq!(resolution.candidates.len(), 1);
    assert_eq!(resolution.candidates[0].event_id, Some(123));

    let requests = fetch.requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests.iter().any(|u| u.contains("/api/v1/search")));
    assert!(!requests.iter().any(|u| u.contains("-v-")));
}

#[test]
fn any_anchor_fallback_when_no_match_shaped_link() {
    let search_html = r##"<html><body>
        <a href="#top">top</a>
        <a href="/tournament/brasileirao">Brasileirão</a>
    </body></html>"##;
    let fetch = FixtureFetch::new(vec![
        ("/search/", search_html.to_string()),
        ("sofascore.com", LANDING_NO_FORM.to_string()),
    ]);

    let resolution = resolve_match(&fetch, &criteria());
    assert!(resolution.reference.resolved);
    assert_eq!(resolution.strategy, Some(Strategy::SearchPageAnyAnchor));
    assert!(
        resolution
            .reference
            .identifier
            .ends_with("/tournament/brasileirao")
    );
    assert_eq!(fetch.requests().len(), 3);
}

#[test]
fn search_api_filters_by_teams_and_league() {
    let fetch = FixtureFetch::new(vec![
        ("/api/v1/search", read_fixture("search_api.json")),
        ("/search/", SEARCH_NO_ANCHORS.to_string()),
        ("sofascore.com", LANDING_NO_FORM.to_string()),
    ]);

    let criteria = SearchCriteria::new("Flamengo", "São Paulo", "Brasileirão");
    let resolution = resolve_match(&fetch, &criteria);
    assert!(resolution.reference.resolved);
    assert_eq!(resolution.strategy, Some(Strategy::SearchApi));
    assert_eq!(resolution.candidates.len(), 1);
    assert_eq!(resolution.candidates[0].event_id, Some(112233));
    assert!(resolution.reference.identifier.ends_with("/event/112233"));
}

// A lone API hit with an unrelated tournament and opponent must be rejected:
// not-found beats a false match.
#[test]
fn unrelated_api_event_is_rejected_not_misresolved() {
    let fetch = FixtureFetch::new(vec![
        ("/api/v1/search", read_fixture("search_api_unrelated.json")),
        ("/search/", SEARCH_NO_ANCHORS.to_string()),
        ("sofascore.com", LANDING_NO_FORM.to_string()),
    ]);

    let resolution = resolve_match(&fetch, &criteria());
    assert!(!resolution.reference.resolved);
    assert!(resolution.strategy.is_none());
    assert!(resolution.candidates.is_empty());
}

#[test]
fn slug_probe_is_the_last_resort() {
    let match_page = r#"<html><head><title>Flamengo v Sao Paulo | SofaScore</title></head>
        <body></body></html>"#;
    let fetch = FixtureFetch::new(vec![
        ("/api/v1/search", r#"{"results":[]}"#.to_string()),
        ("/search/", SEARCH_NO_ANCHORS.to_string()),
        ("flamengo-v-sao-paulo", match_page.to_string()),
        ("sofascore.com", LANDING_NO_FORM.to_string()),
    ]);

    let resolution = resolve_match(&fetch, &criteria());
    assert!(resolution.reference.resolved);
    assert_eq!(resolution.strategy, Some(Strategy::SlugProbe));
    assert!(
        resolution
            .reference
            .identifier
            .contains("flamengo-v-sao-paulo")
    );
    assert_eq!(resolution.candidates[0].event_id, None);
}

#[test]
fn fetch_errors_resolve_to_not_found() {
    let fetch = FixtureFetch::new(Vec::new());
    let resolution = resolve_match(&fetch, &criteria());
    assert!(!resolution.reference.resolved);
    // Every strategy attempted exactly once, every failure swallowed.
    assert_eq!(fetch.requests().len(), 5);
}
