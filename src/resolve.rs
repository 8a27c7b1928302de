use std::env;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::http_client::Fetch;
use crate::query::{self, encoded_search_query};
use crate::state::{
    MatchCandidate, MatchReference, Resolution, SearchCriteria, Strategy, strategy_label,
};

pub const DEFAULT_BASE_URL: &str = "https://www.sofascore.com";

// The original page scan stopped after the first couple hundred anchors.
const ANCHOR_SCAN_LIMIT: usize = 200;

static MATCH_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[a-z0-9-]+-vs?-[a-z0-9-]+/").unwrap());
static EVENT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:/event/|#id:)(\d+)").unwrap());

pub fn base_url() -> String {
    env::var("SOFA_BASE_URL")
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

type StrategyFn = fn(&dyn Fetch, &SearchCriteria) -> Result<Vec<MatchCandidate>>;

/// Try each strategy in priority order and stop at the first one that yields
/// a candidate. A strategy error is that strategy producing nothing, never a
/// run failure; an empty cascade is the normal "not found" outcome.
pub fn resolve_match(fetch: &dyn Fetch, criteria: &SearchCriteria) -> Resolution {
    let strategies: [(Strategy, StrategyFn); 5] = [
        (Strategy::SiteSearchForm, try_site_search_form),
        (Strategy::SearchPageMatchAnchors, try_search_page_match_anchors),
        (Strategy::SearchPageAnyAnchor, try_search_page_any_anchor),
        (Strategy::SearchApi, try_search_api),
        (Strategy::SlugProbe, try_slug_probe),
    ];

    let mut notes = Vec::new();
    for (strategy, run) in strategies {
        match run(fetch, criteria) {
            Ok(candidates) if !candidates.is_empty() => {
                notes.push(format!(
                    "{}: {} candidate(s)",
                    strategy_label(strategy),
                    candidates.len()
                ));
                return Resolution {
                    reference: MatchReference::found(candidates[0].url.clone()),
                    strategy: Some(strategy),
                    candidates,
                    notes,
                };
            }
            Ok(_) => notes.push(format!("{}: nothing", strategy_label(strategy))),
            Err(err) => notes.push(format!("{}: {err:#}", strategy_label(strategy))),
        }
    }
    notes.push("no strategy located the match".to_string());
    Resolution::not_found(notes)
}

fn search_page_url(criteria: &SearchCriteria) -> String {
    format!("{}/search/{}", base_url(), encoded_search_query(criteria))
}

/// Strategy 1: find the site's own search box on the landing page (ordered
/// selector hints, most specific first), submit the query against the
/// enclosing form's action, and scan the results for match-shaped links.
fn try_site_search_form(fetch: &dyn Fetch, criteria: &SearchCriteria) -> Result<Vec<MatchCandidate>> {
    let base = base_url();
    let landing = fetch.get_text(&base)?;
    let Some(action) = parse_search_form_action(&landing) else {
        return Ok(Vec::new());
    };
    let url = format!(
        "{}?q={}",
        absolutize(&base, &action),
        encoded_search_query(criteria)
    );
    let results = fetch.get_text(&url)?;
    Ok(first_match_anchor(&results, &base).into_iter().collect())
}

/// Strategy 2: the conventional `/search/<query>` page; first anchor whose
/// href looks like a match/event URL wins.
fn try_search_page_match_anchors(
    fetch: &dyn Fetch,
    criteria: &SearchCriteria,
) -> Result<Vec<MatchCandidate>> {
    let html = fetch.get_text(&search_page_url(criteria))?;
    Ok(first_match_anchor(&html, &base_url()).into_iter().collect())
}

/// Strategy 3: same markup, looser filter; first anchor with a usable href.
fn try_search_page_any_anchor(
    fetch: &dyn Fetch,
    criteria: &SearchCriteria,
) -> Result<Vec<MatchCandidate>> {
    let html = fetch.get_text(&search_page_url(criteria))?;
    Ok(first_any_anchor(&html, &base_url()).into_iter().collect())
}

/// Strategy 4: the public search API. Unlike the page strategies this keeps
/// every accepted candidate, deferring disambiguation to the user.
fn try_search_api(fetch: &dyn Fetch, criteria: &SearchCriteria) -> Result<Vec<MatchCandidate>> {
    let url = format!(
        "{}/api/v1/search?q={}",
        base_url(),
        urlencoding::encode(criteria.home_team.trim())
    );
    let body = fetch.get_text(&url)?;
    parse_search_api(&body, criteria)
}

/// Strategy 5, last resort: probe the conventional `home-v-away` path and
/// accept it only if the response identifies as a site page.
fn try_slug_probe(fetch: &dyn Fetch, criteria: &SearchCriteria) -> Result<Vec<MatchCandidate>> {
    let home = query::team_slug(&criteria.home_team);
    let away = query::team_slug(&criteria.away_team);
    if home.is_empty() || away.is_empty() {
        return Ok(Vec::new());
    }
    let url = format!("{}/{home}-v-{away}/", base_url());
    let html = fetch.get_text(&url)?;
    if !page_is_site_page(&html) {
        return Ok(Vec::new());
    }
    Ok(vec![MatchCandidate {
        label: format!("{} v {}", criteria.home_team, criteria.away_team),
        url,
        event_id: None,
    }])
}

pub fn parse_search_form_action(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let hints = [
        "form input[type='search']",
        "form input[placeholder*='Search']",
        "form input[placeholder*='search']",
        "form input[aria-label='Search']",
    ];
    for hint in hints {
        let Ok(selector) = Selector::parse(hint) else {
            continue;
        };
        for input in doc.select(&selector) {
            for ancestor in input.ancestors() {
                let Some(el) = ElementRef::wrap(ancestor) else {
                    continue;
                };
                if el.value().name() != "form" {
                    continue;
                }
                if let Some(action) = el.value().attr("action") {
                    let action = action.trim();
                    if !action.is_empty() {
                        return Some(action.to_string());
                    }
                }
            }
        }
    }
    None
}

pub fn first_match_anchor(html: &str, base: &str) -> Option<MatchCandidate> {
    let doc = Html::parse_document(html);
    let anchors = Selector::parse("a").ok()?;
    for a in doc.select(&anchors).take(ANCHOR_SCAN_LIMIT) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let low = href.trim().to_ascii_lowercase();
        if low.contains("/match/") || low.contains("/event/") || MATCH_SLUG_RE.is_match(&low) {
            return Some(candidate_from_anchor(&a, href, base));
        }
    }
    None
}

pub fn first_any_anchor(html: &str, base: &str) -> Option<MatchCandidate> {
    let doc = Html::parse_document(html);
    let anchors = Selector::parse("a").ok()?;
    for a in doc.select(&anchors).take(ANCHOR_SCAN_LIMIT) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let trimmed = href.trim();
        if trimmed.is_empty()
            || trimmed == "/"
            || trimmed.starts_with('#')
            || trimmed.starts_with("javascript:")
        {
            continue;
        }
        return Some(candidate_from_anchor(&a, trimmed, base));
    }
    None
}

fn candidate_from_anchor(a: &ElementRef, href: &str, base: &str) -> MatchCandidate {
    let url = absolutize(base, href);
    let text = query::normalize_ws(&a.text().collect::<Vec<_>>().join(" "));
    let label = if text.is_empty() { url.clone() } else { text };
    let event_id = event_id_from_url(&url.to_ascii_lowercase());
    MatchCandidate {
        label,
        url,
        event_id,
    }
}

/// Entity-type and team/league filtering for the search API. A candidate
/// must pair both requested teams (accent-folded substring, either order);
/// the league filter applies only when a league was given.
pub fn parse_search_api(raw: &str, criteria: &SearchCriteria) -> Result<Vec<MatchCandidate>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid search json")?;
    let Some(results) = root.get("results").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let base = base_url();
    let mut out = Vec::new();
    for result in results {
        if result.get("type").and_then(|v| v.as_str()) != Some("event") {
            continue;
        }
        let Some(entity) = result.get("entity") else {
            continue;
        };
        let home = entity_name(entity, "homeTeam");
        let away = entity_name(entity, "awayTeam");
        let tournament = entity_name(entity, "tournament");
        if !teams_pair(criteria, &home, &away) {
            continue;
        }
        if !league_matches(&criteria.league, &tournament) {
            continue;
        }
        let Some(id) = entity.get("id").and_then(|v| v.as_u64()) else {
            continue;
        };
        let label = if tournament.is_empty() {
            format!("{home} vs {away}")
        } else {
            format!("{home} vs {away} ({tournament})")
        };
        out.push(MatchCandidate {
            label,
            url: format!("{base}/event/{id}"),
            event_id: Some(id),
        });
    }
    Ok(out)
}

fn entity_name(entity: &Value, key: &str) -> String {
    entity
        .get(key)
        .and_then(|v| v.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}

fn teams_pair(criteria: &SearchCriteria, home: &str, away: &str) -> bool {
    (name_matches(&criteria.home_team, home) && name_matches(&criteria.away_team, away))
        || (name_matches(&criteria.home_team, away) && name_matches(&criteria.away_team, home))
}

fn name_matches(wanted: &str, actual: &str) -> bool {
    let wanted = query::fold_for_match(wanted);
    let actual = query::fold_for_match(actual);
    !wanted.is_empty() && !actual.is_empty() && (actual.contains(&wanted) || wanted.contains(&actual))
}

fn league_matches(league: &str, tournament: &str) -> bool {
    let league = league.trim();
    if league.is_empty() {
        return true;
    }
    query::fold_for_match(tournament).contains(&query::fold_for_match(league))
}

pub fn page_is_site_page(html: &str) -> bool {
    let doc = Html::parse_document(html);
    let Ok(title) = Selector::parse("title") else {
        return false;
    };
    doc.select(&title)
        .next()
        .map(|t| {
            t.text()
                .collect::<String>()
                .to_ascii_lowercase()
                .contains("sofascore")
        })
        .unwrap_or(false)
}

pub fn event_id_from_url(url: &str) -> Option<u64> {
    EVENT_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn absolutize(base: &str, href: &str) -> String {
    let base = base.trim_end_matches('/');
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}
