use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::http_client::Fetch;
use crate::query::normalize_ws;
use crate::resolve::{base_url, event_id_from_url};
use crate::state::{MatchReference, MatchStats, StatValue, StatsSource};

const SNIPPET_MAX: usize = 2_000;

// Labeled stat regions are short rows, not page-level containers.
const REGION_TEXT_MAX: usize = 120;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static CORNERS_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)corners?[^0-9]{0,40}?(\d{1,2})\s*[-:]\s*(\d{1,2})").unwrap());
static CORNERS_HT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bHT\b[^0-9]{0,40}?corners?[^0-9]{0,40}?(\d{1,2})\s*[-:]\s*(\d{1,2})").unwrap()
});
static SCORE_HT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bHT\b\s*[:.]?\s*(\d{1,2})\s*[-:]\s*(\d{1,2})").unwrap());
static SCORE_FT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:FT|full[ -]?time)\b\s*[:.]?\s*(\d{1,2})\s*[-:]\s*(\d{1,2})").unwrap()
});
static OVER_HT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(over\s*\d+(?:\.\d+)?)\s*HT").unwrap());
static OVER_FT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(over\s*\d+(?:\.\d+)?)\s*(?:full[ -]?time|FT)").unwrap());
static OVER_UNDER_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)over\s*/?\s*under.{0,180}").unwrap());

/// Numeric tokens of a matched substring: one token is a scalar, several are
/// the ordered list, none is absent. Callers handle both shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Numbers {
    One(f64),
    Many(Vec<f64>),
}

pub fn extract_numbers(s: &str) -> Option<Numbers> {
    let mut nums = Vec::new();
    for m in NUMBER_RE.find_iter(s) {
        if let Ok(n) = m.as_str().parse::<f64>() {
            nums.push(n);
        }
    }
    match nums.len() {
        0 => None,
        1 => Some(Numbers::One(nums[0])),
        _ => Some(Numbers::Many(nums)),
    }
}

/// Retrieve statistics for a resolved match. References carrying an event id
/// go through the JSON API; plain page URLs are scraped. Only the content
/// fetch itself can fail the operation ("no data"); everything below it
/// degrades per field.
pub fn fetch_match_stats(fetch: &dyn Fetch, reference: &MatchReference) -> Result<MatchStats> {
    match event_id_from_url(&reference.identifier.to_ascii_lowercase()) {
        Some(event_id) => fetch_api_stats(fetch, event_id),
        None => fetch_page_stats(fetch, &reference.identifier),
    }
}

fn fetch_api_stats(fetch: &dyn Fetch, event_id: u64) -> Result<MatchStats> {
    let base = base_url();
    let event_raw = fetch.get_text(&format!("{base}/api/v1/event/{event_id}"))?;

    let mut stats = MatchStats::empty(StatsSource::EventApi);
    apply_event_scores(&mut stats, &event_raw);

    // Corner counters live on a separate endpoint; losing it must not cost
    // us the score fields.
    if let Ok(stats_raw) = fetch.get_text(&format!("{base}/api/v1/event/{event_id}/statistics")) {
        apply_corner_counters(&mut stats, &stats_raw);
    }

    derive_over_under(&mut stats);
    stats.raw_snippet = bounded_snippet(&event_raw);
    Ok(stats)
}

fn fetch_page_stats(fetch: &dyn Fetch, url: &str) -> Result<MatchStats> {
    let html = fetch.get_text(url)?;
    Ok(extract_from_page(&html))
}

pub fn apply_event_scores(stats: &mut MatchStats, raw: &str) {
    let Ok(root) = serde_json::from_str::<Value>(raw.trim()) else {
        return;
    };
    let event = root.get("event").unwrap_or(&root);
    let home = event.get("homeScore").unwrap_or(&Value::Null);
    let away = event.get("awayScore").unwrap_or(&Value::Null);

    if let (Some(h), Some(a)) = (
        pick_number(home, &["period1", "halftime"]),
        pick_number(away, &["period1", "halftime"]),
    ) {
        stats.score_ht = StatValue::Pair { home: h, away: a };
    }
    if let (Some(h), Some(a)) = (
        pick_number(home, &["current", "normaltime", "display"]),
        pick_number(away, &["current", "normaltime", "display"]),
    ) {
        stats.score_ft = StatValue::Pair { home: h, away: a };
    }
}

pub fn apply_corner_counters(stats: &mut MatchStats, raw: &str) {
    let Ok(root) = serde_json::from_str::<Value>(raw.trim()) else {
        return;
    };
    let Some(periods) = root.get("statistics").and_then(|v| v.as_array()) else {
        return;
    };
    for period in periods {
        let name = period.get("period").and_then(|v| v.as_str()).unwrap_or("");
        let Some((home, away)) = find_corner_counts(period) else {
            continue;
        };
        match name {
            "ALL" => {
                stats.corners = StatValue::Pair { home, away };
                stats.corners_ft_total = StatValue::Total(home + away);
            }
            "1ST" => stats.corners_ht_total = StatValue::Total(home + away),
            _ => {}
        }
    }
}

fn find_corner_counts(period: &Value) -> Option<(f64, f64)> {
    let groups = period.get("groups").and_then(|v| v.as_array())?;
    for group in groups {
        let Some(items) = group.get("statisticsItems").and_then(|v| v.as_array()) else {
            continue;
        };
        for item in items {
            let name = item.get("name").and_then(|v| v.as_str()).unwrap_or("");
            if !name.to_ascii_lowercase().contains("corner") {
                continue;
            }
            let home = pick_number(item, &["homeValue", "home"]);
            let away = pick_number(item, &["awayValue", "away"]);
            if let (Some(home), Some(away)) = (home, away) {
                return Some((home, away));
            }
        }
    }
    None
}

// The event API carries no over/under market text; derive the markers from
// the goal totals.
fn derive_over_under(stats: &mut MatchStats) {
    if let StatValue::Pair { home, away } = stats.score_ht {
        stats.over_under_ht = StatValue::Text(goals_marker(home + away));
    }
    if let StatValue::Pair { home, away } = stats.score_ft {
        stats.over_under_ft = StatValue::Text(goals_marker(home + away));
    }
}

fn goals_marker(total: f64) -> String {
    if total <= 0.0 {
        return "0 goals (under 0.5)".to_string();
    }
    let noun = if total == 1.0 { "goal" } else { "goals" };
    format!("{total} {noun} (over {})", total - 0.5)
}

/// Unstructured path: labeled regions first (short elements naming the stat,
/// the way the original walked stat rows), then whole-text patterns. Every
/// attempt is independent; a miss leaves that one field unavailable.
pub fn extract_from_page(html: &str) -> MatchStats {
    let mut stats = MatchStats::empty(StatsSource::MatchPage);
    let text = page_text(html);

    for region in labeled_regions(html, &["corner"]) {
        if let Some(m) = CORNERS_PAIR_RE.find(&region)
            && let Some(Numbers::Many(nums)) = extract_numbers(m.as_str())
            && nums.len() >= 2
        {
            stats.corners = StatValue::Pair {
                home: nums[0],
                away: nums[1],
            };
            stats.corners_ft_total = StatValue::Total(nums[0] + nums[1]);
            break;
        }
    }
    if !stats.corners.is_available()
        && let Some(c) = CORNERS_PAIR_RE.captures(&text)
        && let (Some(h), Some(a)) = (parse_capture(&c, 1), parse_capture(&c, 2))
    {
        stats.corners = StatValue::Pair { home: h, away: a };
        stats.corners_ft_total = StatValue::Total(h + a);
    }

    // Half-time corners only from an explicitly HT-labeled pattern; never
    // synthesized from the full-time split.
    if let Some(c) = CORNERS_HT_RE.captures(&text)
        && let (Some(h), Some(a)) = (parse_capture(&c, 1), parse_capture(&c, 2))
    {
        stats.corners_ht_total = StatValue::Total(h + a);
    }

    if let Some(c) = SCORE_HT_RE.captures(&text)
        && let (Some(h), Some(a)) = (parse_capture(&c, 1), parse_capture(&c, 2))
    {
        stats.score_ht = StatValue::Pair { home: h, away: a };
    }
    if let Some(c) = SCORE_FT_RE.captures(&text)
        && let (Some(h), Some(a)) = (parse_capture(&c, 1), parse_capture(&c, 2))
    {
        stats.score_ft = StatValue::Pair { home: h, away: a };
    }

    if let Some(c) = OVER_HT_RE.captures(&text)
        && let Some(m) = c.get(1)
    {
        stats.over_under_ht = StatValue::Text(m.as_str().to_string());
    }
    if let Some(c) = OVER_FT_RE.captures(&text)
        && let Some(m) = c.get(1)
    {
        stats.over_under_ft = StatValue::Text(m.as_str().to_string());
    }
    if let Some(m) = OVER_UNDER_BLOCK_RE.find(&text) {
        stats.over_under_detail = StatValue::Text(m.as_str().trim().to_string());
    } else {
        for region in labeled_regions(html, &["over/under", "total goals"]) {
            stats.over_under_detail = StatValue::Text(region);
            break;
        }
    }

    stats.raw_snippet = bounded_snippet(&text);
    stats
}

fn labeled_regions(html: &str, keywords: &[&str]) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(selector) = Selector::parse("div, span, li, td, p") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for el in doc.select(&selector) {
        let text = normalize_ws(&el.text().collect::<Vec<_>>().join(" "));
        if text.is_empty() || text.len() > REGION_TEXT_MAX {
            continue;
        }
        let low = text.to_lowercase();
        if keywords.iter().any(|k| low.contains(k)) {
            out.push(text);
        }
    }
    out
}

fn page_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    normalize_ws(&doc.root_element().text().collect::<Vec<_>>().join(" "))
}

fn pick_number(value: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        let Some(v) = value.get(*key) else {
            continue;
        };
        if let Some(n) = v.as_f64() {
            return Some(n);
        }
        if let Some(s) = v.as_str()
            && let Ok(n) = s.trim().trim_end_matches('%').parse::<f64>()
        {
            return Some(n);
        }
    }
    None
}

fn parse_capture(captures: &regex::Captures, index: usize) -> Option<f64> {
    captures.get(index)?.as_str().parse().ok()
}

fn bounded_snippet(raw: &str) -> String {
    raw.trim().chars().take(SNIPPET_MAX).collect()
}
