use crate::state::SearchCriteria;

/// "Home vs Away League": the free-text shape the site search accepts.
/// Both team names appear verbatim; no validation happens here (empty names
/// are rejected by the form before a run starts).
pub fn build_search_query(criteria: &SearchCriteria) -> String {
    let mut parts = vec![
        criteria.home_team.trim(),
        "vs",
        criteria.away_team.trim(),
    ];
    let league = criteria.league.trim();
    if !league.is_empty() {
        parts.push(league);
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

/// The same query, percent-encoded for URL embedding.
pub fn encoded_search_query(criteria: &SearchCriteria) -> String {
    urlencoding::encode(&build_search_query(criteria)).into_owned()
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Accent-folded, lowercased, alphanumeric-only view of a name, used for
/// fuzzy team/league comparison. `São Paulo` → `saopaulo`.
pub fn fold_for_match(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.to_lowercase().chars() {
        let ch = fold_char(ch);
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        }
    }
    out
}

/// `São Paulo` → `sao-paulo`, for the conventional `home-v-away` match path.
pub fn team_slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.to_lowercase().chars() {
        let ch = fold_char(ch);
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

// Latin accents that actually show up in team names; anything else passes
// through and is dropped by the alphanumeric filter above.
fn fold_char(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        'š' => 's',
        'ž' => 'z',
        other => other,
    }
}
