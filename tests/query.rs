use sofa_terminal::query::{
    build_search_query, encoded_search_query, fold_for_match, normalize_ws, team_slug,
};
use sofa_terminal::state::SearchCriteria;

#[test]
fn query_contains_both_teams_verbatim() {
    let criteria = SearchCriteria::new("Flamengo", "São Paulo", "");
    let query = build_search_query(&criteria);
    assert!(!query.is_empty());
    assert!(query.contains("Flamengo"));
    assert!(query.contains("São Paulo"));
    assert_eq!(query, "Flamengo vs São Paulo");
}

#[test]
fn query_appends_league_when_present() {
    let criteria = SearchCriteria::new("Arsenal", "Chelsea", "Premier League");
    assert_eq!(
        build_search_query(&criteria),
        "Arsenal vs Chelsea Premier League"
    );
}

#[test]
fn query_trims_input_padding() {
    let criteria = SearchCriteria::new("  Flamengo ", " São Paulo ", "  ");
    assert_eq!(build_search_query(&criteria), "Flamengo vs São Paulo");
}

#[test]
fn encoded_query_is_url_safe() {
    let criteria = SearchCriteria::new("Flamengo", "São Paulo", "");
    let encoded = encoded_search_query(&criteria);
    assert!(!encoded.contains(' '));
    assert!(encoded.contains("Flamengo"));
}

#[test]
fn slugs_fold_accents() {
    assert_eq!(team_slug("São Paulo"), "sao-paulo");
    assert_eq!(team_slug("Atlético-MG"), "atletico-mg");
    assert_eq!(team_slug("  Grêmio  "), "gremio");
}

#[test]
fn fold_for_match_ignores_case_accents_and_symbols() {
    assert_eq!(fold_for_match("São Paulo"), "saopaulo");
    assert_eq!(fold_for_match("BRASILEIRÃO Série A"), "brasileiraoseriea");
    assert_eq!(fold_for_match("St. Pauli"), "stpauli");
}

#[test]
fn normalize_ws_collapses_runs() {
    assert_eq!(normalize_ws("  a \t b\n c "), "a b c");
}
