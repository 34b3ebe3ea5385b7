use std::fs;
use std::path::PathBuf;

use matchboard::match_fetch::{FetchError, parse_matches_json};
use matchboard::skill_fetch::parse_workers_json;
use matchboard::store::rebuild;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_matches_fixture() {
    let raw = read_fixture("matches.json");
    let matches = parse_matches_json(&raw).expect("fixture should parse");
    assert_eq!(matches.len(), 4);

    let first = matches[0].freelancer.as_ref().expect("first worker");
    assert_eq!(first.id, "f1");
    assert_eq!(first.skills, vec!["go", "rust"]);
    assert_eq!(matches[0].score, 85.0);

    // Partial record: missing side stays None, score defaults apply.
    assert!(matches[1].freelancer.is_none());
    assert!(!matches[1].is_valid());

    // Sparse worker: optional fields default instead of failing the load.
    let sparse = matches[2].freelancer.as_ref().expect("sparse worker");
    assert!(sparse.skills.is_empty());
    assert_eq!(sparse.experience, 0.0);

    // A record that is not even an object decodes to a fully empty match.
    assert!(!matches[3].is_valid());
    assert_eq!(matches[3].score, 0.0);
}

#[test]
fn fixture_flows_through_rebuild() {
    let raw = read_fixture("matches.json");
    let matches = parse_matches_json(&raw).expect("fixture should parse");
    let set = rebuild(matches, 1);

    assert_eq!(set.freelancers.len(), 2);
    assert_eq!(set.projects.len(), 2);
    assert_eq!(set.valid_count(), 2);
    assert_eq!(set.assignments.len(), 4);
}

#[test]
fn missing_matches_array_is_a_format_error() {
    let err = parse_matches_json("{\"results\": []}").unwrap_err();
    assert!(matches!(err, FetchError::Format(_)));
    assert_eq!(err.server_status(), "Error");

    let err = parse_matches_json("{\"matches\": 3}").unwrap_err();
    assert!(matches!(err, FetchError::Format(_)));
}

#[test]
fn invalid_json_body_is_a_format_error() {
    let err = parse_matches_json("<html>502</html>").unwrap_err();
    assert!(matches!(err, FetchError::Format(_)));
}

#[test]
fn parses_freelancer_lookup_fixture() {
    let raw = read_fixture("freelancers.json");
    let workers = parse_workers_json(&raw).expect("fixture should parse");
    assert_eq!(workers.len(), 2);
    assert_eq!(workers[1].id, "f7");
    assert_eq!(workers[1].experience, 1.5);
}

#[test]
fn empty_lookup_bodies_mean_no_results() {
    assert!(parse_workers_json("").expect("empty body").is_empty());
    assert!(parse_workers_json("null").expect("null body").is_empty());
    assert!(parse_workers_json("[]").expect("empty array").is_empty());
}
