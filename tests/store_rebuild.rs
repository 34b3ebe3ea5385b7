use matchboard::store::{Project, RawMatch, Worker, rebuild};

fn worker(id: &str, name: &str, skills: &[&str], experience: f64) -> Worker {
    Worker {
        id: id.to_string(),
        name: name.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        experience,
    }
}

fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        required_skills: Vec::new(),
        min_experience: 0.0,
    }
}

fn pair(w: Option<Worker>, p: Option<Project>, score: f64) -> RawMatch {
    RawMatch {
        freelancer: w,
        project: p,
        score,
    }
}

#[test]
fn dedups_entities_by_id_with_last_record_winning() {
    let raw = vec![
        pair(Some(worker("f1", "Ada", &["go"], 2.0)), Some(project("p1", "X")), 70.0),
        pair(Some(worker("f2", "Ben", &[], 1.0)), Some(project("p2", "Y")), 50.0),
        // Same worker again with updated fields: the later record wins but
        // keeps the original position.
        pair(Some(worker("f1", "Ada L.", &["go", "rust"], 3.0)), Some(project("p1", "X")), 70.0),
    ];

    let set = rebuild(raw, 1);
    assert_eq!(set.freelancers.len(), 2);
    assert_eq!(set.projects.len(), 2);
    assert_eq!(set.freelancers[0].id, "f1");
    assert_eq!(set.freelancers[0].name, "Ada L.");
    assert_eq!(set.freelancers[0].skills, vec!["go", "rust"]);
    assert_eq!(set.freelancers[1].id, "f2");
}

#[test]
fn entities_from_invalid_matches_still_appear() {
    let raw = vec![
        pair(None, Some(project("p1", "Orphan project")), 0.0),
        pair(Some(worker("f1", "Solo", &[], 0.0)), None, 0.0),
    ];

    let set = rebuild(raw, 1);
    assert_eq!(set.freelancers.len(), 1);
    assert_eq!(set.projects.len(), 1);
    assert_eq!(set.valid_count(), 0);
    // Raw records are retained either way.
    assert_eq!(set.assignments.len(), 2);
}

#[test]
fn assignments_keep_insertion_order_and_duplicates() {
    let raw = vec![
        pair(Some(worker("f1", "A", &[], 0.0)), Some(project("p1", "X")), 90.0),
        pair(Some(worker("f1", "A", &[], 0.0)), Some(project("p1", "X")), 40.0),
        pair(None, None, 10.0),
    ];

    let set = rebuild(raw, 7);
    assert_eq!(set.assignments.len(), 3);
    assert_eq!(set.assignments[0].score, 90.0);
    assert_eq!(set.assignments[1].score, 40.0);
    assert_eq!(set.valid_count(), 2);
    assert_eq!(set.generation, 7);
}

#[test]
fn validity_requires_both_sides_identified() {
    assert!(!pair(Some(worker("", "Anon", &[], 0.0)), Some(project("p1", "X")), 80.0).is_valid());
    assert!(!pair(Some(worker("f1", "A", &[], 0.0)), Some(project("", "X")), 80.0).is_valid());
    assert!(!pair(None, Some(project("p1", "X")), 80.0).is_valid());
    assert!(pair(Some(worker("f1", "A", &[], 0.0)), Some(project("p1", "X")), 0.0).is_valid());
}
