use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A worker record as the scoring backend ships it. Optional fields default
/// so a sparse record never fails deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Worker {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub min_experience: f64,
}

/// One match record from the backend. Either side can be missing: the
/// backend emits partial rows for entities it failed to pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMatch {
    #[serde(default)]
    pub freelancer: Option<Worker>,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub score: f64,
}

impl RawMatch {
    /// Both sides present and identified.
    pub fn is_valid(&self) -> bool {
        self.freelancer.as_ref().is_some_and(|w| !w.id.is_empty())
            && self.project.as_ref().is_some_and(|p| !p.id.is_empty())
    }
}

/// The rebuilt view over one fetch cycle. Replaced wholesale on every
/// successful load; consumers never see a partially rebuilt set.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    pub freelancers: Vec<Worker>,
    pub projects: Vec<Project>,
    pub assignments: Vec<RawMatch>,
    pub generation: u64,
}

impl MatchSet {
    pub fn valid_count(&self) -> usize {
        self.assignments.iter().filter(|m| m.is_valid()).count()
    }

    pub fn valid_matches(&self) -> impl Iterator<Item = &RawMatch> {
        self.assignments.iter().filter(|m| m.is_valid())
    }
}

/// Rebuilds the store from a raw match list.
///
/// Entities are deduplicated by id across ALL raw matches, valid or not: an
/// entity must show up on the board even when its partner is missing. The
/// last record seen for an id wins, but keeps the first-seen position so
/// display order is stable. `assignments` keeps the raw list as received,
/// since a pair may legitimately recur.
pub fn rebuild(raw: Vec<RawMatch>, generation: u64) -> MatchSet {
    let mut freelancers: Vec<Worker> = Vec::new();
    let mut projects: Vec<Project> = Vec::new();
    let mut worker_slots: HashMap<String, usize> = HashMap::new();
    let mut project_slots: HashMap<String, usize> = HashMap::new();

    for record in &raw {
        if let Some(worker) = &record.freelancer {
            match worker_slots.get(&worker.id) {
                Some(&slot) => freelancers[slot] = worker.clone(),
                None => {
                    worker_slots.insert(worker.id.clone(), freelancers.len());
                    freelancers.push(worker.clone());
                }
            }
        }
        if let Some(project) = &record.project {
            match project_slots.get(&project.id) {
                Some(&slot) => projects[slot] = project.clone(),
                None => {
                    project_slots.insert(project.id.clone(), projects.len());
                    projects.push(project.clone());
                }
            }
        }
    }

    MatchSet {
        freelancers,
        projects,
        assignments: raw,
        generation,
    }
}
