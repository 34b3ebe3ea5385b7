use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Local};

use crate::match_fetch::FetchError;
use crate::store::{MatchSet, Project, RawMatch, Worker};

/// Messages the provider thread sends back to the ui thread. State is only
/// ever mutated through `apply_delta`.
#[derive(Debug)]
pub enum Delta {
    LoadStarted {
        generation: u64,
    },
    StoreLoaded {
        set: MatchSet,
        raw_total: usize,
    },
    LoadFailed {
        error: FetchError,
        attempts: u32,
        generation: u64,
    },
    SkillLookup {
        skill: String,
        result: SkillLookupResult,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Reload,
    LookupSkill { skill: String },
}

#[derive(Debug, Clone)]
pub enum SkillLookupResult {
    Found(Vec<Worker>),
    NotFound,
    Failed,
}

/// Sticky failure banner: which way the load died, and after how many
/// attempts, so the ui can offer the retry key with context.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub message: String,
    pub unreachable: bool,
    pub attempts: u32,
    pub generation: u64,
}

#[derive(Debug)]
pub struct AppState {
    pub store: MatchSet,
    pub raw_total: usize,
    pub fetched_at: Option<DateTime<Local>>,
    pub loading: bool,
    pub load_failure: Option<LoadFailure>,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub skill_input: String,
    pub skill_input_active: bool,
    pub skill_lookup: Option<(String, SkillLookupResult)>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            store: MatchSet::default(),
            raw_total: 0,
            fetched_at: None,
            loading: false,
            load_failure: None,
            selected: 0,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            skill_input: String::new(),
            skill_input_active: false,
            skill_lookup: None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Valid assignments sorted by score descending, for the matched table.
    pub fn matched_rows(&self) -> Vec<&RawMatch> {
        let mut rows: Vec<&RawMatch> = self.store.valid_matches().collect();
        rows.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }

    /// Workers that never appear on the valid side of any assignment.
    pub fn unmatched_workers(&self) -> Vec<&Worker> {
        let matched_ids: HashSet<&str> = self
            .store
            .valid_matches()
            .filter_map(|m| m.freelancer.as_ref())
            .map(|w| w.id.as_str())
            .collect();
        self.store
            .freelancers
            .iter()
            .filter(|w| !matched_ids.contains(w.id.as_str()))
            .collect()
    }

    pub fn selected_row(&self) -> Option<&RawMatch> {
        self.matched_rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.matched_rows().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.matched_rows().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.matched_rows().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }
}

/// A worker's skills against a project's requirements: which requirements
/// are covered, and which are still missing.
pub fn skill_overlap<'a>(worker: &'a Worker, project: &'a Project) -> (Vec<&'a str>, Vec<&'a str>) {
    let covered: Vec<&str> = project
        .required_skills
        .iter()
        .filter(|skill| worker.skills.contains(skill))
        .map(|skill| skill.as_str())
        .collect();
    let missing: Vec<&str> = project
        .required_skills
        .iter()
        .filter(|skill| !worker.skills.contains(skill))
        .map(|skill| skill.as_str())
        .collect();
    (covered, missing)
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::LoadStarted { generation } => {
            state.loading = true;
            state.push_log(format!("[INFO] Load started (generation {generation})"));
        }
        Delta::StoreLoaded { set, raw_total } => {
            // A slower, older load must never clobber a newer result.
            if set.generation < state.store.generation {
                state.push_log(format!(
                    "[INFO] Dropped stale load (generation {} < {})",
                    set.generation, state.store.generation
                ));
                return;
            }
            state.store = set;
            state.raw_total = raw_total;
            state.fetched_at = Some(Local::now());
            state.loading = false;
            state.load_failure = None;
            state.clamp_selection();
        }
        Delta::LoadFailed {
            error,
            attempts,
            generation,
        } => {
            state.loading = false;
            // Only surface failures newer than the data on screen.
            if generation <= state.store.generation {
                return;
            }
            state.load_failure = Some(LoadFailure {
                message: error.to_string(),
                unreachable: error.is_unreachable(),
                attempts,
                generation,
            });
        }
        Delta::SkillLookup { skill, result } => {
            state.skill_lookup = Some((skill, result));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
