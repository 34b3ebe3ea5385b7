use std::collections::HashMap;

use crate::sink::{ChartId, PresentationSink};
use crate::store::MatchSet;

/// Per-skill worker counts. Skill strings are compared byte-for-byte, no
/// case folding or synonym merging, and keys keep first-seen order.
pub fn skill_histogram(set: &MatchSet) -> Vec<(String, u32)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u32> = HashMap::new();
    for worker in &set.freelancers {
        for skill in &worker.skills {
            let entry = counts.entry(skill.clone()).or_insert(0);
            if *entry == 0 {
                order.push(skill.clone());
            }
            *entry += 1;
        }
    }
    order
        .into_iter()
        .map(|skill| {
            let count = counts.get(&skill).copied().unwrap_or(0);
            (skill, count)
        })
        .collect()
}

/// Worker counts keyed by the exact raw experience value (no range
/// bucketing), ascending by value.
pub fn experience_histogram(set: &MatchSet) -> Vec<(f64, u32)> {
    let mut buckets: Vec<(f64, u32)> = Vec::new();
    for worker in &set.freelancers {
        match buckets.iter_mut().find(|(value, _)| *value == worker.experience) {
            Some((_, count)) => *count += 1,
            None => buckets.push((worker.experience, 1)),
        }
    }
    buckets.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    buckets
}

pub const QUALITY_LABELS: [&str; 4] = ["Excellent", "Good", "Fair", "Poor"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QualityBuckets {
    pub excellent: u32,
    pub good: u32,
    pub fair: u32,
    pub poor: u32,
}

impl QualityBuckets {
    pub fn total(&self) -> u32 {
        self.excellent + self.good + self.fair + self.poor
    }

    pub fn values(&self) -> [u64; 4] {
        [
            u64::from(self.excellent),
            u64::from(self.good),
            u64::from(self.fair),
            u64::from(self.poor),
        ]
    }
}

/// Classifies every assignment into exactly one bucket. An assignment with a
/// missing or unidentified side is Poor no matter what its score says. The
/// surplus of entities on the longer side is then charged to Poor as well,
/// even though those entities may not appear in any assignment at all.
/// Observed behavior of the summary chart, kept as-is.
pub fn quality_buckets(set: &MatchSet) -> QualityBuckets {
    let mut buckets = QualityBuckets::default();
    for assignment in &set.assignments {
        if !assignment.is_valid() {
            buckets.poor += 1;
        } else if assignment.score >= 80.0 {
            buckets.excellent += 1;
        } else if assignment.score >= 60.0 {
            buckets.good += 1;
        } else if assignment.score >= 40.0 {
            buckets.fair += 1;
        } else {
            buckets.poor += 1;
        }
    }
    buckets.poor += set.freelancers.len().abs_diff(set.projects.len()) as u32;
    buckets
}

/// Valid pairs that actually count as a successful match.
pub fn matched_pairs(set: &MatchSet) -> usize {
    set.valid_matches().filter(|m| m.score >= 60.0).count()
}

/// Matched pairs over the smaller entity column, as a percentage rounded to
/// one decimal. Zero whenever the divisor would be zero: with no projects
/// (or no workers) there is nothing to match against.
pub fn success_rate(set: &MatchSet) -> f64 {
    let divisor = set.projects.len().min(set.freelancers.len());
    if divisor == 0 {
        return 0.0;
    }
    let rate = matched_pairs(set) as f64 / divisor as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Pushes the three chart series into the sink after a store rebuild.
pub fn publish_series(set: &MatchSet, sink: &mut dyn PresentationSink) {
    let skills = skill_histogram(set);
    let (labels, values): (Vec<String>, Vec<u64>) = skills
        .into_iter()
        .map(|(skill, count)| (skill, u64::from(count)))
        .unzip();
    sink.set_series(ChartId::Skills, labels, values);

    let experience = experience_histogram(set);
    let (labels, values): (Vec<String>, Vec<u64>) = experience
        .into_iter()
        .map(|(years, count)| (format_years(years), u64::from(count)))
        .unzip();
    sink.set_series(ChartId::Experience, labels, values);

    let buckets = quality_buckets(set);
    sink.set_series(
        ChartId::Quality,
        QUALITY_LABELS.iter().map(|label| label.to_string()).collect(),
        buckets.values().to_vec(),
    );
}

pub fn format_years(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{} years", value as i64)
    } else {
        format!("{value} years")
    }
}
