use std::time::{Duration, Instant};

use crate::sink::{PresentationSink, Side};
use crate::store::MatchSet;

/// Pause on each highlighted pair so the viewer can register it.
pub const DWELL: Duration = Duration::from_millis(800);

/// One pair to walk: both ids are known-present because steps are built from
/// valid matches only.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub freelancer_id: String,
    pub project_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Highlighting,
    Settling,
    Done,
}

/// Walks the valid match list one pair at a time, driven from the ui tick.
/// Never blocks: the dwell is a deadline checked against the clock the tick
/// hands in, and a reset between ticks cancels the pending continuation.
#[derive(Debug)]
pub struct AnimationController {
    phase: Phase,
    steps: Vec<Step>,
    cursor: usize,
    dwell: Duration,
    dwell_until: Option<Instant>,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationController {
    pub fn new() -> Self {
        Self::with_dwell(DWELL)
    }

    pub fn with_dwell(dwell: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            steps: Vec::new(),
            cursor: 0,
            dwell,
            dwell_until: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A sequence is underway (between its first step and Done/reset).
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Highlighting | Phase::Settling)
    }

    /// The pairs a run walks: valid matches with a positive score, in the
    /// order the backend sent them. Zero-score pairs stay on the tables but
    /// are not worth animating.
    pub fn animation_steps(set: &MatchSet) -> Vec<Step> {
        set.assignments
            .iter()
            .filter(|m| m.is_valid() && m.score > 0.0)
            .filter_map(|m| {
                let worker = m.freelancer.as_ref()?;
                let project = m.project.as_ref()?;
                Some(Step {
                    freelancer_id: worker.id.clone(),
                    project_id: project.id.clone(),
                    score: m.score,
                })
            })
            .collect()
    }

    /// Begins a fresh run. Any active run is cancelled first; an empty
    /// sequence completes immediately.
    pub fn start(&mut self, set: &MatchSet, now: Instant, sink: &mut dyn PresentationSink) {
        self.reset(sink);
        self.steps = Self::animation_steps(set);
        self.cursor = 0;
        if self.steps.is_empty() {
            self.phase = Phase::Done;
            return;
        }
        self.advance(now, sink);
    }

    /// Start/stop button semantics: starting while active cancels instead.
    pub fn toggle(&mut self, set: &MatchSet, now: Instant, sink: &mut dyn PresentationSink) {
        if self.is_active() {
            self.reset(sink);
        } else {
            self.start(set, now, sink);
        }
    }

    /// Back to Idle from anywhere: unhighlight, drop the pending dwell,
    /// clear the drawing surface.
    pub fn reset(&mut self, sink: &mut dyn PresentationSink) {
        if self.phase == Phase::Highlighting {
            self.settle_current(sink);
        }
        sink.clear_surface();
        self.phase = Phase::Idle;
        self.steps.clear();
        self.cursor = 0;
        self.dwell_until = None;
    }

    /// Advances the machine if the current dwell has elapsed. Cheap to call
    /// every ui tick.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn PresentationSink) {
        if self.phase != Phase::Highlighting {
            return;
        }
        let Some(deadline) = self.dwell_until else {
            return;
        };
        if now < deadline {
            return;
        }
        self.settle_current(sink);
        self.phase = Phase::Settling;
        self.cursor += 1;
        self.advance(now, sink);
    }

    /// Moves to the next presentable step. A pair whose visual targets are
    /// not on screen is skipped with no dwell so the sequence never stalls.
    fn advance(&mut self, now: Instant, sink: &mut dyn PresentationSink) {
        while let Some(step) = self.steps.get(self.cursor) {
            let from = sink.target_center(Side::Worker, &step.freelancer_id);
            let to = sink.target_center(Side::Project, &step.project_id);
            let (Some(from), Some(to)) = (from, to) else {
                self.cursor += 1;
                continue;
            };
            sink.set_highlight(Side::Worker, &step.freelancer_id, true);
            sink.set_highlight(Side::Project, &step.project_id, true);
            sink.draw_connection(from, to, step.score);
            self.dwell_until = Some(now + self.dwell);
            self.phase = Phase::Highlighting;
            return;
        }
        self.phase = Phase::Done;
        self.dwell_until = None;
    }

    fn settle_current(&mut self, sink: &mut dyn PresentationSink) {
        if let Some(step) = self.steps.get(self.cursor) {
            sink.set_highlight(Side::Worker, &step.freelancer_id, false);
            sink.set_highlight(Side::Project, &step.project_id, false);
        }
    }
}
