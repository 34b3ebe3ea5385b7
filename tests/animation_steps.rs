use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use matchboard::animation::{AnimationController, Phase};
use matchboard::sink::{ChartId, Point, PresentationSink, Side, TuiBoard};
use matchboard::store::{MatchSet, Project, RawMatch, Worker, rebuild};

/// Sink double: targets are wherever the test says they are, and every
/// highlight/draw lands in inspectable state.
#[derive(Default)]
struct StageRecorder {
    positions: HashMap<(Side, String), Point>,
    highlights: HashSet<(Side, String)>,
    drawn_scores: Vec<f64>,
    highlight_log: Vec<String>,
}

impl StageRecorder {
    fn place(&mut self, side: Side, id: &str, x: f64, y: f64) {
        self.positions.insert((side, id.to_string()), Point { x, y });
    }

    fn place_pair(&mut self, worker_id: &str, project_id: &str) {
        self.place(Side::Worker, worker_id, 0.0, 1.0);
        self.place(Side::Project, project_id, 10.0, 1.0);
    }
}

impl PresentationSink for StageRecorder {
    fn set_series(&mut self, _chart: ChartId, _labels: Vec<String>, _values: Vec<u64>) {}

    fn target_center(&self, side: Side, id: &str) -> Option<Point> {
        self.positions.get(&(side, id.to_string())).copied()
    }

    fn draw_connection(&mut self, _from: Point, _to: Point, score: f64) {
        self.drawn_scores.push(score);
    }

    fn set_highlight(&mut self, side: Side, id: &str, on: bool) {
        if on {
            self.highlights.insert((side, id.to_string()));
            self.highlight_log.push(format!("+{id}"));
        } else {
            self.highlights.remove(&(side, id.to_string()));
            self.highlight_log.push(format!("-{id}"));
        }
    }

    fn clear_surface(&mut self) {
        self.drawn_scores.clear();
    }
}

fn worker(id: &str) -> Worker {
    Worker {
        id: id.to_string(),
        name: id.to_uppercase(),
        skills: Vec::new(),
        experience: 0.0,
    }
}

fn project(id: &str) -> Project {
    Project {
        id: id.to_string(),
        name: id.to_uppercase(),
        required_skills: Vec::new(),
        min_experience: 0.0,
    }
}

fn pair(w: &str, p: &str, score: f64) -> RawMatch {
    RawMatch {
        freelancer: Some(worker(w)),
        project: Some(project(p)),
        score,
    }
}

fn sample_set() -> MatchSet {
    rebuild(
        vec![
            pair("f1", "p1", 85.0),
            RawMatch {
                freelancer: None,
                project: Some(project("p2")),
                score: 90.0,
            },
            pair("f2", "p2", 0.0),
            pair("f3", "p3", 42.0),
        ],
        1,
    )
}

#[test]
fn sequence_covers_valid_positive_score_matches_in_input_order() {
    let steps = AnimationController::animation_steps(&sample_set());
    // The partial match and the zero-score pair are excluded; order is the
    // order the backend sent.
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].freelancer_id, "f1");
    assert_eq!(steps[1].freelancer_id, "f3");
}

#[test]
fn walks_pairs_with_dwell_between_steps() {
    let mut recorder = StageRecorder::default();
    recorder.place_pair("f1", "p1");
    recorder.place_pair("f3", "p3");

    let mut controller = AnimationController::new();
    let t0 = Instant::now();
    controller.start(&sample_set(), t0, &mut recorder);

    assert_eq!(controller.phase(), Phase::Highlighting);
    assert!(recorder.highlights.contains(&(Side::Worker, "f1".to_string())));
    assert!(recorder.highlights.contains(&(Side::Project, "p1".to_string())));
    assert_eq!(recorder.drawn_scores, vec![85.0]);

    // Dwell not yet elapsed: nothing moves.
    controller.tick(t0 + Duration::from_millis(799), &mut recorder);
    assert!(recorder.highlights.contains(&(Side::Worker, "f1".to_string())));

    // Dwell elapsed: first pair settles, second lights up.
    controller.tick(t0 + Duration::from_millis(800), &mut recorder);
    assert!(!recorder.highlights.contains(&(Side::Worker, "f1".to_string())));
    assert!(recorder.highlights.contains(&(Side::Worker, "f3".to_string())));
    assert_eq!(recorder.drawn_scores, vec![85.0, 42.0]);

    controller.tick(t0 + Duration::from_millis(1600), &mut recorder);
    assert_eq!(controller.phase(), Phase::Done);
    assert!(recorder.highlights.is_empty());
    // Each pair fully settles before the next lights up.
    assert_eq!(
        recorder.highlight_log,
        vec!["+f1", "+p1", "-f1", "-p1", "+f3", "+p3", "-f3", "-p3"]
    );
}

#[test]
fn skips_steps_whose_targets_are_not_rendered() {
    let mut recorder = StageRecorder::default();
    // Only the second animatable pair is on screen.
    recorder.place_pair("f3", "p3");

    let mut controller = AnimationController::new();
    let t0 = Instant::now();
    controller.start(&sample_set(), t0, &mut recorder);

    // f1/p1 was skipped with no dwell; f3/p3 is live immediately.
    assert_eq!(controller.phase(), Phase::Highlighting);
    assert!(recorder.highlights.contains(&(Side::Worker, "f3".to_string())));
    assert_eq!(recorder.drawn_scores, vec![42.0]);
}

#[test]
fn finishes_immediately_when_nothing_is_animatable() {
    let mut recorder = StageRecorder::default();
    let mut controller = AnimationController::new();
    let set = rebuild(vec![pair("f1", "p1", 0.0)], 1);

    controller.start(&set, Instant::now(), &mut recorder);
    assert_eq!(controller.phase(), Phase::Done);
    assert!(recorder.highlights.is_empty());
    assert!(!controller.is_active());
}

#[test]
fn reset_clears_highlights_and_surface() {
    let mut recorder = StageRecorder::default();
    recorder.place_pair("f1", "p1");
    recorder.place_pair("f3", "p3");

    let mut controller = AnimationController::new();
    controller.start(&sample_set(), Instant::now(), &mut recorder);
    assert!(controller.is_active());

    controller.reset(&mut recorder);
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(recorder.highlights.is_empty());
    assert!(recorder.drawn_scores.is_empty());
}

#[test]
fn toggle_while_active_cancels_instead_of_restarting() {
    let mut recorder = StageRecorder::default();
    recorder.place_pair("f1", "p1");

    let mut controller = AnimationController::new();
    let set = sample_set();
    let t0 = Instant::now();

    controller.toggle(&set, t0, &mut recorder);
    assert!(controller.is_active());

    controller.toggle(&set, t0 + Duration::from_millis(100), &mut recorder);
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(recorder.highlights.is_empty());
    assert!(recorder.drawn_scores.is_empty());

    // And toggling again starts a fresh run.
    controller.toggle(&set, t0 + Duration::from_millis(200), &mut recorder);
    assert!(controller.is_active());
}

#[test]
fn terminal_board_round_trips_controller_state() {
    let mut board = TuiBoard::new();
    board.begin_layout();
    board.set_position(Side::Worker, "f1", Point { x: 0.0, y: 1.5 });
    board.set_position(Side::Project, "p1", Point { x: 20.0, y: 3.5 });

    let mut controller = AnimationController::new();
    let set = rebuild(vec![pair("f1", "p1", 66.0)], 1);
    controller.start(&set, Instant::now(), &mut board);

    assert!(board.is_highlighted(Side::Worker, "f1"));
    assert_eq!(board.highlight_count(), 2);
    assert_eq!(board.connections.len(), 1);
    assert_eq!(board.connections[0].score, 66.0);

    controller.reset(&mut board);
    assert_eq!(board.highlight_count(), 0);
    assert!(board.connections.is_empty());
}
