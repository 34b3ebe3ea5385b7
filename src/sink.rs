use std::collections::{HashMap, HashSet};

use ratatui::style::Color;

/// The three summary charts fed from the statistics pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    Skills,
    Experience,
    Quality,
}

/// Which entity column an element lives in. Elements are addressed as
/// (side, id) pairs so the engine never touches the rendering tree itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Worker,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Everything the engine is allowed to do to the screen. Calls are
/// synchronous and side-effect-only; `target_center` is the one query, and
/// it may come back empty for anything not currently rendered.
pub trait PresentationSink {
    fn set_series(&mut self, chart: ChartId, labels: Vec<String>, values: Vec<u64>);
    fn target_center(&self, side: Side, id: &str) -> Option<Point>;
    fn draw_connection(&mut self, from: Point, to: Point, score: f64);
    fn set_highlight(&mut self, side: Side, id: &str, on: bool);
    fn clear_surface(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub from: Point,
    pub to: Point,
    pub score: f64,
}

/// Terminal-backed sink. The ui pass records where each visible entity row
/// landed; the animation reads those positions back through `target_center`
/// and leaves highlights and drawn connections here for the next draw.
#[derive(Debug, Default)]
pub struct TuiBoard {
    series: HashMap<ChartId, (Vec<String>, Vec<u64>)>,
    highlights: HashSet<(Side, String)>,
    positions: HashMap<(Side, String), Point>,
    pub connections: Vec<Connection>,
}

impl TuiBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called at the top of each board render; rows that stay off-screen
    /// this frame simply have no position.
    pub fn begin_layout(&mut self) {
        self.positions.clear();
    }

    pub fn set_position(&mut self, side: Side, id: &str, point: Point) {
        self.positions.insert((side, id.to_string()), point);
    }

    pub fn is_highlighted(&self, side: Side, id: &str) -> bool {
        self.highlights.contains(&(side, id.to_string()))
    }

    pub fn highlight_count(&self) -> usize {
        self.highlights.len()
    }

    pub fn series(&self, chart: ChartId) -> Option<&(Vec<String>, Vec<u64>)> {
        self.series.get(&chart)
    }
}

impl PresentationSink for TuiBoard {
    fn set_series(&mut self, chart: ChartId, labels: Vec<String>, values: Vec<u64>) {
        self.series.insert(chart, (labels, values));
    }

    fn target_center(&self, side: Side, id: &str) -> Option<Point> {
        self.positions.get(&(side, id.to_string())).copied()
    }

    fn draw_connection(&mut self, from: Point, to: Point, score: f64) {
        self.connections.push(Connection { from, to, score });
    }

    fn set_highlight(&mut self, side: Side, id: &str, on: bool) {
        if on {
            self.highlights.insert((side, id.to_string()));
        } else {
            self.highlights.remove(&(side, id.to_string()));
        }
    }

    fn clear_surface(&mut self) {
        self.connections.clear();
    }
}

/// Score bands share the quality-bucket thresholds: green for excellent,
/// blue for good, yellow for fair, red for poor.
pub fn score_color(score: f64) -> Color {
    if score >= 80.0 {
        Color::Green
    } else if score >= 60.0 {
        Color::Blue
    } else if score >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Line opacity scales with the score.
pub fn score_alpha(score: f64) -> f64 {
    (score / 100.0).clamp(0.0, 1.0)
}

/// Terminal rendition of score-scaled opacity: strong scores get the bright
/// color variant, weak ones the plain variant.
pub fn connection_color(score: f64) -> Color {
    let bright = score_alpha(score) >= 0.5;
    match score_color(score) {
        Color::Green if bright => Color::LightGreen,
        Color::Blue if bright => Color::LightBlue,
        Color::Yellow if bright => Color::LightYellow,
        Color::Red if bright => Color::LightRed,
        color => color,
    }
}
