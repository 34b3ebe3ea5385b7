use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use matchboard::animation::AnimationController;
use matchboard::feed;
use matchboard::sink::{ChartId, Point, Side, TuiBoard, connection_color, score_color};
use matchboard::state::{
    AppState, Delta, ProviderCommand, SkillLookupResult, apply_delta, skill_overlap,
};
use matchboard::stats;

struct App {
    state: AppState,
    board: TuiBoard,
    animation: AnimationController,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    published_generation: u64,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            board: TuiBoard::new(),
            animation: AnimationController::new(),
            should_quit: false,
            cmd_tx,
            published_generation: 0,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.skill_input_active {
            self.on_skill_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.request_reload(),
            KeyCode::Char('v') | KeyCode::Char(' ') => {
                self.animation
                    .toggle(&self.state.store, Instant::now(), &mut self.board);
                if self.animation.is_active() {
                    self.state.push_log("[INFO] Visualization started");
                } else {
                    self.state.push_log("[INFO] Visualization stopped");
                }
            }
            KeyCode::Char('x') => {
                self.animation.reset(&mut self.board);
                self.state.push_log("[INFO] Visualization reset");
            }
            KeyCode::Char('f') => {
                self.state.skill_input_active = true;
                self.state.skill_input.clear();
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('b') | KeyCode::Esc => {
                self.state.help_overlay = false;
                self.state.skill_lookup = None;
            }
            _ => {}
        }
    }

    fn on_skill_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.skill_input_active = false;
                self.state.skill_input.clear();
            }
            KeyCode::Enter => {
                let skill = self.state.skill_input.trim().to_string();
                self.state.skill_input_active = false;
                if skill.is_empty() {
                    self.state.push_log("[INFO] Empty skill query ignored");
                    return;
                }
                if self
                    .cmd_tx
                    .send(ProviderCommand::LookupSkill {
                        skill: skill.clone(),
                    })
                    .is_err()
                {
                    self.state.push_log("[WARN] Skill lookup request failed");
                } else {
                    self.state
                        .push_log(format!("[INFO] Searching freelancers with \"{skill}\""));
                }
            }
            KeyCode::Backspace => {
                self.state.skill_input.pop();
            }
            KeyCode::Char(c) => self.state.skill_input.push(c),
            _ => {}
        }
    }

    fn request_reload(&mut self) {
        if self.cmd_tx.send(ProviderCommand::Reload).is_err() {
            self.state.push_log("[WARN] Reload request failed");
        } else {
            self.state.push_log("[INFO] Reload requested");
        }
    }

    fn on_resize(&mut self) {
        // Row positions shift with the viewport; a running animation is
        // restarted against the new layout.
        if self.animation.is_active() {
            self.animation
                .start(&self.state.store, Instant::now(), &mut self.board);
            self.state.push_log("[INFO] Visualization restarted after resize");
        }
    }

    fn maybe_publish_series(&mut self) {
        if self.state.store.generation != self.published_generation {
            stats::publish_series(&self.state.store, &mut self.board);
            self.published_generation = self.state.store.generation;
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(tx, cmd_rx);

    let mut app = App::new(cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_publish_series();
        app.animation.tick(Instant::now(), &mut app.board);

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        app.on_key(key);
                    }
                }
                Event::Resize(_, _) => app.on_resize(),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_tiles(frame, chunks[1], &app.state);
    render_charts(frame, chunks[2], &app.board);
    render_board(frame, chunks[3], &app.state, &mut app.board);
    render_tables(frame, chunks[4], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[5]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[6]);

    if app.state.load_failure.is_some() && !app.state.loading {
        render_error_overlay(frame, frame.size(), &app.state);
    }
    if app.state.skill_input_active || app.state.skill_lookup.is_some() {
        render_skill_overlay(frame, frame.size(), &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let updated = state
        .fetched_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let status = if state.loading { " | loading..." } else { "" };
    let line1 = format!(
        "  ><  MATCHBOARD | {} assignments ({} valid) | updated {updated}{status}",
        state.store.assignments.len(),
        state.store.valid_count(),
    );
    let line2 = " /__\\ worker / project match dashboard".to_string();
    format!("{line1}\n{line2}")
}

fn render_tiles(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let matched = stats::matched_pairs(&state.store);
    let rate = stats::success_rate(&state.store);
    let tiles = [
        ("Workers", state.store.freelancers.len().to_string()),
        ("Projects", state.store.projects.len().to_string()),
        ("Matched Pairs", matched.to_string()),
        ("Success Rate", format!("{rate:.1}%")),
    ];
    for (i, (title, value)) in tiles.iter().enumerate() {
        let tile = Paragraph::new(value.as_str())
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(Block::default().title(*title).borders(Borders::ALL));
        frame.render_widget(tile, cols[i]);
    }
}

fn render_charts(frame: &mut Frame, area: Rect, board: &TuiBoard) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);

    render_series_chart(frame, cols[0], board, ChartId::Skills, "Skills", None);
    render_series_chart(
        frame,
        cols[1],
        board,
        ChartId::Experience,
        "Experience",
        None,
    );
    render_series_chart(
        frame,
        cols[2],
        board,
        ChartId::Quality,
        "Match Quality",
        Some(&[Color::Green, Color::Blue, Color::Yellow, Color::Red]),
    );
}

fn render_series_chart(
    frame: &mut Frame,
    area: Rect,
    board: &TuiBoard,
    chart: ChartId,
    title: &str,
    palette: Option<&[Color]>,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let Some((labels, values)) = board.series(chart) else {
        let empty = Paragraph::new("No data yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    const BAR_WIDTH: u16 = 6;
    let capacity = (area.width.saturating_sub(2) / (BAR_WIDTH + 1)).max(1) as usize;
    let bars: Vec<Bar> = labels
        .iter()
        .zip(values.iter())
        .take(capacity)
        .enumerate()
        .map(|(i, (label, value))| {
            let color = palette
                .and_then(|colors| colors.get(i).copied())
                .unwrap_or(Color::Cyan);
            Bar::default()
                .value(*value)
                .label(Line::from(clip_label(label, BAR_WIDTH as usize)))
                .style(Style::default().fg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(BAR_WIDTH)
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn clip_label(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        label.chars().take(width.saturating_sub(1)).collect::<String>() + "…"
    }
}

fn render_board(frame: &mut Frame, area: Rect, state: &AppState, board: &mut TuiBoard) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(26),
            Constraint::Min(20),
            Constraint::Length(26),
        ])
        .split(area);

    let canvas_block = Block::default().title("Connections").borders(Borders::ALL);
    let inner = canvas_block.inner(cols[1]);
    let rows_visible = inner.height as usize;

    board.begin_layout();
    for (i, worker) in state.store.freelancers.iter().take(rows_visible).enumerate() {
        let y = inner.height as f64 - i as f64 - 0.5;
        board.set_position(Side::Worker, &worker.id, Point { x: 0.0, y });
    }
    for (i, project) in state.store.projects.iter().take(rows_visible).enumerate() {
        let y = inner.height as f64 - i as f64 - 0.5;
        board.set_position(
            Side::Project,
            &project.id,
            Point {
                x: inner.width as f64,
                y,
            },
        );
    }

    render_entity_list(frame, cols[0], state, board, Side::Worker);

    let connections = &board.connections;
    let canvas = Canvas::default()
        .block(canvas_block)
        .x_bounds([0.0, inner.width as f64])
        .y_bounds([0.0, inner.height as f64])
        .paint(|ctx| {
            for conn in connections {
                ctx.draw(&CanvasLine {
                    x1: conn.from.x,
                    y1: conn.from.y,
                    x2: conn.to.x,
                    y2: conn.to.y,
                    color: connection_color(conn.score),
                });
            }
        });
    frame.render_widget(canvas, cols[1]);

    render_entity_list(frame, cols[2], state, board, Side::Project);
}

fn render_entity_list(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    board: &TuiBoard,
    side: Side,
) {
    let title = match side {
        Side::Worker => "Freelancers",
        Side::Project => "Projects",
    };
    let rows_visible = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();

    match side {
        Side::Worker => {
            for worker in state.store.freelancers.iter().take(rows_visible) {
                let text = format!(
                    "{} [{}]",
                    display_name(&worker.name),
                    stats::format_years(worker.experience)
                );
                lines.push(Line::styled(text, entity_style(board, side, &worker.id)));
            }
        }
        Side::Project => {
            for project in state.store.projects.iter().take(rows_visible) {
                let text = format!(
                    "{} [min {}]",
                    display_name(&project.name),
                    stats::format_years(project.min_experience)
                );
                lines.push(Line::styled(text, entity_style(board, side, &project.id)));
            }
        }
    }

    if lines.is_empty() {
        lines.push(Line::styled(
            "No entries yet",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let list = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(list, area);
}

fn entity_style(board: &TuiBoard, side: Side, id: &str) -> Style {
    if board.is_highlighted(side, id) {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "Unnamed" } else { name }
}

fn render_tables(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(27),
            Constraint::Percentage(28),
        ])
        .split(area);

    render_matched_table(frame, cols[0], state);
    render_unmatched_table(frame, cols[1], state);
    render_detail_panel(frame, cols[2], state);
}

fn render_matched_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Matches (by score)").borders(Borders::ALL);
    let inner_height = area.height.saturating_sub(2) as usize;
    let rows = state.matched_rows();

    if rows.is_empty() {
        let empty = Paragraph::new("No valid matches")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let (start, end) = visible_range(state.selected, rows.len(), inner_height.max(1));
    let mut lines: Vec<Line> = Vec::new();
    for idx in start..end {
        let row = rows[idx];
        let (Some(worker), Some(project)) = (&row.freelancer, &row.project) else {
            continue;
        };
        let prefix = if idx == state.selected { "> " } else { "  " };
        let base = if idx == state.selected {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(
                    "{prefix}{} <-> {} ",
                    display_name(&worker.name),
                    display_name(&project.name)
                ),
                base,
            ),
            Span::styled(
                format!("{:.0}%", row.score),
                base.fg(score_color(row.score)).add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    let table = Paragraph::new(lines).block(block);
    frame.render_widget(table, area);
}

fn render_unmatched_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Unmatched Workers").borders(Borders::ALL);
    let inner_height = area.height.saturating_sub(2) as usize;
    let unmatched = state.unmatched_workers();

    if unmatched.is_empty() {
        let empty = Paragraph::new("Everyone is matched")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let lines: Vec<Line> = unmatched
        .iter()
        .take(inner_height)
        .map(|worker| {
            Line::from(format!(
                "{} [{}] {}",
                display_name(&worker.name),
                stats::format_years(worker.experience),
                worker.skills.join(", ")
            ))
        })
        .collect();

    let table = Paragraph::new(lines).block(block);
    frame.render_widget(table, area);
}

fn render_detail_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Match Detail").borders(Borders::ALL);

    let Some(row) = state.selected_row() else {
        let empty = Paragraph::new("No match selected")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };
    let (Some(worker), Some(project)) = (&row.freelancer, &row.project) else {
        return;
    };

    let (covered, missing) = skill_overlap(worker, project);
    let lines = vec![
        Line::from(format!(
            "{} <-> {}",
            display_name(&worker.name),
            display_name(&project.name)
        )),
        Line::styled(
            format!("Score: {:.0}%", row.score),
            Style::default().fg(score_color(row.score)),
        ),
        Line::from(format!(
            "Required {} | Actual {}",
            stats::format_years(project.min_experience),
            stats::format_years(worker.experience)
        )),
        Line::styled(
            format!("Covered: {}", join_or_dash(&covered)),
            Style::default().fg(Color::Green),
        ),
        Line::styled(
            format!("Missing: {}", join_or_dash(&missing)),
            Style::default().fg(Color::Red),
        ),
    ];

    let detail = Paragraph::new(lines).block(block);
    frame.render_widget(detail, area);
}

fn join_or_dash(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn footer_text(state: &AppState) -> String {
    if state.skill_input_active {
        return "Type a skill | Enter Search | Esc Cancel".to_string();
    }
    "r Reload | v/Space Visualize | x Reset | f Skill search | j/k Select | ? Help | q Quit"
        .to_string()
}

fn render_error_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(failure) = &state.load_failure else {
        return;
    };
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let status = if failure.unreachable {
        "Unreachable"
    } else {
        "Error"
    };
    let text = [
        "Error Loading Data".to_string(),
        String::new(),
        failure.message.clone(),
        format!("Server Status: {status}"),
        format!("Attempted {} times", failure.attempts),
        String::new(),
        "Press r to try again".to_string(),
    ]
    .join("\n");

    let popup = Paragraph::new(text)
        .style(Style::default().fg(Color::Red))
        .block(Block::default().title("Load Failed").borders(Borders::ALL));
    frame.render_widget(popup, popup_area);
}

fn render_skill_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let mut lines: Vec<Line> = Vec::new();
    if state.skill_input_active {
        lines.push(Line::from(format!("Skill: {}_", state.skill_input)));
    }

    match &state.skill_lookup {
        Some((skill, SkillLookupResult::Found(workers))) => {
            lines.push(Line::styled(
                format!("Found {} freelancer(s) with \"{skill}\"", workers.len()),
                Style::default().fg(Color::Green),
            ));
            lines.push(Line::from(""));
            let capacity = popup_area.height.saturating_sub(5) as usize;
            for worker in workers.iter().take(capacity) {
                lines.push(Line::from(format!(
                    "{} | {} | [{}] | {}",
                    worker.id,
                    display_name(&worker.name),
                    stats::format_years(worker.experience),
                    worker.skills.join(", ")
                )));
            }
        }
        Some((skill, SkillLookupResult::NotFound)) => {
            lines.push(Line::styled(
                format!("No freelancers found with \"{skill}\""),
                Style::default().fg(Color::Red),
            ));
        }
        Some((_, SkillLookupResult::Failed)) => {
            lines.push(Line::styled(
                "Error searching for skill",
                Style::default().fg(Color::Yellow),
            ));
        }
        None => {}
    }

    let popup = Paragraph::new(lines).block(
        Block::default()
            .title("Skill Search (Esc to close)")
            .borders(Borders::ALL),
    );
    frame.render_widget(popup, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Matchboard - Help",
        "",
        "  r            Reload matches",
        "  v / Space    Start/stop visualization",
        "  x            Reset visualization",
        "  f            Search freelancers by skill",
        "  j/k or ↑/↓   Move match selection",
        "  b / Esc      Close panels",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
