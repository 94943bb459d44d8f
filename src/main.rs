use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use sheet_leaderboard::config::Config;
use sheet_leaderboard::provider::spawn_provider;
use sheet_leaderboard::rotation::CursorPhase;
use sheet_leaderboard::source::source_from_config;
use sheet_leaderboard::state::{apply_delta, AppState, BoardRow, Delta, ProviderCommand};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    fast_cadence: Duration,
    last_rotation: Instant,
}

impl App {
    fn new(config: &Config, cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(config.display_limit),
            should_quit: false,
            cmd_tx,
            fast_cadence: config.fast_cadence,
            last_rotation: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn request_refresh(&mut self) {
        if self.cmd_tx.send(ProviderCommand::RefreshNow).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        }
    }

    fn maybe_rotate(&mut self, now: Instant) {
        if now.duration_since(self.last_rotation) >= self.fast_cadence {
            self.state.on_rotation_tick(now);
            self.last_rotation = now;
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = Config::from_env();

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let provider = spawn_provider(config.clone(), source_from_config(&config), tx, cmd_rx);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("create terminal")?;

    let mut app = App::new(&config, cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let _ = app.cmd_tx.send(ProviderCommand::Shutdown);
    drop(app);
    // The provider may be blocked in a request; don't hold the exit on it.
    if provider.is_finished() {
        let _ = provider.join();
    }

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        let now = Instant::now();
        if app.state.take_pending_render() {
            app.state.render_pass(now);
        }
        app.maybe_rotate(now);

        terminal.draw(|f| ui(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
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

fn ui(frame: &mut Frame, state: &AppState) {
    let error_height = if state.error.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(error_height),
            Constraint::Min(4),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if let Some(error) = &state.error {
        let banner = Paragraph::new(format!("Error loading data: {error}"))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("Source unavailable"));
        frame.render_widget(banner, chunks[1]);
    }

    render_board(frame, chunks[2], state);
    render_logs(frame, chunks[3], state);

    let footer = Paragraph::new("r Refresh | ? Help | q Quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let round = match state.current_round() {
        Some(round) => format!("Showing M{}/{}", round + 1, state.model.max_rounds),
        None => "No rounds yet".to_string(),
    };
    let updated = state
        .updated_at
        .as_deref()
        .map(|at| format!("Updated {at}"))
        .unwrap_or_else(|| "Loading...".to_string());
    format!(
        "LEADERBOARD | {round} | {updated} | Refreshes: {}",
        state.refreshes
    )
}

fn board_columns() -> [Constraint; 4] {
    [
        Constraint::Length(5),
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(14),
    ]
}

fn render_board(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title("Standings");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = state.board_rows();
    if rows.is_empty() {
        let text = if state.loaded {
            "No participants in the totals sheet"
        } else {
            "Waiting for data..."
        };
        let empty = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }
    if inner.height < 2 {
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    let widths = board_columns();
    render_board_header(frame, sections[0], &widths);

    let highlight = state.highlight_active(Instant::now()) && state.phase() == CursorPhase::Rotating;
    let list = sections[1];
    for (i, row) in rows.iter().take(list.height as usize).enumerate() {
        let row_area = Rect {
            x: list.x,
            y: list.y + i as u16,
            width: list.width,
            height: 1,
        };
        render_board_row(frame, row_area, &widths, row, highlight);
    }
}

fn render_board_header(frame: &mut Frame, area: Rect, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "#", style);
    render_cell_text(frame, cols[1], "Name", style);
    render_cell_text(frame, cols[2], "Total", style);
    render_cell_text(frame, cols[3], "Round", style);
}

fn render_board_row(frame: &mut Frame, area: Rect, widths: &[Constraint], row: &BoardRow, highlight: bool) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = match row.rank {
        1 => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        2 | 3 => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        _ => Style::default(),
    };
    let round_style = if highlight {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::Cyan)
    };

    render_cell_text(frame, cols[0], &row.rank.to_string(), style);
    render_cell_text(frame, cols[1], &row.name, style);
    render_cell_text(frame, cols[2], &row.total.to_string(), style);
    if let Some(slot) = &row.round {
        render_cell_text(frame, cols[3], &slot.to_string(), round_style);
    }
}

fn render_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| {
            let style = if entry.starts_with("[WARN]") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::styled(entry.clone(), style)
        })
        .collect();
    let logs = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log"));
    frame.render_widget(logs, area);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 40, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Leaderboard - Help",
        "",
        "  r            Refresh now",
        "  ?            Toggle help",
        "  q / Esc      Quit",
        "",
        "Rounds rotate on their own; totals refresh in the background.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
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
