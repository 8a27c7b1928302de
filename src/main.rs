use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use sofa_terminal::feed;
use sofa_terminal::state::{
    apply_delta, phase_label, stats_source_label, strategy_label, AppState, Delta, FormField,
    ProviderCommand, RunPhase,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.state.focus = self.state.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.state.focus = self.state.focus.prev(),
            KeyCode::Backspace => {
                self.state.focused_input_mut().pop();
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) => self.state.focused_input_mut().push(c),
            _ => {}
        }
    }

    fn submit(&mut self) {
        if self.state.running() {
            self.state.push_log("[INFO] A run is already in progress");
            return;
        }
        // Empty team names are rejected here, not by the query builder.
        if self.state.home_input.trim().is_empty() || self.state.away_input.trim().is_empty() {
            self.state
                .push_log("[WARN] Enter both home and away team names");
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Provider unavailable");
            return;
        };
        let criteria = self.state.criteria();
        if tx.send(ProviderCommand::Analyze(criteria)).is_err() {
            self.state.push_log("[WARN] Analyze request failed");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
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

        terminal.draw(|f| ui(f, app))?;

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

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(5),
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_form(frame, chunks[1], &app.state);
    render_results(frame, chunks[2], &app.state);
    render_logs(frame, chunks[3], &app.state);

    let footer = Paragraph::new(
        "Tab/Shift-Tab Move | Enter Search & Analyze | Esc Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);
}

fn header_text(state: &AppState) -> String {
    format!(
        "SOFA SCOUT | Over/Under & Corners (HT/FT) | status: {}",
        phase_label(state.phase)
    )
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_input(frame, rows[0], "Home team", &state.home_input, state.focus == FormField::Home);
    render_input(frame, rows[1], "Away team", &state.away_input, state.focus == FormField::Away);
    render_input(
        frame,
        rows[2],
        "League (optional)",
        &state.league_input,
        state.focus == FormField::League,
    );

    let hint = Paragraph::new("Example: Flamengo / São Paulo / Brasileirão")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, rows[3]);
}

fn render_input(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let marker = if focused { ">" } else { " " };
    let style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let cursor = if focused { "_" } else { "" };
    let line = format!("{marker} {label:<18} {value}{cursor}");
    frame.render_widget(Paragraph::new(line).style(style), area);
}

fn render_results(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(5)])
        .split(columns[0]);

    render_resolution(frame, left[0], state);
    render_stats(frame, left[1], state);
    render_analysis(frame, columns[1], state);
}

fn render_resolution(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title("Match");
    let text = match &state.resolution {
        None => {
            if state.phase == RunPhase::Resolving {
                "Locating the match...".to_string()
            } else {
                "Fill in the teams and press Enter.".to_string()
            }
        }
        Some(res) if !res.reference.resolved => "Match not found.".to_string(),
        Some(res) => {
            let mut lines = Vec::new();
            if let Some(strategy) = res.strategy {
                lines.push(format!("Found via {}", strategy_label(strategy)));
            }
            lines.push(res.reference.identifier.clone());
            if res.candidates.len() > 1 {
                lines.push(String::new());
                lines.push("Candidates (first is used):".to_string());
                for candidate in res.candidates.iter().take(5) {
                    lines.push(format!("  {}", candidate.label));
                }
            }
            lines.join("\n")
        }
    };
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title("Statistics");
    let text = if let Some(stats) = &state.stats {
        let mut lines = vec![
            format!("Source: {}", stats_source_label(stats.source)),
            format!("HT score:         {}", stats.score_ht.display()),
            format!("FT score:         {}", stats.score_ft.display()),
            format!("Corners (H - A):  {}", stats.corners.display()),
            format!("Corners total FT: {}", stats.corners_ft_total.display()),
            format!("Corners total HT: {}", stats.corners_ht_total.display()),
            format!("Over/Under HT:    {}", stats.over_under_ht.display()),
            format!("Over/Under FT:    {}", stats.over_under_ft.display()),
        ];
        if stats.over_under_detail.is_available() {
            lines.push(format!("O/U detail: {}", stats.over_under_detail.display()));
        }
        lines.join("\n")
    } else if let Some(reason) = &state.stats_error {
        reason.clone()
    } else if state.phase == RunPhase::Extracting {
        "Collecting statistics...".to_string()
    } else {
        String::new()
    };
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_analysis(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title("Analysis");
    let (text, style) = match &state.analysis {
        Some(result) if result.is_error => {
            (result.text.clone(), Style::default().fg(Color::Red))
        }
        Some(result) => (result.text.clone(), Style::default()),
        None if state.phase == RunPhase::Analyzing => {
            ("Requesting analysis...".to_string(), Style::default().fg(Color::DarkGray))
        }
        None => (String::new(), Style::default()),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title("Log");
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<&str> = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(String::as_str)
        .collect();
    let paragraph = Paragraph::new(lines.join("\n")).block(block);
    frame.render_widget(paragraph, area);
}
