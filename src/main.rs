use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use scrim_board::api::HttpBackend;
use scrim_board::backend::{ScrimmageBackend, spawn_provider};
use scrim_board::config::{BackendKind, Settings};
use scrim_board::fake_backend::DemoBackend;
use scrim_board::leaderboard::{self, ClickTarget, SPINNER_GLYPH};
use scrim_board::record_store::{ScrimmageType, TeamId, scrimmage_type_label};
use scrim_board::state::{self, AppState, ProviderCommand, Screen, apply_delta};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    // Last rendered list area and first visible row, for mouse hit-testing.
    list_hit: Option<(Rect, usize)>,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
            list_hit: None,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('b') | KeyCode::Esc => self.state.back_to_rankings(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('n') | KeyCode::Right => self.state.next_page(),
            KeyCode::Char('p') | KeyCode::Left => self.state.prev_page(),
            KeyCode::Enter | KeyCode::Char('d') => {
                let idx = self.state.selected;
                self.state.activate_row(idx, ClickTarget::Row);
            }
            KeyCode::Char('r') | KeyCode::Char(' ') => {
                let idx = self.state.selected;
                self.state.activate_row(idx, ClickTarget::ActionButton);
            }
            KeyCode::Char('i') => match self.state.screen {
                Screen::Rankings => self.state.reload_page(),
                Screen::TeamDetail { .. } => self.state.refresh_detail(),
            },
            _ => {}
        }
        self.flush_commands();
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some((area, start)) = self.list_hit else {
            return;
        };
        if self.state.screen != Screen::Rankings
            || mouse.row < area.y
            || mouse.row >= area.y + area.height
            || mouse.column < area.x
        {
            return;
        }
        let idx = start + (mouse.row - area.y) as usize;
        let row_area = Rect {
            y: mouse.row,
            height: 1,
            ..area
        };
        let target = leaderboard::hit_test(row_area, mouse.column);
        self.state.activate_row(idx, target);
        self.flush_commands();
    }

    fn flush_commands(&mut self) {
        let commands = self.state.take_commands();
        if commands.is_empty() {
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Backend unavailable");
            return;
        };
        let mut failed = false;
        for cmd in commands {
            failed |= tx.send(cmd).is_err();
        }
        if failed {
            self.state.push_log("[WARN] Backend worker stopped; request not sent");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let settings = Settings::from_env();

    let backend: Arc<dyn ScrimmageBackend> = match settings.backend {
        BackendKind::Http => Arc::new(HttpBackend::new(
            &settings.api_url,
            &settings.episode,
            settings.api_token.clone(),
            settings.http_timeout,
        )),
        BackendKind::Demo => Arc::new(DemoBackend::new()),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal_backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(terminal_backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(backend, tx, cmd_rx);

    let mut state = AppState::new(&settings.episode, settings.revert_after);
    state.push_log(match settings.backend {
        BackendKind::Http => format!("[INFO] Backend: {}", settings.api_url),
        BackendKind::Demo => "[INFO] Backend: demo data".to_string(),
    });
    state.start();
    let mut app = App::new(state, Some(cmd_tx));
    app.flush_commands();
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
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.tick(Instant::now());
        app.flush_commands();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
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
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    app.list_hit = None;
    match app.state.screen {
        Screen::Rankings => {
            app.list_hit = render_rankings(frame, chunks[1], &app.state);
        }
        Screen::TeamDetail { team_id } => render_team_detail(frame, chunks[1], &app.state, team_id),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area, &app.state);
    }
}

fn header_text(state: &AppState) -> String {
    let episode = if state.episode_name.is_empty() {
        state.episode.clone()
    } else {
        format!("{} ({})", state.episode_name, state.episode)
    };
    match state.screen {
        Screen::Rankings => format!(
            " RANKINGS | {} | Page {}/{} | Requests accepted: {}",
            episode,
            state.page,
            state.page_count(),
            state.requests_accepted
        ),
        Screen::TeamDetail { team_id } => {
            format!(" TEAM | {} | {}", state.team_name(team_id), episode)
        }
    }
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Rankings => {
            "j/k Move | Enter Team | r Request | n/p Page | i Reload | ? Help | q Quit".to_string()
        }
        Screen::TeamDetail { .. } => "b/Esc Back | i Refresh record | ? Help | q Quit".to_string(),
    }
}

fn render_rankings(frame: &mut Frame, area: Rect, state: &AppState) -> Option<(Rect, usize)> {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    render_rankings_header(frame, sections[0]);

    let list_area = sections[1];
    if state.teams_loading {
        let loading = Paragraph::new(format!("{SPINNER_GLYPH} Loading teams..."))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, list_area);
        return None;
    }
    if state.teams.is_empty() {
        let empty = Paragraph::new("No Teams Found!").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return None;
    }
    if list_area.height == 0 {
        return None;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, state.teams.len(), visible);

    for (i, row) in state.rows().enumerate().skip(start).take(end - start) {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + (i - start) as u16,
            width: list_area.width,
            height: 1,
        };
        let selected = i == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = leaderboard::row_columns(row_area);

        let button = row.button();
        let button_style = match button {
            leaderboard::ButtonLabel::Check => row_style.fg(Color::Green),
            leaderboard::ButtonLabel::Spinner => row_style.fg(Color::Yellow),
            leaderboard::ButtonLabel::Request => row_style.add_modifier(Modifier::BOLD),
        };

        render_cell_text(frame, cols[0], &row.rank.to_string(), row_style);
        render_cell_text(frame, cols[1], &row.rating_display(), row_style);
        render_cell_text(frame, cols[2], &row.team.name, row_style);
        render_cell_text(frame, cols[3], &row.members_display(), row_style);
        render_cell_text(frame, cols[4], &row.team.quote, row_style);
        render_cell_text(frame, cols[5], &row.eligibility_display(&state.criteria), row_style);
        render_cell_text(frame, cols[6], row.auto_accept_display(), row_style);
        render_cell_text(frame, cols[7], &format!("[{}]", button.text()), button_style);
    }

    Some((list_area, start))
}

fn render_rankings_header(frame: &mut Frame, area: Rect) {
    let cols = leaderboard::row_columns(area);
    let style = Style::default().add_modifier(Modifier::BOLD);
    for (col, title) in cols.iter().zip(leaderboard::COLUMN_TITLES) {
        render_cell_text(frame, *col, title, style);
    }
}

fn render_team_detail(frame: &mut Frame, area: Rect, state: &AppState, team_id: TeamId) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1)])
        .split(area);

    let team = state.teams.iter().find(|t| t.id == team_id);
    let mut info = vec![format!("Team: {}", state.team_name(team_id))];
    if let Some(team) = team {
        info.push(format!("Rating: {}", team.rating.round() as i64));
        info.push(format!("Members: {}", team.members.join(", ")));
        if !team.quote.is_empty() {
            info.push(format!("Quote: {}", team.quote));
        }
    }
    let updated = match state.records().fetched_at(team_id) {
        Some(at) if state.records().is_stale(team_id) => {
            format!("Record from {} (refreshing)", at.format("%H:%M:%S"))
        }
        Some(at) => format!("Record from {}", at.format("%H:%M:%S")),
        None => String::new(),
    };
    if !updated.is_empty() {
        info.push(updated);
    }
    frame.render_widget(Paragraph::new(info.join("\n")), sections[0]);

    let buckets = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(sections[1]);
    for (kind, bucket_area) in ScrimmageType::ALL.into_iter().zip(buckets.iter()) {
        render_win_loss_tie(frame, *bucket_area, state, team_id, kind);
    }
}

fn render_win_loss_tie(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    team_id: TeamId,
    kind: ScrimmageType,
) {
    let block = Block::default()
        .title(scrimmage_type_label(kind))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let record = state.records().get(team_id).map(|r| *r.bucket(kind));
    let loading = record.is_none() && state.records().is_loading(team_id);
    let cell = |count: Option<u32>| -> String {
        if loading {
            SPINNER_GLYPH.to_string()
        } else {
            count.map(|c| c.to_string()).unwrap_or_else(|| "—".to_string())
        }
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(inner);
    let entries = [
        ("Wins", record.map(|r| r.wins), Color::Green),
        ("Losses", record.map(|r| r.losses), Color::Red),
        ("Ties", record.map(|r| r.ties), Color::Gray),
    ];
    for ((title, count, color), col) in entries.into_iter().zip(cols.iter()) {
        let text = format!("{title}\n{}", cell(count));
        let widget = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD));
        frame.render_widget(widget, *col);
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
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

fn render_help_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup_area);

    let mut lines: Vec<String> = [
        "Scrim Board - Help",
        "",
        "Rankings:",
        "  j/k or ↑/↓   Move",
        "  Enter / d    Open team record",
        "  r / Space    Request scrimmage",
        "  n/p or →/←   Next/previous page",
        "  i            Reload page",
        "  click        Row opens team, button column requests",
        "",
        "Team:",
        "  b / Esc      Back to rankings",
        "  i            Refresh record",
        "",
        "Recent log:",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    lines.extend(state.logs.iter().rev().take(8).map(|l| format!("  {l}")));

    let help = Paragraph::new(lines.join("\n"))
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

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
