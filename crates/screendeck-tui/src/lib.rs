// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod table;

pub use table::{MAX_COLUMNS, TableProjection, render_table_text};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use screendeck_app::{AppState, AuthState, Controller, Credentials, ScreenService};
use std::io;
use std::time::Duration;
use tracing::debug;

const SIDEBAR_WIDTH: u16 = 32;
const EMPTY_SIDEBAR_TEXT: &str = "Loading screens...";
const NO_SELECTION_TITLE: &str = "Select a screen";
const BUSY_TEXT: &str = "Fetching live data...";
const EMPTY_RESULTS_TEXT: &str = "Select a screen from the sidebar to load data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct LoginForm {
    username: String,
    password: String,
    focus: LoginField,
}

impl LoginForm {
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    login: LoginForm,
    cursor: usize,
}

pub fn run_app<S: ScreenService>(controller: &mut Controller<S>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();

    let mut result = Ok(());
    loop {
        controller.process_completions();
        sync_view(controller.state(), &mut view_data);

        if let Err(error) =
            terminal.draw(|frame| render(frame, controller.state(), &view_data))
        {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(controller, &mut view_data, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn sync_view(state: &AppState, view_data: &mut ViewData) {
    if state.auth == AuthState::Authenticated && view_data.login != LoginForm::default() {
        // credentials are not kept once the session is open
        view_data.login = LoginForm::default();
    }
    if state.screens.is_empty() {
        view_data.cursor = 0;
    } else if view_data.cursor >= state.screens.len() {
        view_data.cursor = state.screens.len() - 1;
    }
}

fn handle_key_event<S: ScreenService>(
    controller: &mut Controller<S>,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if controller.state().notice.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            controller.dismiss_notice();
        }
        return false;
    }

    if controller.state().auth == AuthState::Authenticated {
        handle_main_key(controller, view_data, key)
    } else {
        handle_login_key(controller, view_data, key);
        false
    }
}

fn handle_login_key<S: ScreenService>(
    controller: &mut Controller<S>,
    view_data: &mut ViewData,
    key: KeyEvent,
) {
    let form = &mut view_data.login;
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_focus(),
        KeyCode::Backspace => {
            form.focused_mut().pop();
        }
        KeyCode::Enter => {
            if controller.state().loading {
                return;
            }
            if form.focus == LoginField::Username && form.password.is_empty() {
                form.focus = LoginField::Password;
                return;
            }
            let credentials = Credentials::new(form.username.clone(), form.password.clone());
            if !controller.login(credentials) {
                debug!("login submit ignored");
            }
        }
        KeyCode::Char(ch) => form.focused_mut().push(ch),
        _ => {}
    }
}

fn handle_main_key<S: ScreenService>(
    controller: &mut Controller<S>,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> bool {
    let screen_count = controller.state().screens.len();
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Down | KeyCode::Char('j') => {
            if view_data.cursor + 1 < screen_count {
                view_data.cursor += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
        }
        KeyCode::Home | KeyCode::Char('g') => view_data.cursor = 0,
        KeyCode::End | KeyCode::Char('G') => view_data.cursor = screen_count.saturating_sub(1),
        KeyCode::Enter => {
            if let Some(screen) = controller.state().screens.get(view_data.cursor).cloned() {
                controller.run_screen(&screen);
            }
        }
        KeyCode::Char('r') => controller.fetch_screens(),
        _ => {}
    }
    false
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    if state.auth == AuthState::Authenticated {
        render_main(frame, state, view_data);
    } else {
        let area = centered_rect(50, 50, frame.area());
        frame.render_widget(Clear, area);
        let login = Paragraph::new(render_login_text(state, &view_data.login)).block(
            Block::default()
                .title("Screen Login")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White)),
        );
        frame.render_widget(login, area);
    }

    if let Some(notice) = &state.notice {
        let area = centered_rect(60, 25, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(format!("{notice}\n\nenter to dismiss")).block(
            Block::default()
                .title("notice")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(overlay, area);
    }
}

fn render_main(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(frame.area());
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(columns[1]);

    let sidebar = Paragraph::new(render_sidebar_text(state, view_data.cursor)).block(
        Block::default()
            .title("screens")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::White)),
    );
    frame.render_widget(sidebar, columns[0]);

    let header = Paragraph::new(render_header_text(state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, main[0]);

    render_results(frame, main[1], state);

    let status = Paragraph::new("enter run  j/k move  r refresh list  q quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, main[2]);
}

fn render_results(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let projection = TableProjection::from_results(&state.results);
    if projection.is_empty() {
        let empty = Paragraph::new(EMPTY_RESULTS_TEXT)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let column_count = projection.column_count();
    let widths = vec![Constraint::Min(8); column_count.max(1)];
    let header = Row::new(projection.columns.iter().map(|column| {
        Cell::from(column.clone()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = projection
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|value| Cell::from(value.clone()))));

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(format!("{} rows", projection.rows.len()))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn render_login_text(state: &AppState, form: &LoginForm) -> String {
    let marker = |field: LoginField| if form.focus == field { '>' } else { ' ' };
    let button = if state.loading {
        "[ Connecting... ]"
    } else {
        "[ Connect ]"
    };
    format!(
        "Enter your screener credentials\n\n{} Username: {}\n{} Password: {}\n\n{}",
        marker(LoginField::Username),
        form.username,
        marker(LoginField::Password),
        "*".repeat(form.password.chars().count()),
        button,
    )
}

fn render_sidebar_text(state: &AppState, cursor: usize) -> String {
    if state.screens.is_empty() {
        return EMPTY_SIDEBAR_TEXT.to_owned();
    }
    state
        .screens
        .iter()
        .enumerate()
        .map(|(index, screen)| {
            let pointer = if index == cursor { '>' } else { ' ' };
            let active = if screen.name == state.active_screen {
                '▶'
            } else {
                ' '
            };
            format!("{pointer}{active} {}", screen.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_header_text(state: &AppState) -> String {
    let title = if state.has_active_screen() {
        state.active_screen.as_str()
    } else {
        NO_SELECTION_TITLE
    };
    if state.loading {
        format!("{title}    {BUSY_TEXT}")
    } else {
        title.to_owned()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
