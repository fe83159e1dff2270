use std::io;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;

use crate::cli::{self, Commands, SketchAction};
use crate::core::command::ToolCommand;
use crate::core::config::Config;
use crate::core::editor::installed_editors;
use crate::core::error::BoardflowError;
use crate::core::event::ToolEvent;
use crate::core::formatter::{
    format_board_line, format_editor_line, format_progress_line, format_search_results,
    format_usage_line,
};
use crate::core::job::JobStatus;
use crate::core::progress::UploadProgress;
use crate::core::summary::{MemoryRegion, MemoryUsage};
use crate::core::{catalog, create_sketch, runner};

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, BoardflowError> {
        enable_raw_mode().map_err(|e| BoardflowError::invalid(e))?;
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .map_err(|e| BoardflowError::invalid(e))?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

#[derive(Debug)]
struct AppState {
    config: Config,
    input: String,
    history: Vec<String>,
    progress: Option<UploadProgress>,
    program_usage: Option<MemoryUsage>,
    dynamic_usage: Option<MemoryUsage>,
    job_label: Option<&'static str>,
    job_status: Option<JobStatus>,
    last_error: Option<String>,
    should_quit: bool,
    job_running: bool,
    scroll_offset: usize,
    view_lines: usize,
    tick: u64,
}

const DIVIDER_MARKER: &str = "<divider>";

impl AppState {
    fn new(config: Config) -> Self {
        let history = vec![
            "Welcome to boardflow. Type 'help' for commands.".to_string(),
            format!("Catalog: {}", config.catalog_path().display()),
        ];
        Self {
            config,
            input: String::new(),
            history,
            progress: None,
            program_usage: None,
            dynamic_usage: None,
            job_label: None,
            job_status: None,
            last_error: None,
            should_quit: false,
            job_running: false,
            scroll_offset: 0,
            view_lines: 1,
            tick: 0,
        }
    }

    fn push_history(&mut self, line: impl Into<String>) {
        const MAX_LINES: usize = 500;
        if self.history.len() >= MAX_LINES {
            let drain_count = self.history.len().saturating_sub(MAX_LINES - 1);
            self.history.drain(0..drain_count);
        }
        self.history.push(line.into());
        self.clamp_scroll();
    }

    fn push_lines(&mut self, text: &str) {
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            self.push_history(line.to_string());
        }
    }

    fn push_error(&mut self, err: impl std::fmt::Display) {
        let message = err.to_string();
        self.push_history(format!("error: {message}"));
        self.last_error = Some(message);
    }

    fn update_job(&mut self, status: JobStatus) {
        self.job_running = false;
        self.job_status = Some(status);
        self.push_history(format!("Job finished: {status:?}"));
    }

    fn apply_event(&mut self, event: ToolEvent) {
        match event {
            ToolEvent::Line(_, line) => self.push_history(line),
            ToolEvent::Progress(progress) => {
                if progress.percent == 100 {
                    self.push_history(format_progress_line(&progress));
                }
                self.progress = Some(progress);
            }
            ToolEvent::Usage(usage) => {
                self.push_history(format_usage_line(&usage));
                match usage.region {
                    MemoryRegion::Program => self.program_usage = Some(usage),
                    MemoryRegion::Dynamic => self.dynamic_usage = Some(usage),
                }
            }
            ToolEvent::Error(message) => {
                self.last_error = Some(message);
            }
            ToolEvent::Exited(_) => {}
        }
    }

    fn set_view_lines(&mut self, lines: usize) {
        self.view_lines = lines.max(1);
        self.clamp_scroll();
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn scroll_top(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    fn scroll_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    fn max_scroll(&self) -> usize {
        self.history.len().saturating_sub(self.view_lines)
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = self.max_scroll();
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
    }
}

pub fn run(config: Config) -> Result<(), BoardflowError> {
    let _guard = TerminalGuard::enter()?;
    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| BoardflowError::invalid(e))?;

    let (event_tx, event_rx) = mpsc::channel::<ToolEvent>();
    let (job_tx, job_rx) = mpsc::channel::<JobStatus>();

    let mut app = AppState::new(config);

    loop {
        while let Ok(event) = event_rx.try_recv() {
            app.apply_event(event);
        }

        while let Ok(status) = job_rx.try_recv() {
            app.update_job(status);
        }

        let size = terminal.size().map_err(|e| BoardflowError::invalid(e))?;
        let history_height = size.height.saturating_sub(7).max(3) as usize;
        let view_lines = history_height.saturating_sub(2).max(1);
        app.set_view_lines(view_lines);

        app.tick = app.tick.wrapping_add(1);

        terminal
            .draw(|frame| {
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(5),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(frame.size());

                let header = render_header(&app, layout[0].width as usize);
                frame.render_widget(header, layout[0]);

                let history =
                    render_history(&app, layout[1].height as usize, layout[1].width as usize);
                frame.render_widget(history, layout[1]);

                let input = Paragraph::new(app.input.as_str())
                    .block(Block::default().title("Input").borders(Borders::ALL))
                    .wrap(Wrap { trim: false });
                frame.render_widget(input, layout[2]);
                frame.set_cursor(layout[2].x + 1 + app.input.len() as u16, layout[2].y + 1);
            })
            .map_err(|e| BoardflowError::invalid(e))?;

        if event::poll(Duration::from_millis(50)).map_err(|e| BoardflowError::invalid(e))? {
            if let Event::Key(key) = event::read().map_err(|e| BoardflowError::invalid(e))? {
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    KeyCode::Char(ch) => {
                        app.input.push(ch);
                    }
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Enter => {
                        let line = app.input.trim().to_string();
                        app.input.clear();
                        if !line.is_empty() {
                            handle_line(&mut app, line, event_tx.clone(), job_tx.clone());
                        }
                    }
                    KeyCode::PageUp => {
                        let step = app.view_lines.saturating_sub(1).max(1);
                        app.scroll_up(step);
                    }
                    KeyCode::PageDown => {
                        let step = app.view_lines.saturating_sub(1).max(1);
                        app.scroll_down(step);
                    }
                    KeyCode::Up => {
                        app.scroll_up(1);
                    }
                    KeyCode::Down => {
                        app.scroll_down(1);
                    }
                    KeyCode::Home => {
                        app.scroll_top();
                    }
                    KeyCode::End => {
                        app.scroll_bottom();
                    }
                    KeyCode::Esc => {
                        app.should_quit = true;
                    }
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_line(
    app: &mut AppState,
    line: String,
    event_tx: mpsc::Sender<ToolEvent>,
    job_tx: mpsc::Sender<JobStatus>,
) {
    let trimmed = line.trim();
    if !app.history.is_empty() {
        app.push_history(DIVIDER_MARKER);
    }
    app.push_history(format!(">> {trimmed}"));

    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        app.should_quit = true;
        return;
    }

    if trimmed.eq_ignore_ascii_case("clear") {
        app.history.clear();
        app.scroll_bottom();
        return;
    }

    if trimmed.eq_ignore_ascii_case("help") {
        for help in cli::HELP_LINES {
            app.push_history(help);
        }
        return;
    }

    let command = match cli::parse_line(trimmed) {
        Ok(command) => command,
        Err(err) => {
            app.push_error(err);
            return;
        }
    };

    match command {
        Commands::Refresh => match catalog::refresh(&app.config) {
            Ok(boards) => {
                let message = format!(
                    "Saved {} boards to {}",
                    boards.len(),
                    app.config.catalog_path().display()
                );
                app.push_history(message);
            }
            Err(err) => app.push_error(err),
        },
        Commands::Search { query } => {
            match catalog::search(app.config.catalog_path(), query.as_deref().unwrap_or("")) {
                Ok(matches) => {
                    for line in format_search_results(&matches) {
                        app.push_history(line);
                    }
                }
                Err(err) => app.push_error(err),
            }
        }
        Commands::Boards => match catalog::load(app.config.catalog_path()) {
            Ok(boards) => {
                for board in &boards {
                    app.push_history(format_board_line(board));
                }
            }
            Err(err) => app.push_error(err),
        },
        Commands::Sketch {
            action: SketchAction::New { name },
        } => match create_sketch(&app.config, &name) {
            Ok(out) => {
                app.push_lines(&out);
                app.push_history(format!("Sketch created with filename {name}"));
            }
            Err(err) => app.push_error(err),
        },
        Commands::Compile(args) => {
            start_job(app, cli::compile_args_to_command(args), event_tx, job_tx);
        }
        Commands::Upload(args) => {
            start_job(app, cli::upload_args_to_command(args), event_tx, job_tx);
        }
        Commands::Editors => {
            let editors = installed_editors();
            if editors.is_empty() {
                app.push_error(BoardflowError::NoEditors);
            }
            for (idx, editor) in editors.iter().enumerate() {
                app.push_history(format_editor_line(idx, editor));
            }
        }
        Commands::Edit(_) => {
            app.push_history(
                "edit needs the terminal; run `boardflow edit <file>` outside the shell.",
            );
        }
        Commands::Shell | Commands::Repl => {
            app.push_history("Already in the shell.");
        }
    }
}

fn start_job(
    app: &mut AppState,
    command: ToolCommand,
    event_tx: mpsc::Sender<ToolEvent>,
    job_tx: mpsc::Sender<JobStatus>,
) {
    if app.job_running {
        app.push_history("A job is already running. Please wait for it to finish.");
        return;
    }

    let rx = match runner::run_with_events(&app.config, &command) {
        Ok(rx) => rx,
        Err(err) => {
            app.job_status = Some(JobStatus::Failed);
            app.push_error(err);
            return;
        }
    };

    app.job_running = true;
    app.job_label = Some(command.label());
    app.job_status = Some(JobStatus::Running);
    app.progress = None;
    app.last_error = None;
    if matches!(command, ToolCommand::Compile { .. }) {
        app.program_usage = None;
        app.dynamic_usage = None;
    }

    std::thread::spawn(move || {
        let mut status = JobStatus::Failed;
        for event in rx {
            if let ToolEvent::Exited(code) = event {
                if code == Some(0) {
                    status = JobStatus::Finished;
                }
            }
            let _ = event_tx.send(event);
        }
        let _ = job_tx.send(status);
    });
}

fn render_header(app: &AppState, width: usize) -> Paragraph<'static> {
    let status = match app.job_status {
        Some(JobStatus::Pending) => "Pending",
        Some(JobStatus::Running) => "Running",
        Some(JobStatus::Finished) => "Finished",
        Some(JobStatus::Failed) => "Failed",
        None => "Idle",
    };
    let job = app.job_label.unwrap_or("-");

    let progress = match &app.progress {
        Some(update) => format!("{} {}%", update.phase, update.percent),
        None => String::new(),
    };

    let usage = [&app.program_usage, &app.dynamic_usage]
        .into_iter()
        .flatten()
        .map(format_usage_line)
        .collect::<Vec<_>>()
        .join("  ");

    let bar_width = width.saturating_sub(30).clamp(10, 40);
    let progress_bar = render_progress_bar(app, bar_width);

    let mut text = vec![
        Line::from(vec![
            Span::raw("Status: "),
            Span::raw(status),
            Span::raw("  Job: "),
            Span::raw(job),
        ]),
        Line::from(vec![
            Span::raw(progress_bar),
            Span::raw(" "),
            Span::raw(progress),
        ]),
        Line::from(usage),
    ];
    if let Some(err) = &app.last_error {
        text.push(Line::from(format!("Last error: {err}")));
    }

    Paragraph::new(text)
        .block(Block::default().title("boardflow").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_progress_bar(app: &AppState, width: usize) -> String {
    let width = width.max(10);
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');

    if !app.job_running {
        for _ in 0..width {
            bar.push(' ');
        }
        bar.push(']');
        return bar;
    }

    if let Some(update) = &app.progress {
        let ratio = (update.percent as f64 / 100.0).clamp(0.0, 1.0);
        let filled = ((ratio * width as f64).round() as usize).min(width);
        for idx in 0..width {
            if idx < filled {
                bar.push('=');
            } else if idx == filled && filled < width {
                bar.push('>');
            } else {
                bar.push(' ');
            }
        }
        bar.push(']');
        return bar;
    }

    let pos = (app.tick as usize) % width;
    for idx in 0..width {
        if idx == pos {
            bar.push('>');
        } else if idx < pos {
            bar.push('=');
        } else {
            bar.push(' ');
        }
    }
    bar.push(']');
    bar
}

fn render_history(app: &AppState, height: usize, width: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(2).max(1);
    let end = app.history.len().saturating_sub(app.scroll_offset);
    let start = end.saturating_sub(max_lines);
    let divider_width = width.saturating_sub(2).max(1);
    let divider = "─".repeat(divider_width);
    let lines: Vec<Line> = app.history[start..end]
        .iter()
        .map(|line| {
            if line == DIVIDER_MARKER {
                Line::from(Span::raw(divider.clone()))
            } else {
                Line::from(line.clone())
            }
        })
        .collect();

    Paragraph::new(lines)
        .block(Block::default().title("Session").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::BoardRecord;

    fn app_with_catalog(dir: &std::path::Path) -> AppState {
        let path = dir.join("boards.json");
        catalog::save(
            &path,
            &[
                BoardRecord::new("Arduino Uno", "arduino:avr:uno"),
                BoardRecord::new("Arduino Mega or Mega 2560", "arduino:avr:mega"),
            ],
        )
        .unwrap();
        AppState::new(Config::new(dir.join("no-such-tool"), path))
    }

    fn run_line(app: &mut AppState, line: &str) {
        let (event_tx, _event_rx) = mpsc::channel();
        let (job_tx, _job_rx) = mpsc::channel();
        handle_line(app, line.to_string(), event_tx, job_tx);
    }

    #[test]
    fn search_pushes_matches_into_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_catalog(dir.path());
        run_line(&mut app, "search mega");
        assert_eq!(
            app.history.last().map(String::as_str),
            Some("- Arduino Mega or Mega 2560 (arduino:avr:mega)")
        );

        run_line(&mut app, "search teensy");
        assert_eq!(app.history.last().map(String::as_str), Some("No matching boards found."));
    }

    #[test]
    fn search_with_catalog_flag_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_catalog(dir.path());
        run_line(&mut app, "search mega --catalog other.json");
        assert!(app.last_error.is_some());
        assert!(app.history.last().unwrap().starts_with("error: "));
        assert!(!app.history.iter().any(|line| line.contains("arduino:avr:mega")));
    }

    #[test]
    fn missing_tool_marks_job_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_catalog(dir.path());
        run_line(&mut app, "compile --fqbn arduino:avr:uno Blink");
        assert_eq!(app.job_status, Some(JobStatus::Failed));
        assert!(!app.job_running);
        assert!(app.last_error.as_deref().unwrap_or("").contains("not found"));
    }

    #[test]
    fn usage_events_update_header_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_catalog(dir.path());
        app.apply_event(ToolEvent::Usage(MemoryUsage {
            region: MemoryRegion::Dynamic,
            used_bytes: 9,
            percent: Some(0),
            maximum_bytes: Some(2048),
        }));
        assert!(app.dynamic_usage.is_some());
        assert!(app.program_usage.is_none());
    }

    #[test]
    fn history_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_catalog(dir.path());
        for idx in 0..600 {
            app.push_history(format!("line {idx}"));
        }
        assert_eq!(app.history.len(), 500);
        assert_eq!(app.history.last().map(String::as_str), Some("line 599"));
    }
}
