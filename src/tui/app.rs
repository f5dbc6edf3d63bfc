//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::ModelClassifier;
use crate::application::IntakeService;
use crate::config::{AppConfig, Mode};
use crate::domain::Submission;

use super::styles::LOGO_SMALL;
use super::ui::{
    form::{render_form, FormState},
    render_disclaimer,
    result::render_result,
};

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Form,
    Result,
}

/// Main application state
pub struct App {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    /// Intake service (holds the classifier in diagnose mode)
    intake: IntakeService<ModelClassifier>,

    /// Header status line
    status: String,

    /// Form state
    form_state: FormState,

    /// Last submission, shown on the result screen
    submission: Option<Submission>,
}

impl App {
    /// Create the application from configuration.
    ///
    /// In diagnose mode the model is loaded here, before the terminal is
    /// touched, so a missing or invalid artifact stops the program with a
    /// plain error message.
    ///
    /// # Errors
    /// Returns error if the model cannot be loaded.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let intake = match config.mode {
            Mode::Collect => {
                tracing::info!("Running in collect mode; no model loaded");
                IntakeService::collect_only()
            }
            Mode::Diagnose => {
                let classifier =
                    ModelClassifier::load(&config.model_path, config.require_manifest)
                        .with_context(|| {
                            format!(
                                "Cannot start in diagnose mode. Set THYRODX_MODEL_PATH to a \
                                 directory containing model.json, or THYRODX_MODE=collect \
                                 (path: {:?})",
                                config.model_path
                            )
                        })?;
                IntakeService::with_classifier(Arc::new(classifier))?
            }
        };

        Ok(Self::with_service(intake))
    }

    /// Create application with an injected service.
    #[must_use]
    pub fn with_service(intake: IntakeService<ModelClassifier>) -> Self {
        let status = format!("{LOGO_SMALL} · {} mode", intake.mode());
        Self {
            screen: Screen::Form,
            should_quit: false,
            intake,
            status,
            form_state: FormState::default(),
            submission: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match (&self.screen, &self.submission) {
                    (Screen::Result, Some(submission)) => render_result(f, chunks[0], submission),
                    _ => render_form(f, chunks[0], &self.form_state, &self.status),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.form_state.next_field();
            }
            KeyCode::Left => {
                self.form_state.cycle(false);
            }
            KeyCode::Right => {
                self.form_state.cycle(true);
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.form_state.load_sample_data();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.form_state.clear_sensitive();
            }
            KeyCode::Char(c) => {
                self.form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.form_state.delete_char();
            }
            KeyCode::Delete => {
                self.form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_form();
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.submission = None;
                self.screen = Screen::Form;
            }
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let input = match self.form_state.to_clinical_input() {
            Ok(input) => input,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        match self.intake.submit(&input) {
            Ok(submission) => {
                self.submission = Some(submission);
                self.screen = Screen::Result;

                // Clear plaintext buffers from the UI immediately.
                self.form_state.clear_sensitive();
            }
            Err(e) => {
                tracing::warn!("Submission rejected");
                self.form_state.error_message = Some(e.to_string());
            }
        }
    }
}
