use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use time::Date;

use crate::calendar::{Direction, ViewMode};
use crate::config::AppConfig;
use crate::posts::PostIndex;
use crate::ui::{self, PostHit};

pub mod actions;
pub mod state;

pub use actions::{ActionDispatcher, Command};
pub use state::{CalendarState, EditForm, FormField, PopupState};

pub struct App {
    pub config: Arc<AppConfig>,
    pub posts: PostIndex,
    state: CalendarState,
    hits: Vec<PostHit>,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, posts: PostIndex, anchor: Date) -> Self {
        let mut state = CalendarState::new(anchor, config.default_view);
        state.set_status_message(Some(format!(
            "{} post(s) loaded • Enter open • Tab next post • w/m view • n/p page • t today",
            posts.len()
        )));
        let tick_rate = config.tick_rate();
        Self {
            config,
            posts,
            state,
            hits: Vec::new(),
            should_quit: false,
            tick_rate,
        }
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let palette = self.config.palette();
        let max_labels = self.config.max_label_lines;
        loop {
            terminal
                .draw(|frame| {
                    self.hits = ui::draw_app(frame, &self.state, &self.posts, palette, max_labels);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            if event::poll(self.tick_rate).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        let command = if self.state.is_popup_open() {
            self.popup_command(key)
        } else {
            self.calendar_command(key)
        };
        if let Some(command) = command {
            self.dispatch(command);
        }
    }

    fn popup_command(&mut self, key: KeyEvent) -> Option<Command> {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        match key.code {
            KeyCode::Esc => Some(Command::Close),
            KeyCode::Enter => Some(Command::Save),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Save)
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Delete)
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.state.toggle_field();
                None
            }
            KeyCode::Up | KeyCode::Down if self.state.popup().form.field == FormField::Date => {
                let days = if key.code == KeyCode::Up { 1 } else { -1 };
                if !self.state.step_form_date(days) {
                    self.state
                        .set_status_message(Some("Date field is not YYYY-MM-DD; type it instead"));
                }
                None
            }
            KeyCode::Backspace => {
                self.state.pop_char();
                None
            }
            KeyCode::Char(ch) if plain => {
                self.state.push_char(ch);
                None
            }
            _ => None,
        }
    }

    fn calendar_command(&mut self, key: KeyEvent) -> Option<Command> {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
        {
            return None;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('w') => Some(Command::SetView(ViewMode::Week)),
            KeyCode::Char('m') => Some(Command::SetView(ViewMode::Month)),
            KeyCode::Char('n') | KeyCode::PageDown => Some(Command::Navigate(Direction::Next)),
            KeyCode::Char('p') | KeyCode::Char('b') | KeyCode::PageUp => {
                Some(Command::Navigate(Direction::Back))
            }
            KeyCode::Char('t') => Some(Command::Today),
            KeyCode::Char('h') | KeyCode::Left => Some(Command::MoveCursor(-1)),
            KeyCode::Char('l') | KeyCode::Right => Some(Command::MoveCursor(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(Command::MoveCursor(-7)),
            KeyCode::Char('j') | KeyCode::Down => Some(Command::MoveCursor(7)),
            KeyCode::Tab => Some(Command::CyclePost),
            KeyCode::Enter => Some(Command::OpenSelected),
            _ => None,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) || self.state.is_popup_open() {
            return;
        }
        let Some(hit) = self
            .hits
            .iter()
            .find(|hit| hit.contains(mouse.column, mouse.row))
            .cloned()
        else {
            return;
        };
        self.dispatch(Command::OpenPost {
            post: hit.post,
            date_key: hit.date_key,
        });
    }

    fn dispatch(&mut self, command: Command) {
        tracing::trace!(?command, "dispatching");
        ActionDispatcher::new(&mut self.state, &mut self.posts).dispatch(command);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
