//! TUI runner: ratatui event loop with terminal setup and cleanup.
//!
//! The [`Tui`] struct owns the ratatui terminal, the [`App`], the wallet
//! session and a chain reader. It draws when the store changed, polls for
//! keyboard events, and expires messages on every tick.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use ratatui::Terminal;

use tracer_core::infrastructure::ChainReader;
use tracer_core::refresh::refresh_data;
use tracer_core::state::StateError;
use tracer_core::view::Dashboard;
use tracer_core::wallet::WalletSession;

use crate::app::{App, AppAction, Key};
use crate::dashboard;


/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    app: App,
    session: WalletSession,
    reader: Box<dyn ChainReader>,
    tick_rate: Duration,
    last_tick: Instant,
}


impl Tui {
    /// Create a new TUI, entering raw mode and the alternate screen.
    pub fn new(session: WalletSession, reader: Box<dyn ChainReader>) -> Result<Self, io::Error> {
        let app = App::new(session.store().clone()).map_err(state_to_io)?;

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            app,
            session,
            reader,
            tick_rate: Duration::from_millis(250),
            last_tick: Instant::now(),
        })
    }

    /// Run the main event loop until quit is requested.
    pub fn run(&mut self) -> Result<(), io::Error> {
        self.refresh();

        loop {
            if self.app.take_dirty() {
                let dash = Dashboard::from_store(self.app.store(), &self.session.messages(), now_ms());
                self.terminal
                    .draw(|frame| dashboard::render_dashboard(frame, frame.area(), &dash))?;
            }

            let timeout = self
                .tick_rate
                .checked_sub(self.last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key_event) => {
                        let key = crossterm_to_key(key_event.code, key_event.modifiers);
                        if let Some(action) = self.app.handle_key(key) {
                            if self.handle_action(action) {
                                break;
                            }
                        }
                    }
                    Event::Resize(_, _) => self.app.mark_dirty(),
                    _ => {}
                }
            }

            if self.last_tick.elapsed() >= self.tick_rate {
                if let Err(e) = self.session.messages().prune(now_ms()) {
                    tracing::warn!(error = %e, "message prune failed");
                }
                self.last_tick = Instant::now();
            }
        }

        self.shutdown()
    }

    /// Handle an `AppAction`. Returns `true` if the application should quit.
    fn handle_action(&mut self, action: AppAction) -> bool {
        match action {
            AppAction::Quit => return true,
            AppAction::Refresh => self.refresh(),
            AppAction::DismissMessages => {
                let log = self.session.messages();
                for m in log.all() {
                    if let Err(e) = log.dismiss(m.id) {
                        tracing::warn!(error = %e, "dismiss failed");
                    }
                }
            }
        }
        false
    }

    /// Re-read contract data; the outcome is reported as a message.
    fn refresh(&mut self) {
        if let Err(e) = refresh_data(&self.session, self.reader.as_ref(), now_ms()) {
            tracing::warn!(error = %e, "refresh failed");
        }
    }

    fn shutdown(&mut self) -> Result<(), io::Error> {
        terminal::disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}


impl Drop for Tui {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}


fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn state_to_io(e: StateError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}


/// Convert a crossterm key into the backend-independent [`Key`].
pub fn crossterm_to_key(code: KeyCode, modifiers: KeyModifiers) -> Key {
    if modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(ch) = code {
            return Key::Ctrl(ch);
        }
    }
    match code {
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        _ => Key::Other,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_chars_map_to_ctrl() {
        assert_eq!(crossterm_to_key(KeyCode::Char('c'), KeyModifiers::CONTROL), Key::Ctrl('c'));
    }

    #[test]
    fn plain_keys() {
        assert_eq!(crossterm_to_key(KeyCode::Char('r'), KeyModifiers::NONE), Key::Char('r'));
        assert_eq!(crossterm_to_key(KeyCode::Esc, KeyModifiers::NONE), Key::Escape);
        assert_eq!(crossterm_to_key(KeyCode::Tab, KeyModifiers::NONE), Key::Other);
    }
}
