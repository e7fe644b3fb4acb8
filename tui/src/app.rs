//! Application state for the terminal dashboard.
//!
//! [`App`] subscribes to every known store path and raises a dirty flag on
//! each change, so the event loop only redraws when the state moved. Key
//! presses map to [`AppAction`]s that the runner carries out.

use std::cell::Cell;
use std::rc::Rc;

use tracer_core::state::{ObservableStore, StateError, Subscription, KNOWN_PATHS};


/// Actions the runner performs in response to keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Quit the application.
    Quit,
    /// Re-read token and vesting data.
    Refresh,
    /// Dismiss every visible message.
    DismissMessages,
}


/// A key press, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Escape,
    Other,
}


pub struct App {
    store: ObservableStore,
    dirty: Rc<Cell<bool>>,
    subscriptions: Vec<Subscription>,
}


impl App {
    /// Watch every known path of `store`. The app starts dirty so the first
    /// frame is drawn.
    pub fn new(store: ObservableStore) -> Result<Self, StateError> {
        let dirty = Rc::new(Cell::new(true));
        let subscriptions = KNOWN_PATHS
            .iter()
            .map(|path| {
                let flag = Rc::clone(&dirty);
                store.subscribe(path, move |_, _| flag.set(true))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(App {
            store,
            dirty,
            subscriptions,
        })
    }

    pub fn store(&self) -> &ObservableStore {
        &self.store
    }

    /// Return whether a redraw is due and clear the flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    /// Force a redraw, e.g. after a terminal resize.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn handle_key(&self, key: Key) -> Option<AppAction> {
        match key {
            Key::Char('q') | Key::Escape | Key::Ctrl('c') => Some(AppAction::Quit),
            Key::Char('r') => Some(AppAction::Refresh),
            Key::Char('x') => Some(AppAction::DismissMessages),
            _ => None,
        }
    }
}


impl Drop for App {
    fn drop(&mut self) {
        for sub in &self.subscriptions {
            sub.unsubscribe();
        }
    }
}
