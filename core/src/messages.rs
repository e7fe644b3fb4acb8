//! Transient user messages kept at `ui.messages`.
//!
//! `MessageLog` is a view over the store: each change reads the current
//! list, edits a copy, and writes it back, so `ui.messages` subscribers see
//! every push, dismissal and expiry. The list is newest first and bounded.
//! Ids come from the counter at `ui.messageSeq`, so an id is never reused
//! even after every message has expired.

use serde::{Deserialize, Serialize};

use crate::state::{paths, ObservableStore, StateError};

/// Maximum number of messages kept.
pub const MAX_MESSAGES: usize = 50;


/// The severity / category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Success,
    Info,
    Error,
}

impl MessageKind {
    /// Return a short label suitable for display.
    pub fn label(&self) -> &str {
        match self {
            MessageKind::Success => "ok",
            MessageKind::Info => "info",
            MessageKind::Error => "error",
        }
    }
}


/// A single message entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub kind: MessageKind,
    pub text: String,
    /// Timestamp (ms since epoch) when the message was pushed.
    pub created_ms: u64,
}

impl Message {
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_ms) >= ttl_ms
    }

    /// Return a formatted one-line summary.
    pub fn summary(&self) -> String {
        format!("[{}] {}", self.kind.label(), self.text)
    }
}


/// Message list stored in an [`ObservableStore`].
#[derive(Debug, Clone)]
pub struct MessageLog {
    store: ObservableStore,
    ttl_ms: u64,
}

impl MessageLog {
    pub fn new(store: ObservableStore, ttl_ms: u64) -> Self {
        MessageLog { store, ttl_ms }
    }

    /// Add a message, pruning expired ones. Returns the assigned ID.
    pub fn push(&self, kind: MessageKind, text: &str, now_ms: u64) -> Result<u64, StateError> {
        let mut messages = self.all();
        let last = self.store.get_as::<u64>(paths::MESSAGE_SEQ).unwrap_or(0);
        let id = messages.iter().map(|m| m.id).fold(last, u64::max) + 1;
        self.store.set(paths::MESSAGE_SEQ, id.into())?;
        messages.retain(|m| !m.is_expired(now_ms, self.ttl_ms));
        messages.insert(
            0,
            Message {
                id,
                kind,
                text: text.to_string(),
                created_ms: now_ms,
            },
        );
        messages.truncate(MAX_MESSAGES);
        match kind {
            MessageKind::Error => tracing::warn!(id, "{}", text),
            _ => tracing::info!(id, "{}", text),
        }
        self.write(&messages)?;
        Ok(id)
    }

    /// Messages that have not expired at `now_ms`, newest first.
    pub fn active(&self, now_ms: u64) -> Vec<Message> {
        self.all()
            .into_iter()
            .filter(|m| !m.is_expired(now_ms, self.ttl_ms))
            .collect()
    }

    /// Drop expired messages from the store.
    pub fn prune(&self, now_ms: u64) -> Result<(), StateError> {
        let active = self.active(now_ms);
        self.write(&active)
    }

    /// Remove a message by ID. Returns true if found and removed.
    pub fn dismiss(&self, id: u64) -> Result<bool, StateError> {
        let mut messages = self.all();
        let before = messages.len();
        messages.retain(|m| m.id != id);
        if messages.len() == before {
            return Ok(false);
        }
        self.write(&messages)?;
        Ok(true)
    }

    /// All stored messages, expired or not, newest first.
    pub fn all(&self) -> Vec<Message> {
        self.store.get_as(paths::MESSAGES).unwrap_or_default()
    }

    fn write(&self, messages: &[Message]) -> Result<(), StateError> {
        let value = serde_json::to_value(messages).unwrap_or_default();
        self.store.set(paths::MESSAGES, value)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn log() -> MessageLog {
        MessageLog::new(ObservableStore::for_app(), 8000)
    }

    #[test]
    fn push_is_newest_first() {
        let log = log();
        log.push(MessageKind::Info, "first", 0).unwrap();
        log.push(MessageKind::Success, "second", 10).unwrap();
        let texts: Vec<String> = log.active(20).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn ids_increase() {
        let log = log();
        let a = log.push(MessageKind::Info, "a", 0).unwrap();
        let b = log.push(MessageKind::Info, "b", 0).unwrap();
        assert!(b > a);
    }

    #[test]
    fn ids_not_reused_after_everything_expired() {
        let log = log();
        let first = log.push(MessageKind::Info, "a", 0).unwrap();
        log.prune(60_000).unwrap();
        assert!(log.all().is_empty());
        let second = log.push(MessageKind::Info, "b", 60_000).unwrap();
        assert!(second > first);
        assert!(!log.dismiss(first).unwrap());
        assert_eq!(log.all().len(), 1);
    }

    #[test]
    fn messages_expire_after_ttl() {
        let log = log();
        log.push(MessageKind::Error, "boom", 1_000).unwrap();
        assert_eq!(log.active(8_999).len(), 1);
        assert!(log.active(9_000).is_empty());
        assert_eq!(log.all().len(), 1);
        log.prune(9_000).unwrap();
        assert!(log.all().is_empty());
    }

    #[test]
    fn push_prunes_expired() {
        let log = log();
        log.push(MessageKind::Info, "old", 0).unwrap();
        log.push(MessageKind::Info, "new", 20_000).unwrap();
        assert_eq!(log.all().len(), 1);
    }

    #[test]
    fn bounded_list() {
        let log = log();
        for i in 0..(MAX_MESSAGES as u64 + 5) {
            log.push(MessageKind::Info, "m", i).unwrap();
        }
        assert_eq!(log.all().len(), MAX_MESSAGES);
    }

    #[test]
    fn dismiss_by_id() {
        let log = log();
        let id = log.push(MessageKind::Info, "x", 0).unwrap();
        assert!(log.dismiss(id).unwrap());
        assert!(!log.dismiss(id).unwrap());
        assert!(log.all().is_empty());
    }

    #[test]
    fn push_notifies_subscribers() {
        let store = ObservableStore::for_app();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = store.subscribe("ui.messages", move |_, _| h.set(h.get() + 1)).unwrap();
        let log = MessageLog::new(store, 8000);
        log.push(MessageKind::Success, "done", 0).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn summary_format() {
        let m = Message {
            id: 1,
            kind: MessageKind::Error,
            text: "Transfer failed".into(),
            created_ms: 0,
        };
        assert_eq!(m.summary(), "[error] Transfer failed");
    }
}
