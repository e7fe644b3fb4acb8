//! Observable application state.
//!
//! Provides dotted-path addressing (e.g. `wallet.account`), a
//! `serde_json::Value` tree with per-path change subscriptions, loading
//! flags, and the wallet client's state layout.

pub mod errors;
pub mod loading;
pub mod path;
pub mod schema;
pub mod store;

pub use errors::StateError;
pub use path::{resolve_namespace, Namespace, StatePath};
pub use schema::{initial_tree, paths, AllowList, KNOWN_PATHS};
pub use store::{ObservableStore, StateValue, Subscription, MAX_QUEUED_WRITES};
