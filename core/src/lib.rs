//! Tracer core: client-side state for an ERC20 / vesting wallet dashboard.
//!
//! The heart of the crate is [`state::ObservableStore`], a path-addressed
//! JSON tree with per-path change subscriptions. Everything else reads from
//! or writes to it.
//!
//! # Modules
//!
//! - [`state`]: Observable store, paths, loading flags, state layout
//! - [`types`]: Settings and contract snapshot types
//! - [`data`]: Settings file loading and defaults
//! - [`infrastructure`]: Chain reader and transaction submitter backends
//! - [`launch`]: Launch parameters from the page URL
//! - [`wallet`]: Connection flow and network detection
//! - [`refresh`]: Contract reads into the `data` namespace
//! - [`operations`]: Validated transactions and their dispatch
//! - [`queries`]: Allowance, voting power and circulation reads; add-token
//! - [`messages`]: Transient user messages
//! - [`format`]: Amount, address, date and link formatting
//! - [`view`]: Text dashboard built from the store

pub mod data;
pub mod format;
pub mod infrastructure;
pub mod launch;
pub mod messages;
pub mod operations;
pub mod queries;
pub mod refresh;
pub mod state;
pub mod types;
pub mod view;
pub mod wallet;
