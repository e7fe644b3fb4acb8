//! Tracer TUI: terminal dashboard for the Tracer wallet client.
//!
//! Renders [`tracer_core::view::Dashboard`] with ratatui widgets and redraws
//! whenever a store subscription reports a change.
//!
//! # Modules
//!
//! - [`app`]: Key handling and the store-driven redraw flag
//! - [`dashboard`]: Dashboard panels as ratatui widgets
//! - [`tui`]: Terminal setup, event loop and cleanup

pub mod app;
pub mod dashboard;
pub mod tui;
