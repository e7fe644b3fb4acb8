use thiserror::Error;

// ---------------------------------------------------------------------------
// State errors
// ---------------------------------------------------------------------------

/// Errors reported by the observable store and its path parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The path text was empty (or only whitespace).
    #[error("empty state path")]
    EmptyPath,
    /// The path contained an empty segment, e.g. `wallet..account`.
    #[error("empty segment in state path '{path}'")]
    EmptySegment { path: String },
    /// The store was built with an allow-list and the path is not on it.
    #[error("unknown state path '{path}'")]
    UnknownPath { path: String },
    /// A write tried to descend through a leaf that is not a mapping.
    #[error("cannot write '{path}': '{segment}' holds a non-mapping value")]
    NotAMapping { path: String, segment: String },
}
