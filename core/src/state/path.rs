//! Dotted state paths.
//!
//! Parses paths like `wallet.account`, `data.vestingStart` or `a.b.c` into
//! a list of literal segments. Any well-formed path is accepted here; the
//! app allow-list in [`super::schema`] decides which ones the app may use.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::StateError;


/// Top-level namespaces used by the wallet client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// wallet.*: connection, account, detected network
    Wallet,
    /// contracts.*: token and vesting contract addresses
    Contracts,
    /// data.*: values read from the contracts
    Data,
    /// ui.*: loading flags, mode, transient messages
    Ui,
}

impl Namespace {
    /// All namespaces, in the order the initial tree lists them.
    pub const ALL: [Namespace; 4] = [
        Namespace::Wallet,
        Namespace::Contracts,
        Namespace::Data,
        Namespace::Ui,
    ];

    /// The canonical string prefix for this namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Wallet => "wallet",
            Namespace::Contracts => "contracts",
            Namespace::Data => "data",
            Namespace::Ui => "ui",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Parse the first segment of a dotted path into a Namespace enum.
pub fn resolve_namespace(s: &str) -> Option<Namespace> {
    match s {
        "wallet" => Some(Namespace::Wallet),
        "contracts" => Some(Namespace::Contracts),
        "data" => Some(Namespace::Data),
        "ui" => Some(Namespace::Ui),
        _ => None,
    }
}


/// A parsed dotted path: one or more non-empty literal segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatePath {
    segments: Vec<String>,
}

impl StatePath {
    /// Parse a dotted string like `wallet.account` into a StatePath.
    ///
    /// Surrounding whitespace is ignored. Empty paths and empty segments
    /// (`a..b`, `.a`, `a.`) are rejected.
    pub fn parse(input: &str) -> Result<Self, StateError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(StateError::EmptyPath);
        }

        let mut segments = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(StateError::EmptySegment {
                    path: input.to_string(),
                });
            }
            segments.push(part.to_string());
        }

        Ok(StatePath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (always at least one).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; kept so `len` has its usual companion.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment, the key assigned by a write.
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The path minus its final segment, or `None` for a top-level path.
    pub fn parent(&self) -> Option<StatePath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(StatePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The app namespace of the first segment, if it is one.
    pub fn namespace(&self) -> Option<Namespace> {
        self.segments.first().and_then(|s| resolve_namespace(s))
    }

    /// True if every segment of `self` matches the leading segments of
    /// `other`. A path is a prefix of itself.
    pub fn is_prefix_of(&self, other: &StatePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// Format back to a dotted string.
    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl FromStr for StatePath {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatePath::parse(s)
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
