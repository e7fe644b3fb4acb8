//! Launch parameters read from the page URL.
//!
//! `?vesting=<address>` switches the client to vesting mode, `?token=`
//! overrides the token address, and `?chain=` picks the preferred network.
//! Blank values count as absent.

use std::fmt;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::data::settings::{ARBITRUM_ONE, ARBITRUM_SEPOLIA};
use crate::format::is_address;
use crate::state::{paths, ObservableStore, StateError};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid {param} address '{value}'")]
    BadAddress { param: &'static str, value: String },
    #[error(transparent)]
    State(#[from] StateError),
}


/// Which page layout the client shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Default,
    Vesting,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Vesting => "vesting",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Network requested with `?chain=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainChoice {
    #[default]
    Arbitrum,
    ArbitrumSepolia,
}

impl ChainChoice {
    /// Parse a `chain` parameter; anything unrecognized falls back to
    /// Arbitrum One.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("arbitrum-sepolia") => ChainChoice::ArbitrumSepolia,
            _ => ChainChoice::Arbitrum,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            ChainChoice::Arbitrum => ARBITRUM_ONE,
            ChainChoice::ArbitrumSepolia => ARBITRUM_SEPOLIA,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainChoice::Arbitrum => "arbitrum",
            ChainChoice::ArbitrumSepolia => "arbitrum-sepolia",
        }
    }
}


/// Everything the page URL configures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaunchParams {
    pub mode: Mode,
    pub chain: ChainChoice,
    pub token: Option<Address>,
    pub vesting: Option<Address>,
}

impl LaunchParams {
    /// Parse launch parameters from a full page URL.
    pub fn from_url(page: &str) -> Result<Self, LaunchError> {
        let url = Url::parse(page)?;
        Self::from_query_pairs(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
    }

    /// Parse launch parameters from decoded query pairs. The first
    /// occurrence of a parameter wins.
    pub fn from_query_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, LaunchError> {
        let mut chain = None;
        let mut token = None;
        let mut vesting = None;

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_str() {
                "chain" => &mut chain,
                "token" => &mut token,
                "vesting" => &mut vesting,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }

        let token = parse_address("token", token)?;
        let vesting = parse_address("vesting", vesting)?;
        let mode = if vesting.is_some() { Mode::Vesting } else { Mode::Default };

        Ok(LaunchParams {
            mode,
            chain: ChainChoice::from_param(chain.as_deref()),
            token,
            vesting,
        })
    }

    /// Write the mode and address overrides into the store.
    pub fn apply(&self, store: &ObservableStore) -> Result<(), LaunchError> {
        store.set(paths::VESTING_MODE, json!(self.mode == Mode::Vesting))?;
        if let Some(vesting) = self.vesting {
            store.set(paths::VESTING_ADDRESS, json!(vesting))?;
        }
        if let Some(token) = self.token {
            store.set(paths::TOKEN_ADDRESS, json!(token))?;
        }
        tracing::debug!(mode = %self.mode, chain = self.chain.as_str(), "launch parameters applied");
        Ok(())
    }

    /// JSON form used by the CLI.
    pub fn to_value(&self) -> Value {
        json!({
            "mode": self.mode.as_str(),
            "chain": self.chain.as_str(),
            "chainId": self.chain.chain_id(),
            "token": self.token,
            "vesting": self.vesting,
        })
    }
}

fn parse_address(param: &'static str, value: Option<String>) -> Result<Option<Address>, LaunchError> {
    match value {
        None => Ok(None),
        Some(v) if is_address(&v) => v
            .parse()
            .map(Some)
            .map_err(|_| LaunchError::BadAddress { param, value: v }),
        Some(v) => Err(LaunchError::BadAddress { param, value: v }),
    }
}
