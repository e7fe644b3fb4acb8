use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Currency paid for gas on a chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A supported network and the token deployed on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub name: String,
    pub chain_id_hex: String,
    pub rpc_url: String,
    /// Explorer base URL, with trailing slash.
    pub block_explorer: String,
    pub native_currency: NativeCurrency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Supported chains keyed by numeric chain id.
    pub chains: BTreeMap<u64, ChainConfig>,
    /// How long a transient message stays visible.
    pub message_ttl_ms: u64,
    /// Default permit deadline offset, in minutes from now.
    pub deadline_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_image_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        crate::data::settings::default_settings()
    }
}

impl Settings {
    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }
}
