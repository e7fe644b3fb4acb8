//! Wallet connection flow.
//!
//! `WalletSession` turns wallet-provider events (connect, account change,
//! chain change) into store writes: it detects whether the chain is
//! supported, records the account and network, and clears data that
//! belonged to a previous account or chain.

use alloy_primitives::Address;
use serde_json::{json, Value};

use crate::data::settings::ARBITRUM_ONE;
use crate::launch::LaunchParams;
use crate::messages::{MessageKind, MessageLog};
use crate::state::{initial_tree, paths, ObservableStore, StateError};
use crate::types::config::{ChainConfig, Settings};

/// Message shown when the wallet is on a chain without a configuration.
pub const UNSUPPORTED_NETWORK: &str =
    "Unsupported network. Please switch to Arbitrum One or Arbitrum Sepolia.";

/// Owns the connection-related writes for one store.
#[derive(Debug, Clone)]
pub struct WalletSession {
    store: ObservableStore,
    settings: Settings,
    launch: LaunchParams,
}

impl WalletSession {
    pub fn new(store: ObservableStore, settings: Settings, launch: LaunchParams) -> Self {
        WalletSession {
            store,
            settings,
            launch,
        }
    }

    pub fn store(&self) -> &ObservableStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn messages(&self) -> MessageLog {
        MessageLog::new(self.store.clone(), self.settings.message_ttl_ms)
    }

    /// Record the wallet's chain. Returns true when the chain is configured;
    /// otherwise the network and token address are cleared.
    pub fn detect_network(&self, chain_id: u64) -> Result<bool, StateError> {
        self.store.set(paths::WALLET_CHAIN_ID, json!(chain_id))?;

        let Some(chain) = self.settings.chain(chain_id) else {
            tracing::debug!(chain_id, "unsupported network");
            self.store.set(paths::WALLET_NETWORK, Value::Null)?;
            self.store.set(paths::TOKEN_ADDRESS, Value::Null)?;
            return Ok(false);
        };

        self.store.set(paths::WALLET_NETWORK, network_value(chain_id, chain))?;
        let token = self.launch.token.or(chain.token_address);
        self.store.set(paths::TOKEN_ADDRESS, json!(token))?;
        tracing::debug!(chain_id, network = %chain.name, "network detected");
        Ok(true)
    }

    /// Connect `account` on `chain_id`. On an unsupported chain nothing is
    /// connected, an error message is pushed and `false` is returned.
    pub fn connect(&self, chain_id: u64, account: Address, now_ms: u64) -> Result<bool, StateError> {
        if !self.detect_network(chain_id)? {
            self.store.set(paths::WALLET_CONNECTED, json!(false))?;
            self.store.set(paths::WALLET_ACCOUNT, Value::Null)?;
            self.messages().push(MessageKind::Error, UNSUPPORTED_NETWORK, now_ms)?;
            return Ok(false);
        }

        let previous: Option<Address> = self.store.get_as(paths::WALLET_ACCOUNT);
        if previous.is_some_and(|p| p != account) {
            self.clear_data()?;
        }
        self.store.set(paths::WALLET_ACCOUNT, json!(account))?;
        self.store.set(paths::WALLET_CONNECTED, json!(true))?;

        let name = self
            .settings
            .chain(chain_id)
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        self.messages().push(
            MessageKind::Success,
            &format!("Successfully connected to {}!", name),
            now_ms,
        )?;
        Ok(true)
    }

    /// Handle the provider's `accountsChanged` event. An empty list
    /// disconnects; otherwise the first account becomes current.
    pub fn on_accounts_changed(&self, accounts: &[Address], now_ms: u64) -> Result<bool, StateError> {
        let Some(&account) = accounts.first() else {
            self.disconnect()?;
            return Ok(false);
        };
        match self.store.get_as::<u64>(paths::WALLET_CHAIN_ID) {
            Some(chain_id) => self.connect(chain_id, account, now_ms),
            None => {
                self.store.set(paths::WALLET_ACCOUNT, json!(account))?;
                Ok(false)
            }
        }
    }

    /// Handle the provider's `chainChanged` event: data read on the old
    /// chain is dropped and the current account reconnects.
    pub fn on_chain_changed(&self, chain_id: u64, now_ms: u64) -> Result<bool, StateError> {
        self.clear_data()?;
        match self.store.get_as::<Address>(paths::WALLET_ACCOUNT) {
            Some(account) => self.connect(chain_id, account, now_ms),
            None => self.detect_network(chain_id),
        }
    }

    /// Reset the wallet and data namespaces to their initial values.
    pub fn disconnect(&self) -> Result<(), StateError> {
        self.reset_namespace("wallet")?;
        self.clear_data()
    }

    pub fn mainnet_warning(&self) -> bool {
        mainnet_warning(&self.store)
    }

    fn clear_data(&self) -> Result<(), StateError> {
        self.reset_namespace("data")?;
        self.store.set(paths::VESTING_OWNER, Value::Null)
    }

    fn reset_namespace(&self, namespace: &str) -> Result<(), StateError> {
        let initial = initial_tree();
        if let Some(Value::Object(fields)) = initial.get(namespace) {
            for (key, value) in fields {
                self.store.set(&format!("{}.{}", namespace, key), value.clone())?;
            }
        }
        Ok(())
    }
}

/// True when the wallet is on Arbitrum One but no token is deployed there
/// (missing or zero token address).
pub fn mainnet_warning(store: &ObservableStore) -> bool {
    let on_mainnet = store.get_as::<u64>(paths::WALLET_CHAIN_ID) == Some(ARBITRUM_ONE);
    let token: Option<Address> = store.get_as(paths::TOKEN_ADDRESS);
    on_mainnet && token.map_or(true, |t| t == Address::ZERO)
}

/// The `wallet.network` value: the chain config plus its numeric id.
fn network_value(chain_id: u64, chain: &ChainConfig) -> Value {
    let mut value = serde_json::to_value(chain).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        map.insert("chainId".into(), json!(chain_id));
    }
    value
}
