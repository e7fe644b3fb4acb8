//! Chain backends.
//!
//! Provides the `ChainReader` trait through which contract reads reach the
//! store and the `TxSubmitter` trait through which transactions leave it,
//! plus a file-backed reader for offline use and mocks for tests. Backends
//! only move data; writing it into the store is the job of
//! [`crate::refresh`] and [`crate::operations`].

pub mod file;
pub mod mock;

use alloy_primitives::{Address, TxHash, U256};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::operations::Operation;
use crate::types::snapshot::{TokenSnapshot, VestingSnapshot};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read snapshot {path}: {message}")]
    Source { path: String, message: String },
    #[error("invalid snapshot {path}: {message}")]
    Decode { path: String, message: String },
    #[error("no vesting data for {0}")]
    NoVesting(Address),
    #[error("{0}")]
    Other(String),
}

/// Trait for contract read backends.
pub trait ChainReader {
    /// Read the token state as seen by `account`.
    fn token_snapshot(&self, token: Address, account: Address) -> Result<TokenSnapshot, ReadError>;

    /// Read the state of the vesting wallet at `vesting`.
    fn vesting_snapshot(&self, vesting: Address) -> Result<VestingSnapshot, ReadError>;

    /// `allowance(owner, spender)` on the token.
    fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ReadError>;

    /// `getVotes(account)` on the token.
    fn votes_of(&self, token: Address, account: Address) -> Result<U256, ReadError>;

    /// `circulatingSupplyAt(at)` on the token, `at` in seconds.
    fn circulating_supply_at(&self, token: Address, at: u64) -> Result<U256, ReadError>;
}

/// A transaction as handed to a submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// The connected account signing the transaction.
    pub from: Address,
    pub token: Address,
    /// Vesting wallet, required by `Release` and `TransferOwnership`.
    pub vesting: Option<Address>,
    pub operation: Operation,
}

impl TxRequest {
    /// The contract the transaction is sent to.
    pub fn target(&self) -> Option<Address> {
        if self.operation.targets_vesting() {
            self.vesting
        } else {
            Some(self.token)
        }
    }
}

/// Failure reported by the wallet or the chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SubmitError(pub String);

/// An ERC20 token for the wallet to add to its asset list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchAsset {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl WatchAsset {
    /// The `wallet_watchAsset` JSON-RPC request for this token.
    pub fn to_rpc(&self) -> Value {
        json!({
            "method": "wallet_watchAsset",
            "params": { "type": "ERC20", "options": self },
        })
    }
}

/// Trait for wallet backends. `submit` returns once the transaction is
/// confirmed.
pub trait TxSubmitter {
    fn submit(&self, request: &TxRequest) -> Result<TxHash, SubmitError>;

    /// Ask the wallet to track `asset`.
    fn watch_asset(&self, asset: &WatchAsset) -> Result<(), SubmitError>;
}
