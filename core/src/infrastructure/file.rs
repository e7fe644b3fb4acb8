//! File-backed chain reader.
//!
//! Serves token and vesting data recorded in a snapshot file, so the
//! dashboard can be rendered without a wallet or an RPC endpoint. The file
//! is YAML (JSON is accepted too) holding a `ChainSnapshot`.

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, U256};

use super::{ChainReader, ReadError};
use crate::types::snapshot::{ChainSnapshot, TokenSnapshot, VestingSnapshot};

pub struct FileReader {
    path: PathBuf,
}

impl FileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileReader { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the whole snapshot file.
    pub fn load(&self) -> Result<ChainSnapshot, ReadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| ReadError::Source {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ReadError::Decode {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

impl ChainReader for FileReader {
    fn token_snapshot(&self, token: Address, account: Address) -> Result<TokenSnapshot, ReadError> {
        tracing::debug!(%token, %account, path = %self.path.display(), "reading token snapshot");
        Ok(self.load()?.token)
    }

    fn vesting_snapshot(&self, vesting: Address) -> Result<VestingSnapshot, ReadError> {
        tracing::debug!(%vesting, path = %self.path.display(), "reading vesting snapshot");
        self.load()?.vesting.ok_or(ReadError::NoVesting(vesting))
    }

    fn allowance(&self, _token: Address, owner: Address, spender: Address) -> Result<U256, ReadError> {
        Ok(self.load()?.allowance(owner, spender))
    }

    fn votes_of(&self, _token: Address, account: Address) -> Result<U256, ReadError> {
        Ok(self.load()?.votes_of(account))
    }

    fn circulating_supply_at(&self, _token: Address, at: u64) -> Result<U256, ReadError> {
        Ok(self.load()?.circulating_supply_at(at))
    }
}
