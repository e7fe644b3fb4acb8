//! Mock chain backends for testing.
//!
//! `MockReader` serves pre-configured snapshots and records every read;
//! `MockSubmitter` records every transaction and returns predictable
//! hashes. Both make refresh and operation tests deterministic.

use std::cell::RefCell;

use alloy_primitives::{Address, TxHash, B256, U256};

use super::{ChainReader, ReadError, SubmitError, TxRequest, TxSubmitter, WatchAsset};
use crate::types::snapshot::{TokenSnapshot, VestingSnapshot};

/// A read the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    Token { token: Address, account: Address },
    Vesting { vesting: Address },
    Allowance { owner: Address, spender: Address },
    Votes { account: Address },
    Circulation { at: u64 },
}

/// A test-double that serves fixed snapshots.
pub struct MockReader {
    pub token: Option<TokenSnapshot>,
    pub vesting: Option<VestingSnapshot>,
    /// Answer to every allowance read.
    pub allowance: U256,
    /// Answer to every votes read.
    pub votes: U256,
    /// Answer to every circulating supply read.
    pub circulating: U256,
    /// Error message returned by every read when set.
    pub fail_with: Option<String>,
    reads: RefCell<Vec<MockRead>>,
}

impl MockReader {
    pub fn new() -> Self {
        MockReader {
            token: None,
            vesting: None,
            allowance: U256::ZERO,
            votes: U256::ZERO,
            circulating: U256::ZERO,
            fail_with: None,
            reads: RefCell::new(Vec::new()),
        }
    }

    /// Create a mock serving the given token snapshot.
    pub fn with_token(token: TokenSnapshot) -> Self {
        MockReader {
            token: Some(token),
            ..Self::new()
        }
    }

    /// All reads received so far, in order.
    pub fn reads(&self) -> Vec<MockRead> {
        self.reads.borrow().clone()
    }

    fn record(&self, read: MockRead) -> Result<(), ReadError> {
        self.reads.borrow_mut().push(read);
        match &self.fail_with {
            Some(msg) => Err(ReadError::Other(msg.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainReader for MockReader {
    fn token_snapshot(&self, token: Address, account: Address) -> Result<TokenSnapshot, ReadError> {
        self.reads.borrow_mut().push(MockRead::Token { token, account });
        if let Some(msg) = &self.fail_with {
            return Err(ReadError::Other(msg.clone()));
        }
        self.token
            .clone()
            .ok_or_else(|| ReadError::Other(format!("mock: no token data for {}", token)))
    }

    fn vesting_snapshot(&self, vesting: Address) -> Result<VestingSnapshot, ReadError> {
        self.reads.borrow_mut().push(MockRead::Vesting { vesting });
        if let Some(msg) = &self.fail_with {
            return Err(ReadError::Other(msg.clone()));
        }
        self.vesting.clone().ok_or(ReadError::NoVesting(vesting))
    }

    fn allowance(&self, _token: Address, owner: Address, spender: Address) -> Result<U256, ReadError> {
        self.record(MockRead::Allowance { owner, spender })?;
        Ok(self.allowance)
    }

    fn votes_of(&self, _token: Address, account: Address) -> Result<U256, ReadError> {
        self.record(MockRead::Votes { account })?;
        Ok(self.votes)
    }

    fn circulating_supply_at(&self, _token: Address, at: u64) -> Result<U256, ReadError> {
        self.record(MockRead::Circulation { at })?;
        Ok(self.circulating)
    }
}

/// A test-double that records submitted transactions.
pub struct MockSubmitter {
    /// Error message returned by every submission when set.
    pub fail_with: Option<String>,
    submitted: RefCell<Vec<TxRequest>>,
    watched: RefCell<Vec<WatchAsset>>,
}

impl MockSubmitter {
    pub fn new() -> Self {
        MockSubmitter {
            fail_with: None,
            submitted: RefCell::new(Vec::new()),
            watched: RefCell::new(Vec::new()),
        }
    }

    /// Create a mock that rejects every transaction with `message`.
    pub fn failing(message: &str) -> Self {
        MockSubmitter {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// All requests received so far, in order.
    pub fn submitted(&self) -> Vec<TxRequest> {
        self.submitted.borrow().clone()
    }

    /// All watch-asset requests received so far.
    pub fn watched(&self) -> Vec<WatchAsset> {
        self.watched.borrow().clone()
    }
}

impl Default for MockSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TxSubmitter for MockSubmitter {
    fn submit(&self, request: &TxRequest) -> Result<TxHash, SubmitError> {
        let mut submitted = self.submitted.borrow_mut();
        submitted.push(request.clone());
        if let Some(msg) = &self.fail_with {
            return Err(SubmitError(msg.clone()));
        }
        // Hash n is the byte n repeated.
        Ok(B256::repeat_byte(submitted.len() as u8))
    }

    fn watch_asset(&self, asset: &WatchAsset) -> Result<(), SubmitError> {
        self.watched.borrow_mut().push(asset.clone());
        match &self.fail_with {
            Some(msg) => Err(SubmitError(msg.clone())),
            None => Ok(()),
        }
    }
}
