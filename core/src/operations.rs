//! Token and vesting transactions.
//!
//! An [`Operation`] is built from user input by one of the validating
//! constructors, then run by [`dispatch`]. Dispatch holds the operation's
//! loading flag for its whole duration, reports progress through the
//! message log, and refreshes contract data after a confirmed transaction.

use alloy_primitives::{Address, TxHash, U256};
use thiserror::Error;

use crate::format::{explorer_url, is_address, parse_amount, seconds_from_input, FormatError, LinkKind};
use crate::infrastructure::{ChainReader, SubmitError, TxRequest, TxSubmitter};
use crate::messages::MessageKind;
use crate::refresh::{refresh_token, refresh_vesting, RefreshError};
use crate::state::{paths, StateError};
use crate::wallet::WalletSession;

pub const PENDING_MESSAGE: &str = "Transaction pending... Please confirm in your wallet";

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Invalid {field} address")]
    InvalidAddress { field: &'static str },
    #[error("Enter a valid amount")]
    InvalidAmount(#[source] FormatError),
    #[error("Invalid deadline format")]
    InvalidDeadline(#[source] FormatError),
    #[error("Deadline must be in the future")]
    DeadlinePassed,
    #[error("Wallet not connected")]
    NotConnected,
    #[error("No {0} contract configured")]
    NoContract(&'static str),
    #[error("{0} already in progress")]
    Busy(&'static str),
    #[error("{label} failed: {source}")]
    Submit {
        label: &'static str,
        #[source]
        source: SubmitError,
    },
    #[error(transparent)]
    State(#[from] StateError),
}


/// A state-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Transfer { to: Address, amount: U256 },
    Approve { spender: Address, amount: U256 },
    /// EIP-2612 approval by signature; `deadline` is in seconds.
    Permit { spender: Address, value: U256, deadline: u64 },
    Delegate { delegatee: Address },
    /// Release vested tokens to the vesting wallet's owner.
    Release,
    TransferOwnership { new_owner: Address },
}

impl Operation {
    pub fn transfer(to: &str, amount: &str, decimals: u8) -> Result<Self, OperationError> {
        Ok(Operation::Transfer {
            to: address("recipient", to)?,
            amount: parse_amount(amount, decimals).map_err(OperationError::InvalidAmount)?,
        })
    }

    pub fn approve(spender: &str, amount: &str, decimals: u8) -> Result<Self, OperationError> {
        Ok(Operation::Approve {
            spender: address("spender", spender)?,
            amount: parse_amount(amount, decimals).map_err(OperationError::InvalidAmount)?,
        })
    }

    /// `deadline` is a datetime input; it must lie after `now` (seconds).
    pub fn permit(
        spender: &str,
        amount: &str,
        deadline: &str,
        decimals: u8,
        now: u64,
    ) -> Result<Self, OperationError> {
        let spender = address("permit spender", spender)?;
        let value = parse_amount(amount, decimals).map_err(OperationError::InvalidAmount)?;
        let deadline = seconds_from_input(deadline).map_err(OperationError::InvalidDeadline)?;
        if deadline <= now {
            return Err(OperationError::DeadlinePassed);
        }
        Ok(Operation::Permit {
            spender,
            value,
            deadline,
        })
    }

    /// A blank delegatee delegates to `account`.
    pub fn delegate(delegatee: &str, account: Address) -> Result<Self, OperationError> {
        let delegatee = if delegatee.trim().is_empty() {
            account
        } else {
            address("delegatee", delegatee)?
        };
        Ok(Operation::Delegate { delegatee })
    }

    pub fn transfer_ownership(new_owner: &str) -> Result<Self, OperationError> {
        Ok(Operation::TransferOwnership {
            new_owner: address("recipient", new_owner)?,
        })
    }

    /// The loading-flag name held while the operation runs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "transfer",
            Operation::Approve { .. } => "approve",
            Operation::Permit { .. } => "permit",
            Operation::Delegate { .. } => "delegate",
            Operation::Release => "release",
            Operation::TransferOwnership { .. } => "transferOwnership",
        }
    }

    /// Prefix for failure messages.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "Transfer",
            Operation::Approve { .. } => "Approval",
            Operation::Permit { .. } => "Permit",
            Operation::Delegate { .. } => "Delegation",
            Operation::Release => "Release",
            Operation::TransferOwnership { .. } => "Transfer",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "Transfer completed successfully!",
            Operation::Approve { .. } => "Approval completed successfully!",
            Operation::Permit { .. } => "Permit successful! Allowance has been set via signature.",
            Operation::Delegate { .. } => "Delegation successful!",
            Operation::Release => "Token release completed!",
            Operation::TransferOwnership { .. } => "Ownership transfer completed!",
        }
    }

    /// True for calls sent to the vesting wallet rather than the token.
    pub fn targets_vesting(&self) -> bool {
        matches!(self, Operation::Release | Operation::TransferOwnership { .. })
    }
}

fn address(field: &'static str, input: &str) -> Result<Address, OperationError> {
    let input = input.trim();
    if !is_address(input) {
        return Err(OperationError::InvalidAddress { field });
    }
    input.parse().map_err(|_| OperationError::InvalidAddress { field })
}


/// Submit `op` for the connected account and report the outcome.
///
/// A second dispatch of the same operation while the first is running is
/// rejected with [`OperationError::Busy`]. Failed submissions push an error
/// message and are returned as [`OperationError::Submit`]. A refresh failure
/// after a confirmed transaction is logged but does not fail the dispatch.
pub fn dispatch(
    session: &WalletSession,
    submitter: &dyn TxSubmitter,
    reader: &dyn ChainReader,
    op: Operation,
    now_ms: u64,
) -> Result<TxHash, OperationError> {
    let store = session.store();
    if store.get_as::<bool>(paths::WALLET_CONNECTED) != Some(true) {
        return Err(OperationError::NotConnected);
    }
    let from: Address = store
        .get_as(paths::WALLET_ACCOUNT)
        .ok_or(OperationError::NotConnected)?;
    let token: Address = store
        .get_as(paths::TOKEN_ADDRESS)
        .ok_or(OperationError::NoContract("token"))?;
    let vesting: Option<Address> = store.get_as(paths::VESTING_ADDRESS);
    if op.targets_vesting() && vesting.is_none() {
        return Err(OperationError::NoContract("vesting"));
    }

    let name = op.name();
    if store.is_loading(name) {
        return Err(OperationError::Busy(name));
    }

    store.set_loading(name, true)?;
    let request = TxRequest {
        from,
        token,
        vesting,
        operation: op,
    };
    let result = run(session, submitter, reader, &request, now_ms);
    store.set_loading(name, false)?;
    result
}

fn run(
    session: &WalletSession,
    submitter: &dyn TxSubmitter,
    reader: &dyn ChainReader,
    request: &TxRequest,
    now_ms: u64,
) -> Result<TxHash, OperationError> {
    let op = &request.operation;
    let messages = session.messages();
    messages.push(MessageKind::Info, PENDING_MESSAGE, now_ms)?;

    let hash = match submitter.submit(request) {
        Ok(hash) => hash,
        Err(source) => {
            let err = OperationError::Submit {
                label: op.label(),
                source,
            };
            messages.push(MessageKind::Error, &err.to_string(), now_ms)?;
            return Err(err);
        }
    };
    tracing::info!(operation = op.name(), tx = %hash, "transaction confirmed");

    let explorer: Option<String> = session.store().get_as("wallet.network.blockExplorer");
    let link = explorer
        .and_then(|e| explorer_url(&e, LinkKind::Tx, &hash.to_string()))
        .unwrap_or_else(|| hash.to_string());
    messages.push(
        MessageKind::Success,
        &format!("{} TX: {}", op.success_message(), link),
        now_ms,
    )?;

    if let Err(e) = refresh_after(session, reader, request, now_ms) {
        tracing::warn!(operation = op.name(), error = %e, "refresh after transaction failed");
    }
    Ok(hash)
}

fn refresh_after(
    session: &WalletSession,
    reader: &dyn ChainReader,
    request: &TxRequest,
    now_ms: u64,
) -> Result<(), RefreshError> {
    refresh_token(session.store(), reader)?;
    if request.vesting.is_some() {
        refresh_vesting(session.store(), reader, now_ms / 1000)?;
    }
    Ok(())
}
