//! Read-only token queries and the add-token wallet request.
//!
//! A [`Query`] is validated from user input like an
//! [`Operation`](crate::operations::Operation), then answered by
//! [`run_query`] through a [`ChainReader`]. Answers are not stored; they are
//! returned for display. Failures are reported through the message log.

use std::fmt;

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::format::{datetime_from_seconds, format_amount, is_address, seconds_from_input, FormatError};
use crate::infrastructure::{ChainReader, ReadError, SubmitError, TxSubmitter, WatchAsset};
use crate::messages::MessageKind;
use crate::state::{paths, StateError};
use crate::wallet::WalletSession;

/// Loading flag held while the token is being added to the wallet.
pub const ADD_TOKEN_FLAG: &str = "addToken";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Please enter spender address")]
    MissingSpender,
    #[error("Invalid {field} address")]
    InvalidAddress { field: &'static str },
    #[error("Invalid address")]
    InvalidAccount,
    #[error("Please choose a date & time")]
    MissingDate,
    #[error("Invalid date format")]
    InvalidDate(#[source] FormatError),
    #[error("Wallet not connected")]
    NotConnected,
    #[error("No token contract configured")]
    NoContract,
    #[error("{0} already in progress")]
    Busy(&'static str),
    #[error("{label}: {source}")]
    Read {
        label: &'static str,
        #[source]
        source: ReadError,
    },
    #[error("Failed to add token: {0}")]
    Wallet(#[source] SubmitError),
    #[error(transparent)]
    State(#[from] StateError),
}


/// A read against the token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Allowance { owner: Address, spender: Address },
    VotingPower { account: Address },
    /// Circulating supply at `at` (seconds).
    Circulation { at: u64 },
}

impl Query {
    /// A blank owner means the connected `account`.
    pub fn allowance(owner: &str, spender: &str, account: Option<Address>) -> Result<Self, QueryError> {
        let spender = spender.trim();
        if spender.is_empty() {
            return Err(QueryError::MissingSpender);
        }
        let spender = parse_address(spender).ok_or(QueryError::InvalidAddress { field: "spender" })?;
        let owner = match owner.trim() {
            "" => account.ok_or(QueryError::NotConnected)?,
            input => parse_address(input).ok_or(QueryError::InvalidAddress { field: "owner" })?,
        };
        Ok(Query::Allowance { owner, spender })
    }

    /// A blank address means the connected `account`.
    pub fn voting_power(address: &str, account: Option<Address>) -> Result<Self, QueryError> {
        let account = match address.trim() {
            "" => account.ok_or(QueryError::InvalidAccount)?,
            input => parse_address(input).ok_or(QueryError::InvalidAccount)?,
        };
        Ok(Query::VotingPower { account })
    }

    /// `at` is a datetime input, read as UTC.
    pub fn circulation(at: &str) -> Result<Self, QueryError> {
        if at.trim().is_empty() {
            return Err(QueryError::MissingDate);
        }
        let at = seconds_from_input(at).map_err(QueryError::InvalidDate)?;
        Ok(Query::Circulation { at })
    }

    /// The loading-flag name held while the query runs.
    pub fn name(&self) -> &'static str {
        match self {
            Query::Allowance { .. } => "checkAllowance",
            Query::VotingPower { .. } => "checkVotingPower",
            Query::Circulation { .. } => "circulation",
        }
    }

    fn failure_label(&self) -> &'static str {
        match self {
            Query::Allowance { .. } => "Failed to check allowance",
            Query::VotingPower { .. } => "Failed to fetch voting power",
            Query::Circulation { .. } => "Failed to check circulation",
        }
    }
}

fn parse_address(input: &str) -> Option<Address> {
    if !is_address(input) {
        return None;
    }
    input.parse().ok()
}


/// Token symbol and decimals used to render an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUnits {
    pub symbol: String,
    pub decimals: u8,
}

/// The answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAnswer {
    Allowance { amount: U256, units: TokenUnits },
    VotingPower { votes: U256, units: TokenUnits },
    Circulation {
        at: u64,
        supply: U256,
        total_supply: U256,
        units: TokenUnits,
    },
}

impl QueryAnswer {
    /// Circulating share of the total supply, in thousandths of a percent.
    /// `None` for other answers or a zero total supply.
    pub fn circulating_share(&self) -> Option<U256> {
        match self {
            QueryAnswer::Circulation {
                supply,
                total_supply,
                ..
            } if !total_supply.is_zero() => {
                Some(supply.saturating_mul(U256::from(100_000u32)) / *total_supply)
            }
            _ => None,
        }
    }
}

impl fmt::Display for QueryAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryAnswer::Allowance { amount, units } => write!(
                f,
                "Allowance: {} {}",
                format_amount(*amount, units.decimals),
                units.symbol
            ),
            QueryAnswer::VotingPower { votes, units } => write!(
                f,
                "Voting Power: {} {}",
                format_amount(*votes, units.decimals),
                units.symbol
            ),
            QueryAnswer::Circulation { at, supply, units, .. } => {
                let one = U256::from(10u8).pow(U256::from(units.decimals));
                let whole = *supply - (*supply % one);
                let share = self
                    .circulating_share()
                    .map(|s| format_amount(s, 3))
                    .unwrap_or_else(|| "0".to_string());
                write!(
                    f,
                    "Circulation at {}: {} {} = {}%",
                    datetime_from_seconds(*at),
                    format_amount(whole, units.decimals),
                    units.symbol,
                    share
                )
            }
        }
    }
}


/// Answer `query` against the configured token.
///
/// The query's loading flag is held while it runs and a second run of the
/// same query is rejected with [`QueryError::Busy`]. Read failures push an
/// error message and are returned as [`QueryError::Read`].
pub fn run_query(
    session: &WalletSession,
    reader: &dyn ChainReader,
    query: &Query,
    now_ms: u64,
) -> Result<QueryAnswer, QueryError> {
    let store = session.store();
    let token: Address = store.get_as(paths::TOKEN_ADDRESS).ok_or(QueryError::NoContract)?;
    let name = query.name();
    if store.is_loading(name) {
        return Err(QueryError::Busy(name));
    }

    store.set_loading(name, true)?;
    let result = answer(session, reader, token, query, now_ms);
    store.set_loading(name, false)?;
    result
}

fn answer(
    session: &WalletSession,
    reader: &dyn ChainReader,
    token: Address,
    query: &Query,
    now_ms: u64,
) -> Result<QueryAnswer, QueryError> {
    let messages = session.messages();
    if let Query::VotingPower { .. } = query {
        messages.push(MessageKind::Info, "Fetching voting power...", now_ms)?;
    }

    let read = || -> Result<QueryAnswer, ReadError> {
        let units = token_units(session, reader, token)?;
        Ok(match *query {
            Query::Allowance { owner, spender } => QueryAnswer::Allowance {
                amount: reader.allowance(token, owner, spender)?,
                units,
            },
            Query::VotingPower { account } => QueryAnswer::VotingPower {
                votes: reader.votes_of(token, account)?,
                units,
            },
            Query::Circulation { at } => QueryAnswer::Circulation {
                at,
                supply: reader.circulating_supply_at(token, at)?,
                total_supply: total_supply(session, reader, token)?,
                units,
            },
        })
    };

    match read() {
        Ok(answer) => {
            tracing::debug!(query = query.name(), %answer, "query answered");
            if let Query::VotingPower { .. } = query {
                messages.push(MessageKind::Success, "Voting power retrieved!", now_ms)?;
            }
            Ok(answer)
        }
        Err(source) => {
            let err = QueryError::Read {
                label: query.failure_label(),
                source,
            };
            messages.push(MessageKind::Error, &err.to_string(), now_ms)?;
            Err(err)
        }
    }
}

/// Symbol and decimals from the `data` namespace, read from the token when
/// no refresh has stored them yet.
fn token_units(
    session: &WalletSession,
    reader: &dyn ChainReader,
    token: Address,
) -> Result<TokenUnits, ReadError> {
    let store = session.store();
    if let (Some(symbol), Some(decimals)) = (
        store.get_as::<String>(paths::SYMBOL),
        store.get_as::<u8>(paths::DECIMALS),
    ) {
        return Ok(TokenUnits { symbol, decimals });
    }
    let account = store.get_as(paths::WALLET_ACCOUNT).unwrap_or(Address::ZERO);
    let snap = reader.token_snapshot(token, account)?;
    Ok(TokenUnits {
        symbol: snap.symbol,
        decimals: snap.decimals,
    })
}

fn total_supply(session: &WalletSession, reader: &dyn ChainReader, token: Address) -> Result<U256, ReadError> {
    let store = session.store();
    if let Some(total) = store
        .get_as::<String>(paths::TOTAL_SUPPLY)
        .and_then(|s| s.parse::<U256>().ok())
    {
        return Ok(total);
    }
    let account = store.get_as(paths::WALLET_ACCOUNT).unwrap_or(Address::ZERO);
    Ok(reader.token_snapshot(token, account)?.total_supply)
}


/// The watch-asset request for the configured token, with the configured
/// token image.
pub fn watch_asset_request(
    session: &WalletSession,
    reader: &dyn ChainReader,
) -> Result<WatchAsset, QueryError> {
    let token: Address = session
        .store()
        .get_as(paths::TOKEN_ADDRESS)
        .ok_or(QueryError::NoContract)?;
    let units = token_units(session, reader, token).map_err(|source| QueryError::Read {
        label: "Failed to add token",
        source,
    })?;
    Ok(WatchAsset {
        address: token,
        symbol: units.symbol,
        decimals: units.decimals,
        image: session.settings().token_image_url.clone(),
    })
}

/// Ask the wallet to track the token and report the outcome.
pub fn add_token(
    session: &WalletSession,
    wallet: &dyn TxSubmitter,
    reader: &dyn ChainReader,
    now_ms: u64,
) -> Result<WatchAsset, QueryError> {
    let store = session.store();
    if store.is_loading(ADD_TOKEN_FLAG) {
        return Err(QueryError::Busy(ADD_TOKEN_FLAG));
    }
    store.set_loading(ADD_TOKEN_FLAG, true)?;
    let result = watch_asset_request(session, reader).and_then(|asset| {
        wallet
            .watch_asset(&asset)
            .map(|()| asset)
            .map_err(QueryError::Wallet)
    });
    store.set_loading(ADD_TOKEN_FLAG, false)?;

    let messages = session.messages();
    match &result {
        Ok(_) => {
            messages.push(MessageKind::Success, "Token added to your wallet!", now_ms)?;
        }
        Err(e) => {
            messages.push(MessageKind::Error, &e.to_string(), now_ms)?;
        }
    }
    result
}
