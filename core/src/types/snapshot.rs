use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Everything the dashboard reads from the token contract for one account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub balance: U256,
    pub voting_power: U256,
    pub nonce: U256,
    /// Current delegate; the zero address means none is set.
    pub delegates: Address,
}

/// State of a VestingWallet contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VestingSnapshot {
    pub owner: Address,
    /// Vesting start, seconds since the epoch.
    pub start: u64,
    /// Vesting end, seconds since the epoch.
    pub end: u64,
    pub released: U256,
    pub releasable: U256,
    /// Token balance still held by the vesting wallet.
    pub unvested: U256,
}

impl VestingSnapshot {
    /// True once `now` (seconds) has reached the vesting start.
    pub fn started_at(&self, now: u64) -> bool {
        now >= self.start
    }
}

/// An ERC20 allowance granted by `owner` to `spender`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowanceEntry {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Voting power held by `account`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotesEntry {
    pub account: Address,
    pub votes: U256,
}

/// Circulating supply in effect from `at` (seconds) until the next point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CirculationPoint {
    pub at: u64,
    pub supply: U256,
}

/// A snapshot file: token data plus optional vesting data and the answers
/// to allowance, voting power and circulation queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainSnapshot {
    pub token: TokenSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vesting: Option<VestingSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowances: Vec<AllowanceEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub votes: Vec<VotesEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub circulation: Vec<CirculationPoint>,
}

impl ChainSnapshot {
    /// Allowance of `spender` over `owner`'s tokens; zero when unrecorded.
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .iter()
            .find(|a| a.owner == owner && a.spender == spender)
            .map(|a| a.amount)
            .unwrap_or(U256::ZERO)
    }

    /// Votes of `account`; zero when unrecorded.
    pub fn votes_of(&self, account: Address) -> U256 {
        self.votes
            .iter()
            .find(|v| v.account == account)
            .map(|v| v.votes)
            .unwrap_or(U256::ZERO)
    }

    /// Supply of the latest point at or before `at`; zero before the first.
    pub fn circulating_supply_at(&self, at: u64) -> U256 {
        self.circulation
            .iter()
            .filter(|p| p.at <= at)
            .max_by_key(|p| p.at)
            .map(|p| p.supply)
            .unwrap_or(U256::ZERO)
    }
}
