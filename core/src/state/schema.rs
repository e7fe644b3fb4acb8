//! The wallet client's state layout.
//!
//! Names every path the app reads or writes, builds the initial tree, and
//! provides the allow-list an app store uses to reject misspelled paths.

use serde_json::{json, Value};

use super::path::StatePath;

/// Dotted paths used by the wallet client.
pub mod paths {
    pub const WALLET_CONNECTED: &str = "wallet.connected";
    pub const WALLET_ACCOUNT: &str = "wallet.account";
    pub const WALLET_NETWORK: &str = "wallet.network";
    pub const WALLET_CHAIN_ID: &str = "wallet.chainId";

    pub const TOKEN_ADDRESS: &str = "contracts.tokenAddress";
    pub const VESTING_ADDRESS: &str = "contracts.vestingAddress";
    pub const VESTING_OWNER: &str = "contracts.vestingOwner";

    pub const BALANCE: &str = "data.balance";
    pub const TOTAL_SUPPLY: &str = "data.totalSupply";
    pub const VOTING_POWER: &str = "data.votingPower";
    pub const DELEGATES: &str = "data.delegates";
    pub const NONCE: &str = "data.nonce";
    pub const NAME: &str = "data.name";
    pub const SYMBOL: &str = "data.symbol";
    pub const DECIMALS: &str = "data.decimals";
    pub const VESTING_START: &str = "data.vestingStart";
    pub const VESTING_END: &str = "data.vestingEnd";
    pub const VESTING_RELEASED: &str = "data.vestingReleased";
    pub const VESTING_RELEASABLE: &str = "data.vestingReleasable";
    pub const UNVESTED_BALANCE: &str = "data.unvestedBalance";
    pub const VESTING_STARTED: &str = "data.vestingStarted";

    pub const LOADING: &str = "ui.loading";
    pub const VESTING_MODE: &str = "ui.isVestingMode";
    pub const MESSAGES: &str = "ui.messages";
    /// Last message id handed out; never decreases.
    pub const MESSAGE_SEQ: &str = "ui.messageSeq";
}

/// Every leaf path of the app layout.
pub const KNOWN_PATHS: &[&str] = &[
    paths::WALLET_CONNECTED,
    paths::WALLET_ACCOUNT,
    paths::WALLET_NETWORK,
    paths::WALLET_CHAIN_ID,
    paths::TOKEN_ADDRESS,
    paths::VESTING_ADDRESS,
    paths::VESTING_OWNER,
    paths::BALANCE,
    paths::TOTAL_SUPPLY,
    paths::VOTING_POWER,
    paths::DELEGATES,
    paths::NONCE,
    paths::NAME,
    paths::SYMBOL,
    paths::DECIMALS,
    paths::VESTING_START,
    paths::VESTING_END,
    paths::VESTING_RELEASED,
    paths::VESTING_RELEASABLE,
    paths::UNVESTED_BALANCE,
    paths::VESTING_STARTED,
    paths::LOADING,
    paths::VESTING_MODE,
    paths::MESSAGES,
    paths::MESSAGE_SEQ,
];

/// The tree an app store starts from: disconnected wallet, no contracts,
/// no data, nothing loading, default mode.
pub fn initial_tree() -> Value {
    json!({
        "wallet": {
            "connected": false,
            "account": null,
            "network": null,
            "chainId": null,
        },
        "contracts": {
            "tokenAddress": null,
            "vestingAddress": null,
            "vestingOwner": null,
        },
        "data": {
            "balance": null,
            "totalSupply": null,
            "votingPower": null,
            "delegates": null,
            "nonce": null,
            "name": null,
            "symbol": null,
            "decimals": null,
            "vestingStart": null,
            "vestingEnd": null,
            "vestingReleased": null,
            "vestingReleasable": null,
            "unvestedBalance": null,
            "vestingStarted": null,
        },
        "ui": {
            "loading": [],
            "isVestingMode": false,
            "messages": [],
            "messageSeq": 0,
        },
    })
}


/// Set of recognized leaf paths.
///
/// A path is allowed when it is a known leaf, an ancestor of one
/// (`wallet`), or descends into one (`wallet.network.name`).
#[derive(Debug, Clone)]
pub struct AllowList {
    known: Vec<StatePath>,
}

impl AllowList {
    /// Build an allow-list from dotted path strings. Malformed entries are
    /// skipped.
    pub fn new<'a>(entries: impl IntoIterator<Item = &'a str>) -> Self {
        let known = entries
            .into_iter()
            .filter_map(|s| StatePath::parse(s).ok())
            .collect();
        AllowList { known }
    }

    /// The allow-list for the wallet client layout.
    pub fn app() -> Self {
        Self::new(KNOWN_PATHS.iter().copied())
    }

    pub fn is_allowed(&self, path: &StatePath) -> bool {
        self.known
            .iter()
            .any(|k| path.is_prefix_of(k) || k.is_prefix_of(path))
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
