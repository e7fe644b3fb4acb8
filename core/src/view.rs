//! Dashboard view built from the store.
//!
//! [`Dashboard::from_store`] reads the wallet, contracts, data and ui
//! namespaces and produces display-ready panels. Rendering is plain text
//! via `Display`; nothing here writes to the store.

use std::fmt;

use alloy_primitives::{Address, U256};

use crate::format::{datetime_from_seconds, explorer_url, format_amount, short_address, LinkKind};
use crate::messages::{Message, MessageLog};
use crate::state::{paths, ObservableStore};
use crate::wallet::mainnet_warning;

/// Operation name whose loading flag disables the release button.
pub const RELEASE_OPERATION: &str = "release";


/// How the connected account delegates its votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateStatus {
    NotSet,
    SelfDelegated,
    Other(Address),
}

impl DelegateStatus {
    /// The zero address means no delegate; the account itself means
    /// self-delegation.
    pub fn classify(delegate: Address, account: Option<Address>) -> Self {
        if delegate == Address::ZERO {
            DelegateStatus::NotSet
        } else if Some(delegate) == account {
            DelegateStatus::SelfDelegated
        } else {
            DelegateStatus::Other(delegate)
        }
    }
}

impl fmt::Display for DelegateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelegateStatus::NotSet => f.write_str("No delegate set"),
            DelegateStatus::SelfDelegated => f.write_str("Self-delegated"),
            DelegateStatus::Other(addr) => f.write_str(&short_address(&addr.to_string(), 4)),
        }
    }
}


/// Token figures for the connected account, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPanel {
    pub name: String,
    pub symbol: String,
    pub balance: String,
    pub total_supply: String,
    pub voting_power: String,
    pub nonce: String,
    pub delegate: DelegateStatus,
}

/// Vesting wallet state, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingPanel {
    pub address: Address,
    pub owner: Option<Address>,
    pub is_owner: bool,
    pub start: String,
    pub end: String,
    pub started: bool,
    pub unvested: String,
    pub released: String,
    pub releasable: String,
    /// Vesting has started and no release is in flight.
    pub release_enabled: bool,
    /// Only the owner may transfer ownership.
    pub transfer_ownership_enabled: bool,
}


/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub connected: bool,
    pub account: Option<Address>,
    pub network: Option<String>,
    pub chain_id: Option<u64>,
    pub account_url: Option<String>,
    pub mainnet_warning: bool,
    pub vesting_mode: bool,
    pub token: Option<TokenPanel>,
    pub vesting: Option<VestingPanel>,
    pub loading: Vec<String>,
    pub messages: Vec<Message>,
}

impl Dashboard {
    /// Build the dashboard from the current store contents. `now_ms` picks
    /// which messages are still visible.
    pub fn from_store(store: &ObservableStore, messages: &MessageLog, now_ms: u64) -> Self {
        let connected = store.get_as::<bool>(paths::WALLET_CONNECTED).unwrap_or(false);
        let account: Option<Address> = store.get_as(paths::WALLET_ACCOUNT);
        let explorer: Option<String> = store.get_as("wallet.network.blockExplorer");
        let account_url = match (&explorer, account) {
            (Some(explorer), Some(account)) => {
                explorer_url(explorer, LinkKind::Address, &account.to_string())
            }
            _ => None,
        };

        Dashboard {
            connected,
            account,
            network: store.get_as("wallet.network.name"),
            chain_id: store.get_as(paths::WALLET_CHAIN_ID),
            account_url,
            mainnet_warning: mainnet_warning(store),
            vesting_mode: store.get_as::<bool>(paths::VESTING_MODE).unwrap_or(false),
            token: token_panel(store, account),
            vesting: vesting_panel(store, account),
            loading: store.loading_operations(),
            messages: messages.active(now_ms),
        }
    }
}

fn amount(store: &ObservableStore, path: &str) -> Option<U256> {
    store.get_as::<String>(path)?.parse().ok()
}

fn decimals(store: &ObservableStore) -> u8 {
    store.get_as(paths::DECIMALS).unwrap_or(18)
}

fn token_panel(store: &ObservableStore, account: Option<Address>) -> Option<TokenPanel> {
    let symbol: String = store.get_as(paths::SYMBOL)?;
    let decimals = decimals(store);
    let show = |path: &str| {
        amount(store, path)
            .map(|v| format_amount(v, decimals))
            .unwrap_or_else(|| "-".to_string())
    };
    let delegate = store
        .get_as::<Address>(paths::DELEGATES)
        .map(|d| DelegateStatus::classify(d, account))
        .unwrap_or(DelegateStatus::NotSet);

    Some(TokenPanel {
        name: store.get_as(paths::NAME).unwrap_or_default(),
        balance: show(paths::BALANCE),
        total_supply: show(paths::TOTAL_SUPPLY),
        voting_power: show(paths::VOTING_POWER),
        nonce: amount(store, paths::NONCE)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string()),
        delegate,
        symbol,
    })
}

fn vesting_panel(store: &ObservableStore, account: Option<Address>) -> Option<VestingPanel> {
    let address: Address = store.get_as(paths::VESTING_ADDRESS)?;
    let decimals = decimals(store);
    let owner: Option<Address> = store.get_as(paths::VESTING_OWNER);
    let is_owner = owner.is_some() && owner == account;
    let show = |path: &str| {
        amount(store, path)
            .map(|v| format_amount(v, decimals))
            .unwrap_or_else(|| "-".to_string())
    };
    let date = |path: &str| {
        store
            .get_as::<u64>(path)
            .map(datetime_from_seconds)
            .unwrap_or_else(|| "-".to_string())
    };

    let started = store.get_as(paths::VESTING_STARTED).unwrap_or(false);

    Some(VestingPanel {
        address,
        owner,
        is_owner,
        start: date(paths::VESTING_START),
        end: date(paths::VESTING_END),
        started,
        unvested: show(paths::UNVESTED_BALANCE),
        released: show(paths::VESTING_RELEASED),
        releasable: show(paths::VESTING_RELEASABLE),
        release_enabled: started && !store.is_loading(RELEASE_OPERATION),
        transfer_ownership_enabled: is_owner,
    })
}


impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mainnet_warning {
            writeln!(f, "WARNING: the token is not deployed on Arbitrum One yet.")?;
        }
        match (self.connected, self.account) {
            (true, Some(account)) => {
                writeln!(f, "Account:  {}", short_address(&account.to_string(), 4))?
            }
            _ => writeln!(f, "Account:  not connected")?,
        }
        match (&self.network, self.chain_id) {
            (Some(name), Some(id)) => writeln!(f, "Network:  {} ({})", name, id)?,
            (None, Some(id)) => writeln!(f, "Network:  unsupported ({})", id)?,
            _ => writeln!(f, "Network:  -")?,
        }
        if let Some(url) = &self.account_url {
            writeln!(f, "Explorer: {}", url)?;
        }

        if let Some(t) = &self.token {
            writeln!(f)?;
            writeln!(f, "{} ({})", t.name, t.symbol)?;
            writeln!(f, "  Balance:       {} {}", t.balance, t.symbol)?;
            writeln!(f, "  Total supply:  {} {}", t.total_supply, t.symbol)?;
            writeln!(f, "  Voting power:  {}", t.voting_power)?;
            writeln!(f, "  Delegate:      {}", t.delegate)?;
            writeln!(f, "  Nonce:         {}", t.nonce)?;
        }

        if let Some(v) = &self.vesting {
            writeln!(f)?;
            writeln!(f, "Vesting wallet {}", short_address(&v.address.to_string(), 4))?;
            if let Some(owner) = v.owner {
                let you = if v.is_owner { " (you)" } else { "" };
                writeln!(f, "  Owner:       {}{}", short_address(&owner.to_string(), 4), you)?;
            }
            let state = if v.started { "started" } else { "not started" };
            writeln!(f, "  Schedule:    {} to {} ({})", v.start, v.end, state)?;
            writeln!(f, "  Unvested:    {}", v.unvested)?;
            writeln!(f, "  Released:    {}", v.released)?;
            writeln!(f, "  Releasable:  {}", v.releasable)?;
            let release = if v.release_enabled { "available" } else { "unavailable" };
            writeln!(f, "  Release:     {}", release)?;
        }

        if !self.loading.is_empty() {
            writeln!(f)?;
            writeln!(f, "Loading: {}", self.loading.join(", "))?;
        }
        for m in &self.messages {
            writeln!(f, "{}", m.summary())?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::settings::{default_settings, ARBITRUM_SEPOLIA};
    use crate::infrastructure::mock::MockReader;
    use crate::launch::LaunchParams;
    use crate::messages::MessageKind;
    use crate::refresh::tests::{token, vesting};
    use crate::refresh::{refresh_token, refresh_vesting};
    use crate::wallet::WalletSession;
    use serde_json::json;

    fn account() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn connected() -> WalletSession {
        let s = WalletSession::new(ObservableStore::for_app(), default_settings(), LaunchParams::default());
        s.connect(ARBITRUM_SEPOLIA, account(), 0).unwrap();
        s
    }

    #[test]
    fn delegate_classification() {
        let me = account();
        assert_eq!(DelegateStatus::classify(Address::ZERO, Some(me)), DelegateStatus::NotSet);
        assert_eq!(DelegateStatus::classify(me, Some(me)), DelegateStatus::SelfDelegated);
        let other = Address::repeat_byte(0x01);
        assert_eq!(DelegateStatus::classify(other, Some(me)), DelegateStatus::Other(other));
        assert_eq!(DelegateStatus::NotSet.to_string(), "No delegate set");
        assert_eq!(DelegateStatus::SelfDelegated.to_string(), "Self-delegated");
        assert_eq!(DelegateStatus::Other(other).to_string(), "0x0101…0101");
    }

    #[test]
    fn disconnected_dashboard() {
        let store = ObservableStore::for_app();
        let log = MessageLog::new(store.clone(), 8000);
        let d = Dashboard::from_store(&store, &log, 0);
        assert!(!d.connected);
        assert!(d.token.is_none());
        assert!(d.vesting.is_none());
        assert!(d.to_string().contains("not connected"));
    }

    #[test]
    fn token_panel_after_refresh() {
        let s = connected();
        let mut snap = token();
        snap.decimals = 0;
        snap.delegates = account();
        refresh_token(s.store(), &MockReader::with_token(snap)).unwrap();

        let d = Dashboard::from_store(s.store(), &s.messages(), 0);
        let t = d.token.as_ref().unwrap();
        assert_eq!(t.balance, "1,500");
        assert_eq!(t.total_supply, "1,000,000");
        assert_eq!(t.nonce, "2");
        assert_eq!(t.delegate, DelegateStatus::SelfDelegated);
        assert_eq!(d.network.as_deref(), Some("Arbitrum Sepolia"));
        assert_eq!(
            d.account_url,
            Some(format!("https://sepolia.arbiscan.io/address/{}", account()))
        );

        let text = d.to_string();
        assert!(text.contains("Tracer (TRCR)"));
        assert!(text.contains("Self-delegated"));
        assert!(text.contains("Successfully connected"));
    }

    #[test]
    fn vesting_panel_for_owner() {
        let s = connected();
        s.store().set(paths::VESTING_ADDRESS, json!(Address::repeat_byte(0x22))).unwrap();
        let mut reader = MockReader::new();
        reader.vesting = Some(vesting());
        refresh_vesting(s.store(), &reader, 1_500).unwrap();

        let d = Dashboard::from_store(s.store(), &s.messages(), 0);
        let v = d.vesting.unwrap();
        assert!(v.is_owner);
        assert!(v.started);
        assert!(v.release_enabled);
        assert!(v.transfer_ownership_enabled);
        assert_eq!(v.start, "1970-01-01 00:16 UTC");

        s.store().set_loading(RELEASE_OPERATION, true).unwrap();
        let d = Dashboard::from_store(s.store(), &s.messages(), 0);
        assert!(!d.vesting.unwrap().release_enabled);
    }

    #[test]
    fn non_owner_cannot_transfer_ownership() {
        let s = connected();
        s.store().set(paths::VESTING_ADDRESS, json!(Address::repeat_byte(0x22))).unwrap();
        let mut v = vesting();
        v.owner = Address::repeat_byte(0x99);
        let mut reader = MockReader::new();
        reader.vesting = Some(v);
        refresh_vesting(s.store(), &reader, 1_500).unwrap();
        let d = Dashboard::from_store(s.store(), &s.messages(), 0);
        let v = d.vesting.unwrap();
        assert!(!v.is_owner);
        assert!(!v.transfer_ownership_enabled);
        assert!(v.release_enabled);
    }

    #[test]
    fn release_disabled_before_start() {
        let s = connected();
        s.store().set(paths::VESTING_ADDRESS, json!(Address::repeat_byte(0x22))).unwrap();
        let mut reader = MockReader::new();
        reader.vesting = Some(vesting());
        refresh_vesting(s.store(), &reader, 10).unwrap();
        let d = Dashboard::from_store(s.store(), &s.messages(), 0);
        let v = d.vesting.as_ref().unwrap();
        assert!(!v.started);
        assert!(!v.release_enabled);
        assert!(d.to_string().contains("not started"));
    }

    #[test]
    fn expired_messages_are_hidden() {
        let s = connected();
        s.messages().push(MessageKind::Info, "later", 5_000).unwrap();
        let d = Dashboard::from_store(s.store(), &s.messages(), 9_000);
        assert_eq!(d.messages.len(), 1);
        assert_eq!(d.messages[0].text, "later");
    }

    #[test]
    fn loading_listed() {
        let s = connected();
        s.store().set_loading("transfer", true).unwrap();
        let d = Dashboard::from_store(s.store(), &s.messages(), 0);
        assert_eq!(d.loading, vec!["transfer".to_string()]);
        assert!(d.to_string().contains("Loading: transfer"));
    }
}
