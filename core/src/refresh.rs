//! Contract reads into the `data` namespace.
//!
//! Each refresh is guarded by a loading flag (`refresh` for the token,
//! `vesting` for the vesting wallet). A refresh already in flight makes a
//! second call a no-op, and the flag is cleared on every exit path.
//! Amounts are stored as decimal strings so they survive JSON untouched.
//! [`refresh_data`] runs both and reports the outcome in the message log.

use alloy_primitives::Address;
use serde_json::json;
use thiserror::Error;

use crate::infrastructure::{ChainReader, ReadError};
use crate::messages::MessageKind;
use crate::state::{paths, ObservableStore, StateError};
use crate::types::snapshot::{TokenSnapshot, VestingSnapshot};
use crate::wallet::WalletSession;

pub const REFRESHED_MESSAGE: &str = "Data refreshed successfully!";

/// Loading flag held while token data is refreshed.
pub const REFRESH_FLAG: &str = "refresh";
/// Loading flag held while vesting data is refreshed.
pub const VESTING_FLAG: &str = "vesting";

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    State(#[from] StateError),
}

/// Re-read token data for the connected account. Returns false when
/// nothing was read (not connected, no token, or a refresh in flight).
pub fn refresh_token(store: &ObservableStore, reader: &dyn ChainReader) -> Result<bool, RefreshError> {
    if store.get_as::<bool>(paths::WALLET_CONNECTED) != Some(true) {
        return Ok(false);
    }
    let (Some(account), Some(token)) = (
        store.get_as::<Address>(paths::WALLET_ACCOUNT),
        store.get_as::<Address>(paths::TOKEN_ADDRESS),
    ) else {
        tracing::debug!("token refresh skipped: no account or token address");
        return Ok(false);
    };

    with_flag(store, REFRESH_FLAG, || {
        let snap = reader.token_snapshot(token, account)?;
        write_token(store, &snap)?;
        tracing::debug!(%token, %account, symbol = %snap.symbol, "token data refreshed");
        Ok(())
    })
}

/// Re-read the vesting wallet named by `contracts.vestingAddress`.
/// `now` (seconds) decides `data.vestingStarted`.
pub fn refresh_vesting(
    store: &ObservableStore,
    reader: &dyn ChainReader,
    now: u64,
) -> Result<bool, RefreshError> {
    let Some(vesting) = store.get_as::<Address>(paths::VESTING_ADDRESS) else {
        return Ok(false);
    };

    with_flag(store, VESTING_FLAG, || {
        let snap = reader.vesting_snapshot(vesting)?;
        write_vesting(store, &snap, now)?;
        tracing::debug!(%vesting, owner = %snap.owner, "vesting data refreshed");
        Ok(())
    })
}

/// Refresh token and vesting data on user request. A refresh that read
/// something pushes a success message; a failed one pushes
/// `Failed to refresh data: ..` and returns the error.
pub fn refresh_data(
    session: &WalletSession,
    reader: &dyn ChainReader,
    now_ms: u64,
) -> Result<bool, RefreshError> {
    let store = session.store();
    let result = refresh_token(store, reader).and_then(|token| {
        refresh_vesting(store, reader, now_ms / 1000).map(|vesting| token || vesting)
    });
    let messages = session.messages();
    match &result {
        Ok(true) => {
            messages.push(MessageKind::Success, REFRESHED_MESSAGE, now_ms)?;
        }
        Ok(false) => {}
        Err(e) => {
            messages.push(
                MessageKind::Error,
                &format!("Failed to refresh data: {}", e),
                now_ms,
            )?;
        }
    }
    result
}

fn with_flag<F>(store: &ObservableStore, flag: &str, body: F) -> Result<bool, RefreshError>
where
    F: FnOnce() -> Result<(), RefreshError>,
{
    if store.is_loading(flag) {
        tracing::debug!(flag, "refresh already in progress");
        return Ok(false);
    }
    store.set_loading(flag, true)?;
    let result = body();
    store.set_loading(flag, false)?;
    if let Err(e) = &result {
        tracing::warn!(flag, error = %e, "refresh failed");
    }
    result.map(|()| true)
}

fn write_token(store: &ObservableStore, snap: &TokenSnapshot) -> Result<(), StateError> {
    store.set(paths::NAME, json!(snap.name))?;
    store.set(paths::SYMBOL, json!(snap.symbol))?;
    store.set(paths::DECIMALS, json!(snap.decimals))?;
    store.set(paths::TOTAL_SUPPLY, json!(snap.total_supply.to_string()))?;
    store.set(paths::BALANCE, json!(snap.balance.to_string()))?;
    store.set(paths::VOTING_POWER, json!(snap.voting_power.to_string()))?;
    store.set(paths::NONCE, json!(snap.nonce.to_string()))?;
    store.set(paths::DELEGATES, json!(snap.delegates))
}

fn write_vesting(store: &ObservableStore, snap: &VestingSnapshot, now: u64) -> Result<(), StateError> {
    store.set(paths::VESTING_OWNER, json!(snap.owner))?;
    store.set(paths::VESTING_START, json!(snap.start))?;
    store.set(paths::VESTING_END, json!(snap.end))?;
    store.set(paths::VESTING_RELEASED, json!(snap.released.to_string()))?;
    store.set(paths::VESTING_RELEASABLE, json!(snap.releasable.to_string()))?;
    store.set(paths::UNVESTED_BALANCE, json!(snap.unvested.to_string()))?;
    store.set(paths::VESTING_STARTED, json!(snap.started_at(now)))
}


#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::settings::default_settings;
    use crate::infrastructure::mock::{MockRead, MockReader};
    use crate::launch::LaunchParams;
    use alloy_primitives::U256;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) fn token() -> TokenSnapshot {
        TokenSnapshot {
            name: "Tracer".into(),
            symbol: "TRCR".into(),
            decimals: 18,
            total_supply: U256::from(1_000_000u64),
            balance: U256::from(1_500u64),
            voting_power: U256::ZERO,
            nonce: U256::from(2u64),
            delegates: Address::ZERO,
        }
    }

    pub(crate) fn vesting() -> VestingSnapshot {
        VestingSnapshot {
            owner: Address::repeat_byte(0xaa),
            start: 1_000,
            end: 2_000,
            released: U256::from(10u64),
            releasable: U256::from(5u64),
            unvested: U256::from(85u64),
        }
    }

    fn connected_store() -> ObservableStore {
        let store = ObservableStore::for_app();
        store.set(paths::WALLET_CONNECTED, json!(true)).unwrap();
        store.set(paths::WALLET_ACCOUNT, json!(Address::repeat_byte(0xaa))).unwrap();
        store.set(paths::TOKEN_ADDRESS, json!(Address::repeat_byte(0x11))).unwrap();
        store
    }

    #[test]
    fn token_refresh_writes_data() {
        let store = connected_store();
        let reader = MockReader::with_token(token());
        assert!(refresh_token(&store, &reader).unwrap());
        assert_eq!(store.get("data.symbol"), Some(json!("TRCR")));
        assert_eq!(store.get("data.decimals"), Some(json!(18)));
        assert_eq!(store.get("data.balance"), Some(json!("1500")));
        assert_eq!(store.get("data.nonce"), Some(json!("2")));
        assert_eq!(store.get_as::<Address>("data.delegates"), Some(Address::ZERO));
        assert_eq!(
            reader.reads(),
            vec![MockRead::Token {
                token: Address::repeat_byte(0x11),
                account: Address::repeat_byte(0xaa),
            }]
        );
        assert!(!store.is_loading(REFRESH_FLAG));
    }

    #[test]
    fn token_refresh_skipped_when_disconnected() {
        let store = ObservableStore::for_app();
        let reader = MockReader::with_token(token());
        assert!(!refresh_token(&store, &reader).unwrap());
        assert!(reader.reads().is_empty());
    }

    #[test]
    fn flag_is_set_during_read_and_cleared_after() {
        let store = connected_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = store
            .subscribe("ui.loading", move |v, _| s.borrow_mut().push(v.clone()))
            .unwrap();
        refresh_token(&store, &MockReader::with_token(token())).unwrap();
        assert_eq!(*seen.borrow(), vec![json!(["refresh"]), json!([])]);
    }

    #[test]
    fn failed_read_clears_flag() {
        let store = connected_store();
        let mut reader = MockReader::with_token(token());
        reader.fail_with = Some("rpc down".into());
        assert!(matches!(refresh_token(&store, &reader), Err(RefreshError::Read(_))));
        assert!(!store.is_loading(REFRESH_FLAG));
        assert_eq!(store.get("data.balance"), Some(Value::Null));
    }

    #[test]
    fn refresh_in_flight_is_noop() {
        let store = connected_store();
        store.set_loading(REFRESH_FLAG, true).unwrap();
        let reader = MockReader::with_token(token());
        assert!(!refresh_token(&store, &reader).unwrap());
        assert!(reader.reads().is_empty());
        assert!(store.is_loading(REFRESH_FLAG));
    }

    #[test]
    fn vesting_refresh_writes_data() {
        let store = ObservableStore::for_app();
        store.set(paths::VESTING_ADDRESS, json!(Address::repeat_byte(0x22))).unwrap();
        let mut reader = MockReader::new();
        reader.vesting = Some(vesting());
        assert!(refresh_vesting(&store, &reader, 1_500).unwrap());
        assert_eq!(
            store.get_as::<Address>("contracts.vestingOwner"),
            Some(Address::repeat_byte(0xaa))
        );
        assert_eq!(store.get("data.vestingStart"), Some(json!(1000)));
        assert_eq!(store.get("data.unvestedBalance"), Some(json!("85")));
        assert_eq!(store.get("data.vestingStarted"), Some(json!(true)));
        assert!(!store.is_loading(VESTING_FLAG));
    }

    #[test]
    fn vesting_not_started_yet() {
        let store = ObservableStore::for_app();
        store.set(paths::VESTING_ADDRESS, json!(Address::repeat_byte(0x22))).unwrap();
        let mut reader = MockReader::new();
        reader.vesting = Some(vesting());
        refresh_vesting(&store, &reader, 999).unwrap();
        assert_eq!(store.get("data.vestingStarted"), Some(json!(false)));
    }

    #[test]
    fn vesting_refresh_without_address_is_noop() {
        let store = ObservableStore::for_app();
        assert!(!refresh_vesting(&store, &MockReader::new(), 0).unwrap());
    }

    fn session() -> WalletSession {
        WalletSession::new(connected_store(), default_settings(), LaunchParams::default())
    }

    #[test]
    fn refresh_data_reports_success() {
        let s = session();
        assert!(refresh_data(&s, &MockReader::with_token(token()), 0).unwrap());
        let msgs = s.messages().active(0);
        assert_eq!(msgs[0].kind, MessageKind::Success);
        assert_eq!(msgs[0].text, REFRESHED_MESSAGE);
    }

    #[test]
    fn refresh_data_reports_failure() {
        let s = session();
        let mut reader = MockReader::with_token(token());
        reader.fail_with = Some("rpc down".into());
        assert!(refresh_data(&s, &reader, 0).is_err());
        let msgs = s.messages().active(0);
        assert_eq!(msgs[0].kind, MessageKind::Error);
        assert_eq!(msgs[0].text, "Failed to refresh data: rpc down");
    }

    #[test]
    fn refresh_data_silent_when_nothing_read() {
        let s = WalletSession::new(ObservableStore::for_app(), default_settings(), LaunchParams::default());
        assert!(!refresh_data(&s, &MockReader::new(), 0).unwrap());
        assert!(s.messages().all().is_empty());
    }
}
