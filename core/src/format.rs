//! Display formatting for token amounts, addresses, dates and explorer
//! links.
//!
//! Amounts are exact `U256` values; formatting rounds to at most three
//! fraction digits and groups thousands with commas. Dates are rendered and
//! parsed in UTC.

use std::fmt;

use alloy_primitives::utils::{ParseUnits, Unit};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use thiserror::Error;

/// Fraction digits kept by [`format_amount`].
pub const DISPLAY_DECIMALS: u8 = 3;

/// Layout of a `datetime-local` input value.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("unsupported token decimals {0}")]
    UnsupportedDecimals(u8),
    #[error("invalid datetime '{0}'")]
    InvalidDatetime(String),
}


// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Format a raw token amount for display: `1234567.891` with `decimals` 0
/// becomes `1,234,567`, `1500` tokens with 18 decimals becomes `1,500`.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    let ten = U256::from(10u8);
    let thousandths = if decimals >= DISPLAY_DECIMALS {
        let divisor = ten.pow(U256::from(decimals - DISPLAY_DECIMALS));
        let (q, r) = amount.div_rem(divisor);
        if r.saturating_mul(U256::from(2u8)) >= divisor {
            q.saturating_add(U256::from(1u8))
        } else {
            q
        }
    } else {
        amount.saturating_mul(ten.pow(U256::from(DISPLAY_DECIMALS - decimals)))
    };

    let (int_part, frac_part) = thousandths.div_rem(U256::from(1000u16));
    let mut out = group_thousands(&int_part.to_string());
    let frac = u64::try_from(frac_part).unwrap_or(0);
    if frac != 0 {
        let digits = format!("{:03}", frac);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Exact decimal representation of a raw amount, without trailing zeros.
pub fn format_exact(amount: U256, decimals: u8) -> Result<String, FormatError> {
    let unit = Unit::new(decimals).ok_or(FormatError::UnsupportedDecimals(decimals))?;
    let mut formatted = ParseUnits::U256(amount).format_units(unit);
    if formatted.contains('.') {
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(trimmed);
    }
    Ok(formatted)
}

/// Parse a user-entered amount into raw units. Empty, zero and negative
/// amounts are rejected.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, FormatError> {
    let unit = Unit::new(decimals).ok_or(FormatError::UnsupportedDecimals(decimals))?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FormatError::InvalidAmount(input.to_string()));
    }
    match ParseUnits::parse_units(trimmed, unit) {
        Ok(ParseUnits::U256(value)) if !value.is_zero() => Ok(value),
        _ => Err(FormatError::InvalidAmount(input.to_string())),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}


// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// True for `0x`-prefixed 20-byte hex addresses.
pub fn is_address(input: &str) -> bool {
    input.len() == 42 && input.starts_with("0x") && input.parse::<Address>().is_ok()
}

/// `0x1234…abcd` with `n` hex digits on each side.
pub fn short_address(addr: &str, n: usize) -> String {
    if addr.is_empty() {
        return String::new();
    }
    if !addr.is_ascii() || addr.len() <= 2 + 2 * n {
        return addr.to_string();
    }
    format!("{}…{}", &addr[..2 + n], &addr[addr.len() - n..])
}

/// `0x1234...abcd`, keeping `start` leading and `end` trailing characters.
pub fn truncate_address(addr: &str, start: usize, end: usize) -> String {
    if !addr.is_ascii() || addr.len() <= start + end {
        return addr.to_string();
    }
    format!("{}...{}", &addr[..start], &addr[addr.len() - end..])
}


// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Value for a `datetime-local` input `minutes` after `now`.
pub fn deadline_input(now: DateTime<Utc>, minutes: i64) -> String {
    (now + Duration::minutes(minutes))
        .format(DEADLINE_FORMAT)
        .to_string()
}

/// Seconds since the epoch for a `datetime-local` value (UTC) or an
/// RFC 3339 timestamp.
pub fn seconds_from_input(input: &str) -> Result<u64, FormatError> {
    let trimmed = input.trim();
    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, DEADLINE_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
                .map(|naive| naive.and_utc())
        })
        .map_err(|_| FormatError::InvalidDatetime(input.to_string()))?;
    u64::try_from(parsed.timestamp()).map_err(|_| FormatError::InvalidDatetime(input.to_string()))
}

/// Human-readable UTC date for an epoch timestamp in seconds.
pub fn datetime_from_seconds(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "invalid date".to_string())
}


// ---------------------------------------------------------------------------
// Explorer links
// ---------------------------------------------------------------------------

/// What an explorer link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Tx,
    Address,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Tx => "tx",
            LinkKind::Address => "address",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explorer URL for a transaction hash or address, or `None` when either
/// the explorer or the value is missing.
pub fn explorer_url(explorer: &str, kind: LinkKind, value: &str) -> Option<String> {
    if explorer.is_empty() || value.is_empty() {
        return None;
    }
    let base = if explorer.ends_with('/') {
        url::Url::parse(explorer)
    } else {
        url::Url::parse(&format!("{}/", explorer))
    }
    .ok()?;
    base.join(&format!("{}/{}", kind, value)).ok().map(String::from)
}
