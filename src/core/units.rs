//! Smallest-unit amounts <-> human-readable decimal strings.
//!
//! Balances come back from the provider as integer quantities in the chain's
//! smallest unit (drip / wei). The UI wants `"1.5"`, transfers are entered as
//! `"0.1"`.

use alloy_primitives::U256;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount overflows 256 bits")]
    Overflow,
}

/// Currency formatting strategy for one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Units {
    pub decimals: u8,
}

impl Default for Units {
    fn default() -> Self { Self { decimals: 18 } }
}

impl Units {
    pub fn new(decimals: u8) -> Self { Self { decimals } }
    pub fn format(&self, amount: U256) -> String { format_units(amount, self.decimals) }
    pub fn parse(&self, amount: &str) -> Result<U256, UnitsError> { parse_units(amount, self.decimals) }
}

fn scale(decimals: u8) -> Option<U256> {
    (0..decimals).try_fold(U256::from(1u8), |acc, _| acc.checked_mul(U256::from(10u8)))
}

/// Format without trailing fractional zeros: `1500000000000000000` @18 -> `"1.5"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let Some(base) = scale(decimals) else { return amount.to_string() };
    let whole = amount / base;
    let frac = amount % base;
    if frac.is_zero() {
        return whole.to_string();
    }
    let padded = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

/// Parse a decimal string into the smallest unit. Extra fractional digits round half-up.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }
    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Invalid(amount.into()));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitsError::Invalid(amount.into()));
    }

    let width = decimals as usize;
    let (kept, round_up) = if frac.len() > width {
        (&frac[..width], frac.as_bytes()[width] >= b'5')
    } else {
        (frac, false)
    };

    let mut digits = String::with_capacity(whole.len() + width);
    digits.push_str(whole);
    digits.push_str(kept);
    digits.extend(std::iter::repeat('0').take(width - kept.len()));

    let value = if digits.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&digits, 10).map_err(|_| UnitsError::Overflow)?
    };
    if round_up {
        value.checked_add(U256::from(1u8)).ok_or(UnitsError::Overflow)
    } else {
        Ok(value)
    }
}

/// JSON-RPC quantity: `"0x1a"`, `"26"` or `26`.
pub fn parse_quantity(value: &Value) -> Option<U256> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                if hex.is_empty() { return None; }
                U256::from_str_radix(hex, 16).ok()
            } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                U256::from_str_radix(s, 10).ok()
            } else {
                None
            }
        }
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    }
}

pub fn parse_u64_quantity(value: &Value) -> Option<u64> {
    let v = parse_quantity(value)?;
    if v > U256::from(u64::MAX) { None } else { Some(v.as_limbs()[0]) }
}

pub fn to_hex_quantity(value: U256) -> String { format!("0x{:x}", value) }
