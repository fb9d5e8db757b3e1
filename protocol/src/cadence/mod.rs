//! # Cadence Typed Arguments
//!
//! The typed values the simulator passes to transactions and scripts, and
//! the values scripts hand back. See [`value`] for the JSON-Cadence wire
//! mapping and [`ufix64`] for the fixed-point type used by the lock period.

pub mod ufix64;
pub mod value;

pub use ufix64::UFix64;
pub use value::{CadenceValue, CompositeKind};

use serde_json::Value;
use thiserror::Error;

/// Errors from building, encoding or decoding Cadence values.
#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed JSON-Cadence: {0}")]
    Malformed(String),

    #[error("unsupported Cadence type: {0}")]
    UnsupportedType(String),

    #[error("invalid UFix64 literal: {0:?}")]
    InvalidUFix64(String),

    #[error("invalid member table: {0}")]
    InvalidMembers(String),
}

/// Parse a member-chain table into a `{UInt32: String}` dictionary.
///
/// Accepts the fcl argument form
/// `[{"key": 1, "value": "ethereum"}, ...]` as well as a plain object
/// `{"1": "ethereum", ...}`. Keys may be JSON numbers or numeric strings.
pub fn parse_members(json: &str) -> Result<CadenceValue, CadenceError> {
    let parsed: Value = serde_json::from_str(json)?;

    let entries: Vec<(&Value, &Value)> = match &parsed {
        Value::Array(items) => items
            .iter()
            .map(|item| match (item.get("key"), item.get("value")) {
                (Some(k), Some(v)) => Ok((k, v)),
                _ => Err(CadenceError::InvalidMembers(
                    "each entry needs a key and a value".into(),
                )),
            })
            .collect::<Result<_, _>>()?,
        Value::Object(map) => {
            return map
                .iter()
                .map(|(k, v)| member_entry(&Value::String(k.clone()), v))
                .collect::<Result<Vec<_>, _>>()
                .map(CadenceValue::Dictionary);
        }
        _ => {
            return Err(CadenceError::InvalidMembers(
                "expected an array of key/value pairs or an object".into(),
            ))
        }
    };

    entries
        .into_iter()
        .map(|(k, v)| member_entry(k, v))
        .collect::<Result<Vec<_>, _>>()
        .map(CadenceValue::Dictionary)
}

fn member_entry(key: &Value, value: &Value) -> Result<(CadenceValue, CadenceValue), CadenceError> {
    let id: u32 = match key {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| CadenceError::InvalidMembers(format!("member id {n} is not a UInt32")))?,
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| CadenceError::InvalidMembers(format!("member id {s:?} is not a UInt32")))?,
        other => {
            return Err(CadenceError::InvalidMembers(format!(
                "member id {other} is not a UInt32"
            )))
        }
    };
    let chain = value
        .as_str()
        .ok_or_else(|| CadenceError::InvalidMembers(format!("chain name for {id} must be a string")))?;
    Ok((CadenceValue::UInt32(id), CadenceValue::String(chain.to_string())))
}
