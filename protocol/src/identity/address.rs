//! Flow account addresses.
//!
//! A Flow address is 8 bytes, conventionally written as `0x` followed by 16
//! lowercase hex digits. The REST API omits the prefix; Cadence and fcl keep
//! it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;

/// Errors from parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is not hex: {0}")]
    NotHex(String),

    #[error("address must be {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// An 8-byte Flow account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlowAddress([u8; ADDRESS_LENGTH]);

impl FlowAddress {
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Sixteen hex digits, no `0x` prefix. This is the REST API form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for FlowAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| AddressError::NotHex(s.to_string()))?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::WrongLength {
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl TryFrom<String> for FlowAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FlowAddress> for String {
    fn from(address: FlowAddress) -> Self {
        address.to_string()
    }
}

impl fmt::Display for FlowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for FlowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowAddress(0x{})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_prefix() {
        let a: FlowAddress = "0xf8d6e0586b0a20c7".parse().unwrap();
        let b: FlowAddress = "f8d6e0586b0a20c7".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0xf8d6e0586b0a20c7");
        assert_eq!(a.to_hex(), "f8d6e0586b0a20c7");
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            "0x01cf0e2f".parse::<FlowAddress>(),
            Err(AddressError::WrongLength { expected: 8, got: 4 })
        );
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(
            "0xzzzzzzzzzzzzzzzz".parse::<FlowAddress>(),
            Err(AddressError::NotHex(_))
        ));
    }

    #[test]
    fn serde_uses_prefixed_string() {
        let a: FlowAddress = "0x179b6b1cb6755e31".parse().unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"0x179b6b1cb6755e31\"");
        let back: FlowAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
