//! # Omniverse NFT Payload
//!
//! The cross-chain operation record (ERC-6358 numbering) that a mint would
//! carry. The simulator only builds and prints it; nothing here touches the
//! network.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::cadence::CadenceValue;
use crate::config::{NFT_CONTRACT_NAME, NFT_PAYLOAD_STRUCT};
use crate::crypto::PublicKey;
use crate::identity::FlowAddress;

/// Errors building a payload from script output.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("mint metadata has no `{0}` field")]
    MissingField(&'static str),

    #[error("mint metadata field `{field}` is not an unsigned integer (got {found})")]
    NotAnInteger { field: &'static str, found: String },

    #[error("ex_data is not valid hex: {0}")]
    ExData(#[from] hex::FromHexError),
}

/// Operation tag of an Omniverse transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpType {
    Transfer = 0,
    Mint = 1,
    Burn = 2,
}

impl OpType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpType::Transfer => "transfer",
            OpType::Mint => "mint",
            OpType::Burn => "burn",
        };
        f.write_str(name)
    }
}

/// What `scripts/getNFTTxMeta.cdc` reports about a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintMetadata {
    /// Id the next minted NFT will receive.
    pub next_nft_id: u128,
}

impl MintMetadata {
    const NEXT_NFT_ID: &'static str = "nextNFTId";

    /// Read the metadata out of a script result. Accepts a struct with a
    /// `nextNFTId` field or a `{String: ...}` dictionary keyed the same way.
    pub fn from_value(value: &CadenceValue) -> Result<Self, PayloadError> {
        let field = value
            .field(Self::NEXT_NFT_ID)
            .or_else(|| dictionary_entry(value, Self::NEXT_NFT_ID))
            .ok_or(PayloadError::MissingField(Self::NEXT_NFT_ID))?;

        let next_nft_id = field.as_u128().ok_or_else(|| PayloadError::NotAnInteger {
            field: Self::NEXT_NFT_ID,
            found: field.type_name().to_string(),
        })?;
        Ok(Self { next_nft_id })
    }
}

fn dictionary_entry<'a>(value: &'a CadenceValue, key: &str) -> Option<&'a CadenceValue> {
    match value {
        CadenceValue::Dictionary(entries) => entries
            .iter()
            .find(|(k, _)| matches!(k, CadenceValue::String(s) if s == key))
            .map(|(_, v)| v),
        CadenceValue::Optional(Some(inner)) => dictionary_entry(inner, key),
        _ => None,
    }
}

/// One Omniverse NFT operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniverseNftPayload {
    pub op: OpType,
    /// Hex of the operation's extra data. For a mint, the recipient's raw
    /// public key.
    pub ex_data: String,
    pub token_id: u128,
    /// Label of the chain the operation originates on.
    pub chain: String,
}

impl OmniverseNftPayload {
    /// A mint of the next NFT id to `recipient`.
    pub fn mint(recipient: &PublicKey, metadata: &MintMetadata, chain: impl Into<String>) -> Self {
        Self {
            op: OpType::Mint,
            ex_data: recipient.raw_hex(),
            token_id: metadata.next_nft_id,
            chain: chain.into(),
        }
    }

    /// Fully-qualified struct type id. With a known contract address this is
    /// `A.<address>.OmniverseNFT.OmniverseNFTPayload`.
    pub fn type_id(contract: Option<FlowAddress>) -> String {
        match contract {
            Some(address) => format!(
                "A.{}.{NFT_CONTRACT_NAME}.{NFT_PAYLOAD_STRUCT}",
                address.to_hex()
            ),
            None => format!("{NFT_CONTRACT_NAME}.{NFT_PAYLOAD_STRUCT}"),
        }
    }

    /// The payload as a Cadence struct argument.
    pub fn to_cadence(&self, contract: Option<FlowAddress>) -> Result<CadenceValue, PayloadError> {
        let ex_data = hex::decode(&self.ex_data)?;
        Ok(CadenceValue::structure(
            Self::type_id(contract),
            vec![
                ("operation".to_string(), CadenceValue::UInt8(self.op.code())),
                ("exData".to_string(), CadenceValue::byte_array(&ex_data)),
                ("tokenId".to_string(), CadenceValue::UInt128(self.token_id)),
                ("chain".to_string(), CadenceValue::String(self.chain.clone())),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AccountRegistry, RegistryConfig, OWNER};

    fn owner_key() -> PublicKey {
        let registry = AccountRegistry::new(RegistryConfig::emulator()).unwrap();
        registry.lookup(OWNER).unwrap().public_key()
    }

    #[test]
    fn op_codes_follow_erc6358() {
        assert_eq!(OpType::Transfer.code(), 0);
        assert_eq!(OpType::Mint.code(), 1);
        assert_eq!(OpType::Burn.code(), 2);
    }

    #[test]
    fn metadata_from_struct_and_dictionary() {
        let from_struct = CadenceValue::structure(
            "A.f8d6e0586b0a20c7.OmniverseNFT.NFTTxMeta",
            vec![("nextNFTId".into(), CadenceValue::UInt128(7))],
        );
        assert_eq!(MintMetadata::from_value(&from_struct).unwrap().next_nft_id, 7);

        let from_dict = CadenceValue::Dictionary(vec![(
            CadenceValue::String("nextNFTId".into()),
            CadenceValue::UInt64(3),
        )]);
        assert_eq!(MintMetadata::from_value(&from_dict).unwrap().next_nft_id, 3);
    }

    #[test]
    fn metadata_without_next_id_is_rejected() {
        let err = MintMetadata::from_value(&CadenceValue::Void).unwrap_err();
        assert!(matches!(err, PayloadError::MissingField("nextNFTId")));

        let wrong = CadenceValue::structure(
            "T",
            vec![("nextNFTId".into(), CadenceValue::String("x".into()))],
        );
        assert!(matches!(
            MintMetadata::from_value(&wrong),
            Err(PayloadError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn mint_payload_carries_raw_key_and_next_id() {
        let key = owner_key();
        let payload =
            OmniverseNftPayload::mint(&key, &MintMetadata { next_nft_id: 42 }, "flowEmulator");
        assert_eq!(payload.op, OpType::Mint);
        assert_eq!(payload.ex_data.len(), 128);
        assert_eq!(payload.ex_data, key.raw_hex());
        assert_eq!(payload.token_id, 42);
        assert_eq!(payload.chain, "flowEmulator");
    }

    #[test]
    fn cadence_struct_shape() {
        let key = owner_key();
        let payload = OmniverseNftPayload::mint(&key, &MintMetadata { next_nft_id: 1 }, "flowTest");
        let address: FlowAddress = "0xf8d6e0586b0a20c7".parse().unwrap();
        let value = payload.to_cadence(Some(address)).unwrap();

        let json = value.to_json();
        assert_eq!(json["type"], "Struct");
        assert_eq!(
            json["value"]["id"],
            "A.f8d6e0586b0a20c7.OmniverseNFT.OmniverseNFTPayload"
        );
        assert_eq!(value.field("operation"), Some(&CadenceValue::UInt8(1)));
        assert_eq!(value.field("tokenId"), Some(&CadenceValue::UInt128(1)));
        match value.field("exData") {
            Some(CadenceValue::Array(bytes)) => assert_eq!(bytes.len(), 64),
            other => panic!("unexpected exData {other:?}"),
        }
    }

    #[test]
    fn type_id_without_contract_address() {
        assert_eq!(
            OmniverseNftPayload::type_id(None),
            "OmniverseNFT.OmniverseNFTPayload"
        );
    }
}
