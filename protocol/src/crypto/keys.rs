//! # Key Management
//!
//! secp256k1 private keys for the simulated identities, public key derivation,
//! and the ECDSA signatures Flow expects on transaction envelopes.
//!
//! Public keys are rendered in SEC1 uncompressed form: a `04` format byte
//! followed by the raw X and Y coordinates. Omniverse payloads carry the raw
//! coordinates only, so [`PublicKey::raw_hex`] strips the format byte.
//!
//! Key bytes are never logged, and `Debug` on [`PrivateKey`] prints the public
//! half only.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::HashAlgorithm;
use crate::config::{PRIVATE_KEY_LENGTH, SIGNATURE_LENGTH, UNCOMPRESSED_PUBLIC_KEY_LENGTH};

/// Errors that can occur during key operations.
///
/// Messages never echo key material back.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key: {0}")]
    InvalidKey(&'static str),

    #[error("invalid public key encoding")]
    InvalidPublicKey,

    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHash(String),

    #[error("signing failed")]
    Signing,
}

/// Named elliptic curve an identity's key lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// The Koblitz curve used by Bitcoin, Ethereum and Flow's
    /// `ECDSA_secp256k1` account keys.
    #[serde(rename = "secp256k1", alias = "ECDSA_secp256k1")]
    Secp256k1,
}

impl Curve {
    /// Name as it appears in Flow account key listings.
    pub fn flow_name(&self) -> &'static str {
        match self {
            Curve::Secp256k1 => "ECDSA_secp256k1",
        }
    }
}

impl Default for Curve {
    fn default() -> Self {
        Curve::Secp256k1
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Secp256k1 => f.write_str("secp256k1"),
        }
    }
}

impl FromStr for Curve {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secp256k1" | "ecdsa_secp256k1" => Ok(Curve::Secp256k1),
            _ => Err(KeyError::UnsupportedCurve(s.to_string())),
        }
    }
}

/// A private signing key on a named curve.
#[derive(Clone)]
pub struct PrivateKey {
    curve: Curve,
    signing_key: SigningKey,
}

/// The public half of an identity key, in SEC1 uncompressed form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: [u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH],
}

impl PrivateKey {
    /// Parse a hex-encoded scalar (optionally `0x`-prefixed) for `curve`.
    ///
    /// Fails when the text is not hex, is not exactly 32 bytes, or encodes
    /// zero or a value at or above the curve order.
    pub fn from_hex(curve: Curve, private_key_hex: &str) -> Result<Self, KeyError> {
        let trimmed = private_key_hex.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| KeyError::InvalidKey("not hex"))?;
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(KeyError::InvalidKey("wrong length"));
        }
        let signing_key = match curve {
            Curve::Secp256k1 => SigningKey::from_slice(&bytes)
                .map_err(|_| KeyError::InvalidKey("scalar out of range"))?,
        };
        Ok(Self { curve, signing_key })
    }

    /// Curve this key belongs to.
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let mut bytes = [0u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(point.as_bytes());
        PublicKey { bytes }
    }

    /// Hash `message` with `hash` and sign the digest.
    ///
    /// Returns the 64-byte `r || s` encoding Flow expects in envelope
    /// signatures.
    pub fn sign(
        &self,
        hash: HashAlgorithm,
        message: &[u8],
    ) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
        let digest = hash.digest(message);
        let signature: Signature = self
            .signing_key
            .sign_prehash(&digest)
            .map_err(|_| KeyError::Signing)?;
        let mut out = [0u8; SIGNATURE_LENGTH];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, pub={})", self.curve, &self.public_key().raw_hex()[..16])
    }
}

impl PublicKey {
    /// Parse a SEC1 uncompressed encoding (65 bytes, `04` prefix).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != UNCOMPRESSED_PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidPublicKey);
        }
        VerifyingKey::from_sec1_bytes(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        let mut arr = [0u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// The full SEC1 encoding including the format byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The SEC1 format byte (`0x04` for uncompressed keys).
    pub fn format_prefix(&self) -> u8 {
        self.bytes[0]
    }

    /// X and Y coordinates without the format byte.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.bytes[1..]
    }

    /// Hex of the full SEC1 encoding (130 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Hex of the raw coordinates (128 characters).
    pub fn raw_hex(&self) -> String {
        hex::encode(self.raw_bytes())
    }

    /// Check a 64-byte `r || s` signature over `hash(message)`.
    pub fn verify(&self, hash: HashAlgorithm, message: &[u8], signature: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&self.bytes) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        verifying_key
            .verify_prehash(&hash.digest(message), &signature)
            .is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}...)", &self.to_hex()[..18])
    }
}

/// Derive the public key for a hex-encoded private key on `curve`.
///
/// `hash` is the identity's signing hash. It does not influence the derived
/// key; it is accepted so callers can pass an identity's full key
/// description in one place.
pub fn derive_public_key(
    curve: Curve,
    private_key_hex: &str,
    hash: HashAlgorithm,
) -> Result<PublicKey, KeyError> {
    tracing::trace!(%curve, %hash, "deriving public key");
    Ok(PrivateKey::from_hex(curve, private_key_hex)?.public_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RAW_PUBLIC_KEY_LENGTH;

    const OWNER_KEY: &str = "69e7e51ead557351ade7a575e947c4d4bd19dd8a6cdf00c51f9c7f6f721b72dc";
    const ALICE_KEY: &str = "c9193930b34dd498378e36c35118a627d9eb500f6fd69b16d8e59db7cc8f5bb3";
    const BOB_KEY: &str = "d95472318e773b2046b078ae252c42082752c7b7876ce2770a2d3e00b02bbed5";
    const CARL_KEY: &str = "f559fa403545e328ea024ef27e030a478634ae04212519e8bb5293add4b6dda4";

    #[test]
    fn derivation_is_deterministic_for_emulator_keys() {
        for key in [OWNER_KEY, ALICE_KEY, BOB_KEY, CARL_KEY] {
            let a = derive_public_key(Curve::Secp256k1, key, HashAlgorithm::Sha3_256).unwrap();
            let b = derive_public_key(Curve::Secp256k1, key, HashAlgorithm::Sha3_256).unwrap();
            assert_eq!(a.as_bytes(), b.as_bytes());
        }
    }

    #[test]
    fn stripped_key_has_raw_coordinate_length() {
        for key in [OWNER_KEY, ALICE_KEY, BOB_KEY, CARL_KEY] {
            let pk = derive_public_key(Curve::Secp256k1, key, HashAlgorithm::Sha3_256).unwrap();
            assert_eq!(pk.format_prefix(), 0x04);
            assert_eq!(pk.raw_bytes().len(), RAW_PUBLIC_KEY_LENGTH);
            assert_eq!(pk.to_hex().len(), 2 * UNCOMPRESSED_PUBLIC_KEY_LENGTH);
            assert_eq!(pk.raw_hex(), pk.to_hex()[2..]);
        }
    }

    #[test]
    fn distinct_keys_derive_distinct_public_keys() {
        let owner = derive_public_key(Curve::Secp256k1, OWNER_KEY, HashAlgorithm::Sha3_256).unwrap();
        let alice = derive_public_key(Curve::Secp256k1, ALICE_KEY, HashAlgorithm::Sha3_256).unwrap();
        assert_ne!(owner, alice);
    }

    #[test]
    fn hash_choice_does_not_change_public_key() {
        let a = derive_public_key(Curve::Secp256k1, OWNER_KEY, HashAlgorithm::Sha3_256).unwrap();
        let b = derive_public_key(Curve::Secp256k1, OWNER_KEY, HashAlgorithm::Keccak256).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generator_point_for_scalar_one() {
        let one = format!("{:064x}", 1);
        let pk = derive_public_key(Curve::Secp256k1, &one, HashAlgorithm::Sha3_256).unwrap();
        assert_eq!(
            pk.to_hex(),
            "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
    }

    #[test]
    fn accepts_0x_prefix() {
        let with_prefix = format!("0x{}", OWNER_KEY);
        let a = derive_public_key(Curve::Secp256k1, &with_prefix, HashAlgorithm::Sha3_256).unwrap();
        let b = derive_public_key(Curve::Secp256k1, OWNER_KEY, HashAlgorithm::Sha3_256).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_malformed_keys() {
        let cases = [
            "not-hex-at-all".to_string(),
            "deadbeef".to_string(),
            "00".repeat(32),
            "ff".repeat(32),
            format!("{}00", OWNER_KEY),
        ];
        for case in cases {
            assert!(
                matches!(
                    derive_public_key(Curve::Secp256k1, &case, HashAlgorithm::Sha3_256),
                    Err(KeyError::InvalidKey(_))
                ),
                "accepted {case}"
            );
        }
    }

    #[test]
    fn curve_parses_flow_names() {
        assert_eq!("secp256k1".parse::<Curve>().unwrap(), Curve::Secp256k1);
        assert_eq!("ECDSA_secp256k1".parse::<Curve>().unwrap(), Curve::Secp256k1);
        assert!(matches!(
            "ECDSA_P256".parse::<Curve>(),
            Err(KeyError::UnsupportedCurve(_))
        ));
    }

    #[test]
    fn signatures_verify_against_derived_key() {
        let key = PrivateKey::from_hex(Curve::Secp256k1, ALICE_KEY).unwrap();
        let sig = key.sign(HashAlgorithm::Sha3_256, b"set lock period").unwrap();
        let pk = key.public_key();
        assert!(pk.verify(HashAlgorithm::Sha3_256, b"set lock period", &sig));
        assert!(!pk.verify(HashAlgorithm::Sha3_256, b"set members", &sig));
        assert!(!pk.verify(HashAlgorithm::Sha2_256, b"set lock period", &sig));
    }

    #[test]
    fn sec1_roundtrip() {
        let pk = PrivateKey::from_hex(Curve::Secp256k1, BOB_KEY).unwrap().public_key();
        let parsed = PublicKey::from_sec1_bytes(pk.as_bytes()).unwrap();
        assert_eq!(pk, parsed);
        assert!(PublicKey::from_sec1_bytes(pk.raw_bytes()).is_err());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = PrivateKey::from_hex(Curve::Secp256k1, CARL_KEY).unwrap();
        let debug_str = format!("{:?}", key);
        assert!(debug_str.starts_with("PrivateKey(secp256k1"));
        assert!(!debug_str.contains(CARL_KEY));
        assert!(!debug_str.contains(&CARL_KEY[..16]));
    }
}
