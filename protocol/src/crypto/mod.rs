//! # Cryptographic Primitives
//!
//! Thin, typed wrappers over RustCrypto: secp256k1 keys from `k256` and the
//! SHA-2 / SHA-3 / Keccak digests an account key may declare. Nothing here
//! implements curve arithmetic or hashing itself.

pub mod hash;
pub mod keys;

pub use hash::{keccak256, sha256, sha3_256, HashAlgorithm};
pub use keys::{derive_public_key, Curve, KeyError, PrivateKey, PublicKey};
