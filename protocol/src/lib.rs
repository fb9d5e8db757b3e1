// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Omniverse Protocol: Simulator Core
//!
//! Everything the Omniverse Flow simulator needs that is not command-line
//! plumbing: who the test accounts are, how their keys become public keys
//! and signatures, how arguments are typed for Cadence, and how a
//! transaction or script actually reaches a Flow network.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants, default endpoints and Cadence file references.
//! - **crypto**: secp256k1 keys, Flow hash algorithms, public key derivation.
//! - **identity**: Flow addresses and the immutable account registry.
//! - **cadence**: JSON-Cadence typed values and `UFix64`.
//! - **dispatch**: The `Dispatcher` trait, the Flow REST implementation and
//!   an in-memory recorder for tests.
//! - **payload**: The cross-chain Omniverse NFT payload built by `mint`.
//!
//! ## Ground Rules
//!
//! 1. Identities are injected, never global. Tests swap them freely.
//! 2. Private keys never show up in `Debug` output, logs or error messages.
//! 3. Nothing here prints to stdout; the binary owns the console.

pub mod cadence;
pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod identity;
pub mod payload;
