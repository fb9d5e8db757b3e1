//! # Identity Module
//!
//! The simulated participants and the accounts they sign for.
//!
//! 1. **Address**: 8-byte Flow account addresses.
//! 2. **Registry**: the immutable name → identity table, built once from an
//!    injected [`RegistryConfig`].

pub mod address;
pub mod registry;

pub use address::{AddressError, FlowAddress};
pub use registry::{
    AccountConfig, AccountRegistry, IdentityRecord, RegistryConfig, RegistryError, OWNER,
};
