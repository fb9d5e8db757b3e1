//! Flow transaction envelopes: canonical RLP encoding and signing.
//!
//! The signed message is
//!
//! ```text
//! domain_tag("FLOW-V0.0-transaction") || rlp([payload, payload_signatures])
//! ```
//!
//! where `payload` is the RLP list
//! `[script, arguments, reference_block_id, gas_limit, proposal_key_address,
//!   proposal_key_index, proposal_key_sequence_number, payer, authorizers]`.
//!
//! The simulator always signs as a single account that is proposer, payer and
//! sole authorizer, so only an envelope signature is produced and
//! `payload_signatures` is empty.

use alloy_rlp::Header;

use crate::config::transaction_domain_tag;
use crate::crypto::KeyError;
use crate::identity::{FlowAddress, IdentityRecord};

/// The key that proposes the transaction and whose sequence number it
/// consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalKey {
    pub address: FlowAddress,
    pub key_index: u32,
    pub sequence_number: u64,
}

/// A signature attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSignature {
    pub address: FlowAddress,
    pub key_index: u32,
    pub signature: Vec<u8>,
}

/// Everything a transaction commits to, before signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBody {
    pub script: Vec<u8>,
    /// JSON-Cadence encoded arguments, byte-for-byte as submitted.
    pub arguments: Vec<Vec<u8>>,
    pub reference_block_id: Vec<u8>,
    pub gas_limit: u64,
    pub proposal_key: ProposalKey,
    pub payer: FlowAddress,
    pub authorizers: Vec<FlowAddress>,
}

impl TransactionBody {
    /// A transaction where `signer` proposes, pays and authorizes.
    pub fn single_signer(
        signer: &IdentityRecord,
        script: Vec<u8>,
        arguments: Vec<Vec<u8>>,
        reference_block_id: Vec<u8>,
        gas_limit: u64,
        sequence_number: u64,
    ) -> Self {
        Self {
            script,
            arguments,
            reference_block_id,
            gas_limit,
            proposal_key: ProposalKey {
                address: signer.address(),
                key_index: signer.key_index(),
                sequence_number,
            },
            payer: signer.address(),
            authorizers: vec![signer.address()],
        }
    }

    /// RLP encoding of the payload list.
    pub fn payload_rlp(&self) -> Vec<u8> {
        let arguments: Vec<Vec<u8>> = self.arguments.iter().map(|a| bytes_item(a)).collect();
        let authorizers: Vec<Vec<u8>> = self
            .authorizers
            .iter()
            .map(|a| bytes_item(a.as_bytes()))
            .collect();

        list(&[
            bytes_item(&self.script),
            list(&arguments),
            bytes_item(&self.reference_block_id),
            uint_item(self.gas_limit),
            bytes_item(self.proposal_key.address.as_bytes()),
            uint_item(u64::from(self.proposal_key.key_index)),
            uint_item(self.proposal_key.sequence_number),
            bytes_item(self.payer.as_bytes()),
            list(&authorizers),
        ])
    }

    /// RLP encoding of `[payload, payload_signatures]`.
    ///
    /// `payload_signatures` must be ordered by signer; each signer's index is
    /// its position among the transaction's distinct signer addresses.
    pub fn envelope_rlp(&self, payload_signatures: &[EnvelopeSignature]) -> Vec<u8> {
        let signers = self.signer_addresses();
        let signatures: Vec<Vec<u8>> = payload_signatures
            .iter()
            .map(|sig| {
                let signer_index = signers
                    .iter()
                    .position(|a| *a == sig.address)
                    .unwrap_or_default() as u64;
                list(&[
                    uint_item(signer_index),
                    uint_item(u64::from(sig.key_index)),
                    bytes_item(&sig.signature),
                ])
            })
            .collect();
        list(&[self.payload_rlp(), list(&signatures)])
    }

    /// The exact bytes an envelope signer hashes and signs.
    pub fn envelope_message(&self) -> Vec<u8> {
        let mut message = transaction_domain_tag().to_vec();
        message.extend_from_slice(&self.envelope_rlp(&[]));
        message
    }

    /// Produce the payer's envelope signature.
    pub fn sign_envelope(&self, signer: &IdentityRecord) -> Result<EnvelopeSignature, KeyError> {
        let signature = signer.sign(&self.envelope_message())?;
        Ok(EnvelopeSignature {
            address: signer.address(),
            key_index: signer.key_index(),
            signature: signature.to_vec(),
        })
    }

    /// Distinct signer addresses in canonical order: proposer, payer, then
    /// authorizers.
    fn signer_addresses(&self) -> Vec<FlowAddress> {
        let mut out: Vec<FlowAddress> = Vec::new();
        let candidates = std::iter::once(self.proposal_key.address)
            .chain(std::iter::once(self.payer))
            .chain(self.authorizers.iter().copied());
        for address in candidates {
            if !out.contains(&address) {
                out.push(address);
            }
        }
        out
    }
}

fn bytes_item(bytes: &[u8]) -> Vec<u8> {
    alloy_rlp::encode(bytes)
}

fn uint_item(value: u64) -> Vec<u8> {
    alloy_rlp::encode(value)
}

/// Wrap already-encoded items in a list header.
fn list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_length = items.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AccountRegistry, RegistryConfig, OWNER};

    fn zero_body() -> TransactionBody {
        let zero = FlowAddress::from_bytes([0u8; 8]);
        TransactionBody {
            script: vec![],
            arguments: vec![],
            reference_block_id: vec![0u8; 32],
            gas_limit: 0,
            proposal_key: ProposalKey {
                address: zero,
                key_index: 0,
                sequence_number: 0,
            },
            payer: zero,
            authorizers: vec![zero],
        }
    }

    #[test]
    fn payload_encoding_layout() {
        let rlp = zero_body().payload_rlp();
        // 66-byte payload needs the long list header form.
        assert_eq!(&rlp[..2], &[0xf8, 0x42]);
        assert_eq!(rlp.len(), 68);
        // empty script, empty argument list, 32-byte block id
        assert_eq!(&rlp[2..5], &[0x80, 0xc0, 0xa0]);
        // authorizers: list of one 8-byte string
        assert_eq!(&rlp[rlp.len() - 10..rlp.len() - 8], &[0xc9, 0x88]);
    }

    #[test]
    fn envelope_wraps_payload_and_empty_signature_list() {
        let body = zero_body();
        let payload = body.payload_rlp();
        let envelope = body.envelope_rlp(&[]);
        // 68 payload bytes + 1 byte empty list = 69, long header form.
        assert_eq!(&envelope[..2], &[0xf8, 0x45]);
        assert_eq!(&envelope[2..2 + payload.len()], payload.as_slice());
        assert_eq!(envelope.last(), Some(&0xc0));
    }

    #[test]
    fn arguments_change_the_payload() {
        let mut body = zero_body();
        let before = body.payload_rlp();
        body.arguments.push(br#"{"type":"UFix64","value":"1.00000000"}"#.to_vec());
        assert_ne!(before, body.payload_rlp());
    }

    #[test]
    fn envelope_message_starts_with_domain_tag() {
        let message = zero_body().envelope_message();
        assert!(message.starts_with(b"FLOW-V0.0-transaction\0\0\0"));
        assert_eq!(message.len(), 32 + 71);
    }

    #[test]
    fn envelope_signature_verifies() {
        let registry = AccountRegistry::new(RegistryConfig::emulator()).unwrap();
        let owner = registry.lookup(OWNER).unwrap();
        let body = TransactionBody::single_signer(
            owner,
            b"transaction {}".to_vec(),
            vec![],
            vec![7u8; 32],
            9_999,
            3,
        );
        let sig = body.sign_envelope(owner).unwrap();
        assert_eq!(sig.address, owner.address());
        assert_eq!(sig.signature.len(), 64);
        assert!(owner.public_key().verify(
            owner.hash_algorithm(),
            &body.envelope_message(),
            &sig.signature
        ));
    }

    #[test]
    fn single_signer_roles_collapse_to_one_signer() {
        let registry = AccountRegistry::new(RegistryConfig::emulator()).unwrap();
        let alice = registry.lookup("Alice").unwrap();
        let body = TransactionBody::single_signer(alice, vec![], vec![], vec![0; 32], 1, 0);
        assert_eq!(body.signer_addresses(), vec![alice.address()]);
        assert_eq!(body.payer, alice.address());
        assert_eq!(body.authorizers, vec![alice.address()]);
    }
}
