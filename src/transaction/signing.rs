//! Signature accumulation for single-signer and threshold multisig
//!
//! Signatures may be collected in any order and from independent parties;
//! the serialized order is always the compressed-pubkey byte order, so the
//! broadcast bytes do not depend on who signed first. Threshold enforcement
//! happens at broadcast-readiness checks, never at accumulation time.

use log::warn;
use secp256k1::PublicKey;

use super::wire::{Reader, Writer, WireError};

/// One signer's contribution: public key, recovery info, compact signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    pub public_key: PublicKey,
    pub recovery_id: u8,
    pub signature: [u8; 64],
}

impl TransactionSignature {
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Wire layout: 33-byte pubkey, 1-byte recovery id, 64-byte compact sig
    pub fn encode(&self, w: &mut Writer) {
        w.put_bytes(&self.public_key.serialize());
        w.put_u8(self.recovery_id);
        w.put_bytes(&self.signature);
    }

    pub fn decode(r: &mut Reader) -> Result<Self, WireError> {
        let pubkey_bytes = r.read_bytes(33)?;
        let public_key = PublicKey::from_slice(pubkey_bytes)
            .map_err(|_| WireError::Invalid("malformed public key".to_string()))?;
        let recovery_id = r.read_u8()?;
        let sig_bytes = r.read_bytes(64)?;
        let signature: [u8; 64] = sig_bytes.try_into().map_err(|_| WireError::UnexpectedEof)?;
        Ok(Self {
            public_key,
            recovery_id,
            signature,
        })
    }
}

/// Accumulated signatures with deterministic serialization order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet {
    signatures: Vec<TransactionSignature>,
}

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature; a repeated signer replaces its earlier entry
    pub fn push(&mut self, signature: TransactionSignature) {
        if let Some(existing) = self
            .signatures
            .iter_mut()
            .find(|s| s.public_key == signature.public_key)
        {
            warn!(
                "replacing existing signature for signer {}",
                signature.public_key_hex()
            );
            *existing = signature;
        } else {
            self.signatures.push(signature);
        }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Signatures in accumulation order
    pub fn iter(&self) -> impl Iterator<Item = &TransactionSignature> {
        self.signatures.iter()
    }

    /// Public keys in accumulation order
    pub fn signer_keys(&self) -> Vec<PublicKey> {
        self.signatures.iter().map(|s| s.public_key).collect()
    }

    pub fn contains_signer(&self, public_key: &PublicKey) -> bool {
        self.signatures.iter().any(|s| &s.public_key == public_key)
    }

    /// Signatures in canonical serialization order (by compressed pubkey bytes)
    pub fn sorted(&self) -> Vec<&TransactionSignature> {
        let mut refs: Vec<&TransactionSignature> = self.signatures.iter().collect();
        refs.sort_by_key(|s| s.public_key.serialize());
        refs
    }
}
