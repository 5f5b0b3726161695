//! Key material codec and ECDSA signing
//!
//! Converts between raw 32-byte scalars and structured key pairs over
//! secp256k1, and provides the signing/verification primitives the
//! transaction builders use. A key pair built from a public key alone is
//! watch-only: it can verify but never sign.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::{double_sha256, hash160};
use crate::coin::Network;

/// Length of a raw private key scalar in bytes
pub const SCALAR_LENGTH: usize = 32;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("Missing private key")]
    MissingPrivateKey,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of an optional private scalar and its public point
#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: Option<SecretKey>,
    public_key: PublicKey,
    network: Network,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate(network: Network) -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key: Some(secret_key),
            public_key,
            network,
        }
    }

    /// Create a key pair from a raw private key scalar
    ///
    /// The scalar must be exactly 32 big-endian bytes. Shorter internal
    /// representations must be left-padded by the caller (see
    /// [`left_pad_scalar`]) before reaching this constructor.
    pub fn from_scalar(bytes: &[u8], network: Network) -> Result<Self, KeyError> {
        if bytes.len() != SCALAR_LENGTH {
            return Err(KeyError::InvalidKeyLength {
                expected: SCALAR_LENGTH,
                got: bytes.len(),
            });
        }
        let secret_key = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key: Some(secret_key),
            public_key,
            network,
        })
    }

    /// Create a key pair from a hex-encoded private key
    ///
    /// Accepts 64 hex chars (raw scalar), 66 hex chars ending in `01`
    /// (compressed-key marker used by some chain encodings), and shorter hex
    /// strings whose big-endian magnitude fits in 32 bytes.
    pub fn from_private_key_hex(hex_key: &str, network: Network) -> Result<Self, KeyError> {
        let stripped = if hex_key.len() == 2 * SCALAR_LENGTH + 2 && hex_key.ends_with("01") {
            &hex_key[..2 * SCALAR_LENGTH]
        } else {
            hex_key
        };
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidPrivateKey)?;
        let padded = left_pad_scalar(&bytes)?;
        Self::from_scalar(&padded, network)
    }

    /// Create a watch-only key pair from a hex-encoded compressed public key
    pub fn from_public_key_hex(hex_key: &str, network: Network) -> Result<Self, KeyError> {
        let public_key = public_key_from_hex(hex_key)?;
        Ok(Self {
            secret_key: None,
            public_key,
            network,
        })
    }

    /// Get the private key as exactly 32 big-endian bytes
    ///
    /// Fails for watch-only pairs. Never truncates and never emits fewer
    /// than 32 bytes.
    pub fn to_scalar(&self) -> Result<[u8; SCALAR_LENGTH], KeyError> {
        match self.secret_key {
            Some(sk) => Ok(sk.secret_bytes()),
            None => Err(KeyError::MissingPrivateKey),
        }
    }

    /// Whether this pair can produce signatures
    pub fn can_sign(&self) -> bool {
        self.secret_key.is_some()
    }

    /// The network this key pair formats addresses for
    pub fn network(&self) -> Network {
        self.network
    }

    /// The public point of this key pair
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Derive the Base58Check address for this key under the given version prefix
    pub fn address(&self, version: &[u8]) -> String {
        address_from_public_key(&self.public_key, version)
    }

    /// Sign a 32-byte message hash, returning the recovery id and compact signature
    pub fn sign_hash(&self, message_hash: &[u8]) -> Result<(u8, [u8; 64]), KeyError> {
        let secret_key = self.secret_key.ok_or(KeyError::MissingPrivateKey)?;
        let secp = Secp256k1::new();
        let message = Message::from_digest_slice(message_hash)?;
        let signature: RecoverableSignature = secp.sign_ecdsa_recoverable(&message, &secret_key);
        let (recovery_id, compact) = signature.serialize_compact();
        Ok((recovery_id.to_i32() as u8, compact))
    }
}

/// Left-pad a big-endian scalar with zeros to exactly 32 bytes
///
/// Preserves the numeric magnitude; fails if the input is longer than 32 bytes.
pub fn left_pad_scalar(bytes: &[u8]) -> Result<[u8; SCALAR_LENGTH], KeyError> {
    if bytes.len() > SCALAR_LENGTH {
        return Err(KeyError::InvalidKeyLength {
            expected: SCALAR_LENGTH,
            got: bytes.len(),
        });
    }
    let mut padded = [0u8; SCALAR_LENGTH];
    padded[SCALAR_LENGTH - bytes.len()..].copy_from_slice(bytes);
    Ok(padded)
}

/// Parse a compressed public key from a hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Verify a compact signature against a public key and 32-byte message hash
pub fn verify_signature(
    public_key: &PublicKey,
    message_hash: &[u8],
    signature: &[u8; 64],
) -> Result<bool, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(message_hash)?;
    let sig = Signature::from_compact(signature).map_err(|_| KeyError::InvalidSignature)?;
    match secp.verify_ecdsa(&message, &sig, public_key) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Recover the signing public key from a recoverable signature
pub fn recover_public_key(
    message_hash: &[u8],
    recovery_id: u8,
    signature: &[u8; 64],
) -> Result<PublicKey, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(message_hash)?;
    let id = RecoveryId::from_i32(recovery_id as i32)?;
    let sig = RecoverableSignature::from_compact(signature, id)
        .map_err(|_| KeyError::InvalidSignature)?;
    Ok(secp.recover_ecdsa(&message, &sig)?)
}

/// Encode a version prefix + payload as a Base58Check string
///
/// Checksum is the first 4 bytes of double SHA-256, as in Bitcoin.
pub fn base58check_encode(version: &[u8], payload: &[u8]) -> String {
    let mut bytes = version.to_vec();
    bytes.extend_from_slice(payload);
    let checksum = double_sha256(&bytes);
    bytes.extend_from_slice(&checksum[..4]);
    bs58::encode(bytes).into_string()
}

/// Decode a Base58Check string into version-and-payload bytes
///
/// Verifies the checksum; the caller splits version from payload since
/// prefix width is chain-specific.
pub fn base58check_decode(address: &str) -> Result<Vec<u8>, KeyError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|_| KeyError::InvalidAddress(address.to_string()))?;
    if bytes.len() < 5 {
        return Err(KeyError::InvalidAddress(address.to_string()));
    }
    let (body, checksum) = bytes.split_at(bytes.len() - 4);
    if double_sha256(body)[..4] != *checksum {
        return Err(KeyError::InvalidAddress(address.to_string()));
    }
    Ok(body.to_vec())
}

/// Derive a single-signer address: Base58Check(version || hash160(pubkey))
pub fn address_from_public_key(public_key: &PublicKey, version: &[u8]) -> String {
    base58check_encode(version, &hash160(&public_key.serialize()))
}

/// Derive a multisig group address from a threshold and signer set
///
/// Address = Base58Check(version || hash160(threshold || sorted pubkeys)).
/// Sorting makes the address independent of signer declaration order.
pub fn multisig_address(threshold: u8, public_keys: &[PublicKey], version: &[u8]) -> String {
    let mut sorted: Vec<[u8; 33]> = public_keys.iter().map(|pk| pk.serialize()).collect();
    sorted.sort();
    let mut script_data = vec![threshold];
    for pubkey in &sorted {
        script_data.extend_from_slice(pubkey);
    }
    base58check_encode(version, &hash160(&script_data))
}
