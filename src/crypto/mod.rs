//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 / RIPEMD160 hashing
//! - Key material codec (raw scalar <-> key pair, secp256k1)
//! - Base58Check address derivation

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, hash160, sha256, sha256_hex};
pub use keys::{
    address_from_public_key, base58check_decode, base58check_encode, left_pad_scalar,
    multisig_address, public_key_from_hex, recover_public_key, verify_signature, KeyError,
    KeyPair, SCALAR_LENGTH,
};
