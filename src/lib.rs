//! TxForge: multi-chain transaction construction and signing
//!
//! This crate provides offline transaction building for two chain
//! families behind one builder interface:
//! - Account-model contract calls with allow-listed targets and typed
//!   arguments (single-signer and threshold multisig)
//! - Fork-aware UTXO transfers with explorer-backed recovery
//! - ECDSA signing over secp256k1 with recoverable compact signatures
//! - Base58Check address derivation, including multisig group addresses
//! - Canonical wire serialization with builder restoration via `from()`
//!
//! # Example
//!
//! ```rust
//! use txforge::builder::TransactionBuilder;
//! use txforge::coin::{Network, Registry};
//! use txforge::crypto::KeyPair;
//!
//! let key = KeyPair::generate(Network::Testnet);
//! let registry = Registry::standard();
//! let factory = registry.factory("tstx").unwrap();
//!
//! // Configure a staking delegation call
//! let mut builder = factory.contract_builder().unwrap();
//! builder.fee(180).nonce(0);
//! builder
//!     .contract_address("ST000000000000000000002AMW42H").unwrap()
//!     .contract_name("pox").unwrap()
//!     .function_name("delegate-stx").unwrap();
//! builder.from_pub_keys(&[&key.public_key_hex()]).unwrap();
//!
//! // Build the (unsigned) transaction and inspect it
//! let tx = builder.build().unwrap();
//! assert!(!tx.is_fully_signed());
//! println!("broadcast: {}", tx.to_broadcast_format());
//! ```

pub mod builder;
pub mod coin;
pub mod crypto;
pub mod explorer;
pub mod transaction;

// Re-export commonly used types
pub use builder::{
    BuilderError, ContractCallBuilder, RestoredBuilder, TransactionBuilder,
    TransactionBuilderFactory, UtxoTransactionBuilder,
};
pub use coin::{CoinFamily, CoinParameters, Network, Registry, UtxoCoinAdapter};
pub use crypto::KeyPair;
pub use explorer::{AddressInfo, ExplorerClient, Unspent};
pub use transaction::{Transaction, TransactionEntry, TransactionType};
