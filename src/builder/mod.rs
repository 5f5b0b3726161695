//! Transaction builders
//!
//! A builder is a mutable, order-tolerant accumulator of construction
//! parameters: setters validate fail-fast as fields arrive, `build()`
//! re-validates holistically and produces an immutable [`Transaction`].
//! Once `build()` succeeds the builder should be discarded; continuing to
//! mutate it is not supported.

pub mod contract_call;
pub mod factory;
pub mod utxo;

use thiserror::Error;

use crate::coin::CoinParameters;
use crate::crypto::KeyError;
use crate::transaction::args::ArgError;
use crate::transaction::wire::WireError;
use crate::transaction::Transaction;

pub use contract_call::ContractCallBuilder;
pub use factory::{RestoredBuilder, TransactionBuilderFactory};
pub use utxo::UtxoTransactionBuilder;

/// Errors raised while constructing a transaction
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Unsupported private key")]
    UnsupportedPrivateKey,
    #[error("Invalid contract address: {0}")]
    InvalidContractAddress(String),
    #[error("Unsupported contract name: {0}")]
    UnsupportedContractName(String),
    #[error("{0} is not a supported contract function name")]
    UnsupportedFunctionName(String),
    #[error("Function argument mismatch: {0}")]
    InvalidFunctionArgs(String),
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Operation not supported by this chain family: {0}")]
    UnsupportedOperation(&'static str),
    #[error("Argument error: {0}")]
    Argument(#[from] ArgError),
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
}

/// Operations common to every builder variant
///
/// `sign` accepts a hex-encoded private key (with or without the trailing
/// compressed-key marker) and may be called repeatedly to accumulate
/// multisig signatures. `number_signatures` declares the threshold; it is
/// enforced at broadcast-readiness checks, not at accumulation time.
pub trait TransactionBuilder {
    fn fee(&mut self, fee: u64) -> &mut Self;

    fn nonce(&mut self, nonce: u64) -> &mut Self;

    /// Re-bind the builder to a different network's parameters
    fn network(&mut self, params: CoinParameters) -> &mut Self;

    /// Declare the authorized signer set; order is preserved because some
    /// chain families derive addresses from it
    fn from_pub_keys(&mut self, pub_keys: &[&str]) -> Result<&mut Self, BuilderError>;

    /// Declare how many signatures the transaction needs to be authorized
    fn number_signatures(&mut self, required: u8) -> &mut Self;

    /// Parse a private key, compute the current signing hash, and append a
    /// signature to the accumulated set
    fn sign(&mut self, key: &str) -> Result<&mut Self, BuilderError>;

    /// Finalize into an immutable transaction, validating holistically
    fn build(&self) -> Result<Transaction, BuilderError>;
}
