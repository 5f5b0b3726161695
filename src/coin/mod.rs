//! Coin configuration: parameters, registry, and adapters
//!
//! - `params`: immutable per-(chain, network) constants
//! - `registry`: symbol lookup for the supported coin set
//! - `adapter`: fork stamping and explorer-backed recovery for UTXO coins

pub mod adapter;
pub mod params;
pub mod registry;

pub use adapter::{AdapterError, UtxoCoinAdapter};
pub use params::{
    stacks_mainnet, stacks_testnet, zcash_mainnet, zcash_testnet, CoinParameters, FunctionSchema,
    Network, CANOPY_BRANCH_ID, HEARTWOOD_BRANCH_ID, SAPLING_TX_VERSION, SAPLING_VERSION_GROUP_ID,
};
pub use registry::{CoinFamily, Registry};
