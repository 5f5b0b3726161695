//! Per-chain, per-network coin parameters
//!
//! One immutable `CoinParameters` instance exists per (chain, network) pair
//! and is injected into every builder at construction. A testnet variant is
//! a different parameter value, never a different type: the builders stay
//! generic and the constants live here.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::transaction::args::ArgKind;

/// Network selector attached to keys, builders, and parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
}

/// Argument schema for an allow-listed contract function
///
/// Builders accept an argument list whose kinds match a prefix of the
/// schema: trailing optional arguments may be omitted, but a present
/// argument must match its position's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub args: Vec<ArgKind>,
}

impl FunctionSchema {
    pub fn new(args: Vec<ArgKind>) -> Self {
        Self { args }
    }

    /// Check a provided argument kind list against this schema
    pub fn accepts(&self, provided: &[ArgKind]) -> bool {
        provided.len() <= self.args.len()
            && provided.iter().zip(&self.args).all(|(got, want)| got == want)
    }
}

/// Immutable configuration for one (chain, network) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinParameters {
    /// Chain symbol, e.g. "stx" or "zec"
    pub chain: String,
    /// Network this parameter set belongs to
    pub network: Network,
    /// Base58Check version prefix for single-signer addresses
    pub pubkey_address_version: Vec<u8>,
    /// Base58Check version prefix for script/multisig addresses
    pub script_address_version: Vec<u8>,
    /// Transaction version for the currently active fork (UTXO family)
    pub tx_version: Option<u32>,
    /// Version group id for the currently active fork (UTXO family)
    pub version_group_id: Option<u32>,
    /// Consensus branch id for the currently active fork (UTXO family)
    pub consensus_branch_id: Option<u32>,
    /// Contract addresses a contract-call builder may target
    pub allowed_contract_addresses: BTreeSet<String>,
    /// Contract names a contract-call builder may target
    pub allowed_contract_names: BTreeSet<String>,
    /// Recognized function names with their argument schemas
    pub allowed_functions: BTreeMap<String, FunctionSchema>,
    /// Base URL of the block explorer used for recovery
    pub explorer_base_url: String,
}

impl CoinParameters {
    /// Whether a contract address is allow-listed on this network
    pub fn is_allowed_contract_address(&self, address: &str) -> bool {
        self.allowed_contract_addresses.contains(address)
    }

    /// Whether a contract name is allow-listed on this network
    pub fn is_allowed_contract_name(&self, name: &str) -> bool {
        self.allowed_contract_names.contains(name)
    }

    /// Look up the schema for an allow-listed function name
    pub fn function_schema(&self, name: &str) -> Option<&FunctionSchema> {
        self.allowed_functions.get(name)
    }
}

fn staking_functions() -> BTreeMap<String, FunctionSchema> {
    let mut functions = BTreeMap::new();
    functions.insert(
        "stack-stx".to_string(),
        FunctionSchema::new(vec![
            ArgKind::UInt128,
            ArgKind::Principal,
            ArgKind::UInt128,
            ArgKind::Tuple,
        ]),
    );
    functions.insert(
        "delegate-stx".to_string(),
        FunctionSchema::new(vec![ArgKind::UInt128, ArgKind::Principal]),
    );
    functions
}

/// Account-model staking chain, mainnet
pub fn stacks_mainnet() -> CoinParameters {
    CoinParameters {
        chain: "stx".to_string(),
        network: Network::Mainnet,
        pubkey_address_version: vec![0x16],
        script_address_version: vec![0x14],
        tx_version: None,
        version_group_id: None,
        consensus_branch_id: None,
        allowed_contract_addresses: ["SP000000000000000000002Q6VF78".to_string()].into(),
        allowed_contract_names: ["pox".to_string()].into(),
        allowed_functions: staking_functions(),
        explorer_base_url: "https://stacks-node-api.mainnet.stacks.co".to_string(),
    }
}

/// Account-model staking chain, testnet
pub fn stacks_testnet() -> CoinParameters {
    CoinParameters {
        chain: "tstx".to_string(),
        network: Network::Testnet,
        pubkey_address_version: vec![0x1a],
        script_address_version: vec![0x15],
        tx_version: None,
        version_group_id: None,
        consensus_branch_id: None,
        allowed_contract_addresses: ["ST000000000000000000002AMW42H".to_string()].into(),
        allowed_contract_names: ["pox".to_string()].into(),
        allowed_functions: staking_functions(),
        explorer_base_url: "https://stacks-node-api.testnet.stacks.co".to_string(),
    }
}

/// Sapling transaction version for the fork-aware UTXO chain
pub const SAPLING_TX_VERSION: u32 = 4;
/// Sapling version group id
pub const SAPLING_VERSION_GROUP_ID: u32 = 0x892f2085;
/// "Canopy" consensus branch id (ZIP-251)
pub const CANOPY_BRANCH_ID: u32 = 0xe9ff75a6;
/// "Heartwood" consensus branch id, the upgrade preceding Canopy
pub const HEARTWOOD_BRANCH_ID: u32 = 0xf5b9230b;

/// Fork-aware UTXO chain, mainnet
pub fn zcash_mainnet() -> CoinParameters {
    CoinParameters {
        chain: "zec".to_string(),
        network: Network::Mainnet,
        pubkey_address_version: vec![0x1c, 0xb8],
        script_address_version: vec![0x1c, 0xbd],
        tx_version: Some(SAPLING_TX_VERSION),
        version_group_id: Some(SAPLING_VERSION_GROUP_ID),
        consensus_branch_id: Some(CANOPY_BRANCH_ID),
        allowed_contract_addresses: BTreeSet::new(),
        allowed_contract_names: BTreeSet::new(),
        allowed_functions: BTreeMap::new(),
        explorer_base_url: "https://zcashnetwork.info/api".to_string(),
    }
}

/// Fork-aware UTXO chain, testnet
pub fn zcash_testnet() -> CoinParameters {
    CoinParameters {
        chain: "tzec".to_string(),
        network: Network::Testnet,
        pubkey_address_version: vec![0x1d, 0x25],
        script_address_version: vec![0x1c, 0xba],
        tx_version: Some(SAPLING_TX_VERSION),
        version_group_id: Some(SAPLING_VERSION_GROUP_ID),
        consensus_branch_id: Some(CANOPY_BRANCH_ID),
        allowed_contract_addresses: BTreeSet::new(),
        allowed_contract_names: BTreeSet::new(),
        allowed_functions: BTreeMap::new(),
        explorer_base_url: "https://explorer.testnet.z.cash/api".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_lists_differ_per_network() {
        let mainnet = stacks_mainnet();
        let testnet = stacks_testnet();
        assert!(mainnet.is_allowed_contract_address("SP000000000000000000002Q6VF78"));
        assert!(!mainnet.is_allowed_contract_address("ST000000000000000000002AMW42H"));
        assert!(testnet.is_allowed_contract_address("ST000000000000000000002AMW42H"));
        assert!(!testnet.is_allowed_contract_address("SP000000000000000000002Q6VF78"));
    }

    #[test]
    fn test_function_schema_prefix_rule() {
        let schema = FunctionSchema::new(vec![
            ArgKind::UInt128,
            ArgKind::Principal,
            ArgKind::UInt128,
            ArgKind::Tuple,
        ]);
        assert!(schema.accepts(&[ArgKind::UInt128]));
        assert!(schema.accepts(&[
            ArgKind::UInt128,
            ArgKind::Principal,
            ArgKind::UInt128,
            ArgKind::Tuple
        ]));
        assert!(!schema.accepts(&[ArgKind::Int128]));
        assert!(!schema.accepts(&[
            ArgKind::UInt128,
            ArgKind::Principal,
            ArgKind::UInt128,
            ArgKind::Tuple,
            ArgKind::UInt128
        ]));
    }

    #[test]
    fn test_fork_constants_stamped_on_both_networks() {
        for params in [zcash_mainnet(), zcash_testnet()] {
            assert_eq!(params.tx_version, Some(4));
            assert_eq!(params.version_group_id, Some(0x892f2085));
            assert_eq!(params.consensus_branch_id, Some(0xe9ff75a6));
        }
    }
}
