//! Symbol-keyed registry of supported coins
//!
//! Read-only after construction: lookups never mutate, and a missing
//! symbol is a `None`, not an error. Registration of additional coins
//! happens up front, before the registry is shared.

use std::collections::BTreeMap;

use crate::builder::TransactionBuilderFactory;

use super::params::{
    stacks_mainnet, stacks_testnet, zcash_mainnet, zcash_testnet, CoinParameters,
};

/// Builder family a coin belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinFamily {
    /// Nonce-and-fee account model; contract calls
    Account,
    /// Unspent-output model; native transfers
    Utxo,
}

/// Maps chain symbols to their family and parameters
#[derive(Debug, Clone, Default)]
pub struct Registry {
    coins: BTreeMap<String, (CoinFamily, CoinParameters)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in coin set: stx/tstx and zec/tzec
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(CoinFamily::Account, stacks_mainnet());
        registry.register(CoinFamily::Account, stacks_testnet());
        registry.register(CoinFamily::Utxo, zcash_mainnet());
        registry.register(CoinFamily::Utxo, zcash_testnet());
        registry
    }

    /// Register a coin under its parameter set's chain symbol
    pub fn register(&mut self, family: CoinFamily, params: CoinParameters) {
        self.coins
            .insert(params.chain.clone(), (family, params));
    }

    pub fn get(&self, symbol: &str) -> Option<&(CoinFamily, CoinParameters)> {
        self.coins.get(symbol)
    }

    /// Build a factory for a registered symbol
    pub fn factory(&self, symbol: &str) -> Option<TransactionBuilderFactory> {
        self.get(symbol)
            .map(|(family, params)| TransactionBuilderFactory::new(*family, params.clone()))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.coins.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_contents() {
        let registry = Registry::standard();
        let symbols: Vec<&str> = registry.symbols().collect();
        assert_eq!(symbols, vec!["stx", "tstx", "tzec", "zec"]);

        let (family, params) = registry.get("tzec").unwrap();
        assert_eq!(*family, CoinFamily::Utxo);
        assert_eq!(params.chain, "tzec");
        assert!(registry.get("btc").is_none());
    }

    #[test]
    fn test_factory_lookup() {
        let registry = Registry::standard();
        let factory = registry.factory("stx").unwrap();
        assert_eq!(factory.family(), CoinFamily::Account);
        assert!(registry.factory("doge").is_none());
    }
}
