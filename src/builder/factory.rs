//! Entry point tying a coin symbol to its builder family
//!
//! A factory is bound to one (chain, network) parameter set and hands out
//! fresh builders of the matching family, or restores a builder from
//! previously serialized hex via `from()`.

use log::debug;

use crate::coin::{CoinFamily, CoinParameters};

use super::{BuilderError, ContractCallBuilder, UtxoTransactionBuilder};

/// Hands out builders for one configured coin
#[derive(Debug, Clone)]
pub struct TransactionBuilderFactory {
    family: CoinFamily,
    params: CoinParameters,
}

/// A builder restored from serialized bytes, typed by family
#[derive(Debug)]
pub enum RestoredBuilder {
    ContractCall(ContractCallBuilder),
    Transfer(UtxoTransactionBuilder),
}

impl RestoredBuilder {
    pub fn into_contract_call(self) -> Result<ContractCallBuilder, BuilderError> {
        match self {
            Self::ContractCall(builder) => Ok(builder),
            Self::Transfer(_) => Err(BuilderError::UnsupportedOperation(
                "restored transaction is a transfer",
            )),
        }
    }

    pub fn into_transfer(self) -> Result<UtxoTransactionBuilder, BuilderError> {
        match self {
            Self::Transfer(builder) => Ok(builder),
            Self::ContractCall(_) => Err(BuilderError::UnsupportedOperation(
                "restored transaction is a contract call",
            )),
        }
    }
}

impl TransactionBuilderFactory {
    pub fn new(family: CoinFamily, params: CoinParameters) -> Self {
        Self { family, params }
    }

    pub fn family(&self) -> CoinFamily {
        self.family
    }

    pub fn params(&self) -> &CoinParameters {
        &self.params
    }

    /// Fresh contract-call builder; account-family coins only
    pub fn contract_builder(&self) -> Result<ContractCallBuilder, BuilderError> {
        match self.family {
            CoinFamily::Account => Ok(ContractCallBuilder::new(self.params.clone())),
            CoinFamily::Utxo => Err(BuilderError::UnsupportedOperation(
                "contract calls are not supported on UTXO chains",
            )),
        }
    }

    /// Fresh transfer builder; UTXO-family coins only
    pub fn transfer_builder(&self) -> Result<UtxoTransactionBuilder, BuilderError> {
        match self.family {
            CoinFamily::Utxo => Ok(UtxoTransactionBuilder::new(self.params.clone())),
            CoinFamily::Account => Err(BuilderError::UnsupportedOperation(
                "native transfers are not supported on account chains",
            )),
        }
    }

    /// Restore a builder from the hex broadcast format
    ///
    /// The result is in Configuring state: fields may be changed and more
    /// signatures accumulated before rebuilding.
    pub fn from(&self, raw: &str) -> Result<RestoredBuilder, BuilderError> {
        let bytes = hex::decode(raw.trim())
            .map_err(|_| BuilderError::InvalidTransaction("not valid hex".to_string()))?;
        debug!(
            "restoring {} builder for {} from {} bytes",
            match self.family {
                CoinFamily::Account => "contract-call",
                CoinFamily::Utxo => "transfer",
            },
            self.params.chain,
            bytes.len()
        );
        match self.family {
            CoinFamily::Account => Ok(RestoredBuilder::ContractCall(
                ContractCallBuilder::from_wire(self.params.clone(), &bytes)?,
            )),
            CoinFamily::Utxo => Ok(RestoredBuilder::Transfer(
                UtxoTransactionBuilder::from_wire(self.params.clone(), &bytes)?,
            )),
        }
    }
}
