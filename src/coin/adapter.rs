//! Fork-aware coin adapter for UTXO recovery flows
//!
//! The adapter owns the knowledge a bare builder lacks: which fork header
//! triple is active, and which explorer to ask about an address. It stamps
//! builders before they sign and funds them from recovered unspents.

use std::time::Duration;

use log::info;
use thiserror::Error;

use crate::builder::{BuilderError, UtxoTransactionBuilder};
use crate::explorer::{AddressInfo, ExplorerClient, ExplorerError, Unspent};

use super::params::CoinParameters;

const EXPLORER_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised by adapter operations
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Coin parameters missing fork field: {0}")]
    MissingForkParameter(&'static str),
    #[error(transparent)]
    Explorer(#[from] ExplorerError),
    #[error(transparent)]
    Builder(#[from] BuilderError),
}

/// Binds a UTXO chain's parameters to its explorer
#[derive(Debug, Clone)]
pub struct UtxoCoinAdapter {
    params: CoinParameters,
    explorer: ExplorerClient,
}

impl UtxoCoinAdapter {
    pub fn new(params: CoinParameters) -> Result<Self, AdapterError> {
        let explorer = ExplorerClient::new(&params.explorer_base_url, EXPLORER_TIMEOUT)?;
        Ok(Self { params, explorer })
    }

    pub fn params(&self) -> &CoinParameters {
        &self.params
    }

    /// Stamp the active fork header triple onto a builder
    ///
    /// Required after `factory.from()`: the consensus branch id is not
    /// wire-carried, so a restored builder cannot sign until re-stamped.
    pub fn prepare_builder(
        &self,
        builder: &mut UtxoTransactionBuilder,
    ) -> Result<(), AdapterError> {
        let version = self
            .params
            .tx_version
            .ok_or(AdapterError::MissingForkParameter("tx_version"))?;
        let version_group_id = self
            .params
            .version_group_id
            .ok_or(AdapterError::MissingForkParameter("version_group_id"))?;
        let branch_id = self
            .params
            .consensus_branch_id
            .ok_or(AdapterError::MissingForkParameter("consensus_branch_id"))?;
        builder
            .version(version)
            .version_group_id(version_group_id)
            .consensus_branch_id(branch_id);
        Ok(())
    }

    /// Look up an address summary on the chain's explorer
    pub async fn address_info(&self, address: &str) -> Result<AddressInfo, AdapterError> {
        Ok(self.explorer.address_info(address).await?)
    }

    /// Recover the spendable unspents of an address
    pub async fn recover_unspents(&self, address: &str) -> Result<Vec<Unspent>, AdapterError> {
        let unspents = self.explorer.unspents(address).await?;
        info!(
            "recovered {} unspents for {} on {}",
            unspents.len(),
            address,
            self.params.chain
        );
        Ok(unspents)
    }

    /// Fund a builder with every recovered unspent of an address
    ///
    /// Returns the total value added; the caller decides outputs and fee.
    pub async fn fund_builder(
        &self,
        builder: &mut UtxoTransactionBuilder,
        address: &str,
    ) -> Result<u64, AdapterError> {
        let unspents = self.recover_unspents(address).await?;
        let mut total = 0u64;
        for unspent in &unspents {
            builder.add_input(&unspent.tx_id, unspent.n, &unspent.address, unspent.amount)?;
            total = total.saturating_add(unspent.amount);
        }
        Ok(total)
    }
}
