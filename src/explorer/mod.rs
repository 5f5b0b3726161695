//! Block explorer HTTP client used for recovery flows
//!
//! Talks to an insight-style REST API and normalizes its quirky field
//! names (`txApperances`, `balanceSat`, `satoshis`, `vout`) into stable
//! structs. Network failures and schema drift are distinct errors so a
//! recovery tool can tell "retry later" from "explorer changed".

use std::time::Duration;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by explorer lookups
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Explorer unavailable: {0}")]
    Unavailable(String),
    #[error("Explorer response missing field: {0}")]
    SchemaMismatch(&'static str),
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Normalized address summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInfo {
    /// Number of transactions the address appears in
    pub tx_count: u64,
    /// Confirmed balance in base units
    pub total_balance: u64,
}

/// Normalized unspent output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unspent {
    pub tx_id: String,
    pub address: String,
    /// Value in base units
    pub amount: u64,
    /// Output index within the funding transaction
    pub n: u32,
}

/// Raw insight-style address payload; note the upstream typo in
/// `txApperances`, which we must match byte for byte
#[derive(Debug, Deserialize)]
struct RawAddressInfo {
    #[serde(rename = "txApperances")]
    tx_appearances: Option<u64>,
    #[serde(rename = "balanceSat")]
    balance_sat: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawUnspent {
    txid: Option<String>,
    address: Option<String>,
    satoshis: Option<u64>,
    vout: Option<u32>,
}

fn normalize_address_info(raw: RawAddressInfo) -> Result<AddressInfo, ExplorerError> {
    Ok(AddressInfo {
        tx_count: raw
            .tx_appearances
            .ok_or(ExplorerError::SchemaMismatch("txApperances"))?,
        total_balance: raw
            .balance_sat
            .ok_or(ExplorerError::SchemaMismatch("balanceSat"))?,
    })
}

fn normalize_unspent(raw: RawUnspent) -> Result<Unspent, ExplorerError> {
    Ok(Unspent {
        tx_id: raw.txid.ok_or(ExplorerError::SchemaMismatch("txid"))?,
        address: raw
            .address
            .ok_or(ExplorerError::SchemaMismatch("address"))?,
        amount: raw
            .satoshis
            .ok_or(ExplorerError::SchemaMismatch("satoshis"))?,
        n: raw.vout.ok_or(ExplorerError::SchemaMismatch("vout"))?,
    })
}

/// HTTP client bound to one explorer base URL
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    base_url: String,
    http: reqwest::Client,
}

impl ExplorerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExplorerError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}/addr/{address}`
    pub async fn address_info(&self, address: &str) -> Result<AddressInfo, ExplorerError> {
        let url = format!("{}/addr/{}", self.base_url, address);
        debug!("fetching address info from {url}");
        let raw: RawAddressInfo = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        normalize_address_info(raw)
    }

    /// GET `{base}/addr/{address}/utxo`
    pub async fn unspents(&self, address: &str) -> Result<Vec<Unspent>, ExplorerError> {
        let url = format!("{}/addr/{}/utxo", self.base_url, address);
        debug!("fetching unspents from {url}");
        let raw: Vec<RawUnspent> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        raw.into_iter().map(normalize_unspent).collect()
    }
}
