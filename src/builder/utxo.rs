//! UTXO-model transfer builder for the fork-aware chain
//!
//! Inputs and outputs accumulate in any order; a change output is computed
//! lazily so the signing hash seen by `sign()` equals the one `build()`
//! verifies against. The three fork header fields (version, version group
//! id, consensus branch id) must all be stamped before signing or building,
//! normally by the coin adapter.

use log::debug;
use secp256k1::PublicKey;

use crate::coin::CoinParameters;
use crate::crypto::{
    address_from_public_key, base58check_decode, base58check_encode, multisig_address,
    public_key_from_hex, verify_signature, KeyPair,
};
use crate::transaction::signing::{SignatureSet, TransactionSignature};
use crate::transaction::wire::{Reader, Writer};
use crate::transaction::{Payload, Transaction, TransferPayload, TxInput, TxOutput};

use super::{BuilderError, TransactionBuilder};

const SEQUENCE_FINAL: u32 = 0xffff_ffff;

fn checked_total(amounts: impl Iterator<Item = u64>) -> Result<u64, BuilderError> {
    amounts.into_iter().try_fold(0u64, |acc, amount| {
        acc.checked_add(amount)
            .ok_or_else(|| BuilderError::InvalidTransaction("amount overflow".to_string()))
    })
}

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// Build the locking script for a Base58Check address under these parameters
pub(crate) fn script_for_address(
    params: &CoinParameters,
    address: &str,
) -> Result<Vec<u8>, BuilderError> {
    let decoded =
        base58check_decode(address).map_err(|_| BuilderError::InvalidAddress(address.to_string()))?;
    let pubkey_version = &params.pubkey_address_version;
    let script_version = &params.script_address_version;
    if decoded.len() == pubkey_version.len() + 20 && decoded.starts_with(pubkey_version) {
        let hash = &decoded[pubkey_version.len()..];
        let mut script = vec![OP_DUP, OP_HASH160, 20];
        script.extend_from_slice(hash);
        script.push(OP_EQUALVERIFY);
        script.push(OP_CHECKSIG);
        return Ok(script);
    }
    if decoded.len() == script_version.len() + 20 && decoded.starts_with(script_version) {
        let hash = &decoded[script_version.len()..];
        let mut script = vec![OP_HASH160, 20];
        script.extend_from_slice(hash);
        script.push(OP_EQUAL);
        return Ok(script);
    }
    Err(BuilderError::InvalidAddress(address.to_string()))
}

/// Recover the address a locking script pays to, when it is a standard form
pub(crate) fn address_for_script(params: &CoinParameters, script: &[u8]) -> Option<String> {
    match script {
        [OP_DUP, OP_HASH160, 20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
            Some(base58check_encode(&params.pubkey_address_version, hash))
        }
        [OP_HASH160, 20, hash @ .., OP_EQUAL] if hash.len() == 20 => {
            Some(base58check_encode(&params.script_address_version, hash))
        }
        _ => None,
    }
}

/// Builder for UTXO-model transfer transactions
#[derive(Debug, Clone)]
pub struct UtxoTransactionBuilder {
    params: CoinParameters,
    version: Option<u32>,
    version_group_id: Option<u32>,
    consensus_branch_id: Option<u32>,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    change_address: Option<String>,
    fee: Option<u64>,
    locktime: u32,
    expiry_height: u32,
    signers: Vec<PublicKey>,
    required_signatures: Option<u8>,
    signatures: SignatureSet,
}

impl UtxoTransactionBuilder {
    pub(crate) fn new(params: CoinParameters) -> Self {
        let version = params.tx_version;
        let version_group_id = params.version_group_id;
        let consensus_branch_id = params.consensus_branch_id;
        Self {
            params,
            version,
            version_group_id,
            consensus_branch_id,
            inputs: Vec::new(),
            outputs: Vec::new(),
            change_address: None,
            fee: None,
            locktime: 0,
            expiry_height: 0,
            signers: Vec::new(),
            required_signatures: None,
            signatures: SignatureSet::new(),
        }
    }

    /// Stamp the transaction version for the active fork
    pub fn version(&mut self, version: u32) -> &mut Self {
        self.version = Some(version);
        self
    }

    /// Stamp the version group id for the active fork
    pub fn version_group_id(&mut self, version_group_id: u32) -> &mut Self {
        self.version_group_id = Some(version_group_id);
        self
    }

    /// Stamp the consensus branch id for the active fork
    ///
    /// The branch id salts the signing hash but never appears in the wire
    /// body, so a deserialized builder must be re-stamped before re-signing.
    pub fn consensus_branch_id(&mut self, branch_id: u32) -> &mut Self {
        self.consensus_branch_id = Some(branch_id);
        self
    }

    /// Add a previously unspent output as an input
    ///
    /// `tx_id` is the 64-character hex transaction id in display order;
    /// `address` and `amount` are accounting metadata from the unspent.
    pub fn add_input(
        &mut self,
        tx_id: &str,
        index: u32,
        address: &str,
        amount: u64,
    ) -> Result<&mut Self, BuilderError> {
        let bytes = hex::decode(tx_id)
            .map_err(|_| BuilderError::InvalidTransaction(format!("malformed txid {tx_id}")))?;
        let tx_id: [u8; 32] = bytes
            .try_into()
            .map_err(|_| BuilderError::InvalidTransaction("txid must be 32 bytes".to_string()))?;
        self.inputs.push(TxInput {
            tx_id,
            index,
            sequence: SEQUENCE_FINAL,
            script_sig: Vec::new(),
            address: address.to_string(),
            amount,
        });
        Ok(self)
    }

    /// Add a destination output; the address must parse under this chain's
    /// version prefixes
    pub fn add_output(&mut self, address: &str, amount: u64) -> Result<&mut Self, BuilderError> {
        let script = script_for_address(&self.params, address)?;
        self.outputs.push(TxOutput {
            address: address.to_string(),
            amount,
            script,
        });
        Ok(self)
    }

    /// Address that receives any value left after outputs and fee
    pub fn change_address(&mut self, address: &str) -> Result<&mut Self, BuilderError> {
        script_for_address(&self.params, address)?;
        self.change_address = Some(address.to_string());
        Ok(self)
    }

    pub fn locktime(&mut self, locktime: u32) -> &mut Self {
        self.locktime = locktime;
        self
    }

    pub fn expiry_height(&mut self, height: u32) -> &mut Self {
        self.expiry_height = height;
        self
    }

    fn input_total(&self) -> Result<u64, BuilderError> {
        checked_total(self.inputs.iter().map(|i| i.amount))
    }

    fn output_total(&self) -> Result<u64, BuilderError> {
        checked_total(self.outputs.iter().map(|o| o.amount))
    }

    /// Materialize the payload with the change output applied
    ///
    /// Called by both `sign()` and `build()` so the two see the same hash.
    fn payload(&self) -> Result<TransferPayload, BuilderError> {
        let version = self
            .version
            .ok_or(BuilderError::MissingRequiredField("version"))?;
        let version_group_id = self
            .version_group_id
            .ok_or(BuilderError::MissingRequiredField("versionGroupId"))?;
        let consensus_branch_id = self
            .consensus_branch_id
            .ok_or(BuilderError::MissingRequiredField("consensusBranchId"))?;
        if self.inputs.is_empty() {
            return Err(BuilderError::MissingRequiredField("inputs"));
        }
        if self.outputs.is_empty() {
            return Err(BuilderError::MissingRequiredField("outputs"));
        }

        let have = self.input_total()?;
        let spent = self.output_total()?;
        let mut outputs = self.outputs.clone();
        match self.fee {
            Some(fee) => {
                let need = spent.checked_add(fee).ok_or_else(|| {
                    BuilderError::InvalidTransaction("amount overflow".to_string())
                })?;
                if have < need {
                    return Err(BuilderError::InsufficientFunds { have, need });
                }
                let change = have - need;
                if change > 0 {
                    if let Some(address) = &self.change_address {
                        outputs.push(TxOutput {
                            address: address.clone(),
                            amount: change,
                            script: script_for_address(&self.params, address)?,
                        });
                    }
                    // without a change address the remainder is extra fee
                }
            }
            // no explicit fee: whatever the inputs leave over is the fee;
            // restored builders have no input amounts, so no funds check here
            None => {}
        }

        Ok(TransferPayload {
            version,
            version_group_id,
            consensus_branch_id,
            inputs: self.inputs.clone(),
            outputs,
            locktime: self.locktime,
            expiry_height: self.expiry_height,
        })
    }

    /// The unlocking script shared by every input: each sorted signature as
    /// a 65-byte recoverable push, then each signer's compressed key
    fn script_sig(&self) -> Vec<u8> {
        let mut w = Writer::new();
        for signature in self.signatures.sorted() {
            let mut recoverable = Vec::with_capacity(65);
            recoverable.push(signature.recovery_id);
            recoverable.extend_from_slice(&signature.signature);
            w.put_push(&recoverable);
            w.put_push(&signature.public_key.serialize());
        }
        w.into_bytes()
    }

    /// Restore a builder from previously serialized wire bytes
    ///
    /// Accumulated signatures are recovered from the input scripts. The
    /// consensus branch id is not wire-carried and comes back unset; the
    /// coin adapter re-stamps it before the builder can sign or build.
    pub(crate) fn from_wire(params: CoinParameters, bytes: &[u8]) -> Result<Self, BuilderError> {
        let mut r = Reader::new(bytes);
        let payload = TransferPayload::decode(&mut r)?;
        r.expect_end()?;

        let mut signatures = SignatureSet::new();
        if let Some(first) = payload.inputs.first() {
            let mut script = Reader::new(&first.script_sig);
            while script.remaining() > 0 {
                let recoverable = script.read_push()?;
                if recoverable.len() != 65 {
                    return Err(BuilderError::InvalidTransaction(
                        "malformed signature push".to_string(),
                    ));
                }
                let pubkey = script.read_push()?;
                let public_key = PublicKey::from_slice(pubkey).map_err(|_| {
                    BuilderError::InvalidTransaction("malformed public key push".to_string())
                })?;
                let signature: [u8; 64] = recoverable[1..]
                    .try_into()
                    .map_err(|_| BuilderError::InvalidTransaction("short signature".to_string()))?;
                signatures.push(TransactionSignature {
                    public_key,
                    recovery_id: recoverable[0],
                    signature,
                });
            }
        }

        let mut builder = Self::new(params.clone());
        builder.version = Some(payload.version);
        builder.version_group_id = Some(payload.version_group_id);
        builder.consensus_branch_id = None;
        builder.locktime = payload.locktime;
        builder.expiry_height = payload.expiry_height;
        builder.inputs = payload
            .inputs
            .into_iter()
            .map(|mut input| {
                input.script_sig = Vec::new();
                input
            })
            .collect();
        builder.outputs = payload
            .outputs
            .into_iter()
            .map(|mut output| {
                if output.address.is_empty() {
                    if let Some(address) = address_for_script(&params, &output.script) {
                        output.address = address;
                    }
                }
                output
            })
            .collect();
        builder.signatures = signatures;
        Ok(builder)
    }
}

impl TransactionBuilder for UtxoTransactionBuilder {
    fn fee(&mut self, fee: u64) -> &mut Self {
        self.fee = Some(fee);
        self
    }

    /// UTXO chains carry no account nonce; accepted and ignored so generic
    /// callers can treat builders uniformly
    fn nonce(&mut self, _nonce: u64) -> &mut Self {
        self
    }

    fn network(&mut self, params: CoinParameters) -> &mut Self {
        self.params = params;
        self
    }

    fn from_pub_keys(&mut self, pub_keys: &[&str]) -> Result<&mut Self, BuilderError> {
        let mut signers = Vec::with_capacity(pub_keys.len());
        for key in pub_keys {
            signers.push(public_key_from_hex(key)?);
        }
        if signers.len() > u8::MAX as usize {
            return Err(BuilderError::InvalidTransaction(
                "too many signers".to_string(),
            ));
        }
        self.signers = signers;
        Ok(self)
    }

    fn number_signatures(&mut self, required: u8) -> &mut Self {
        self.required_signatures = Some(required);
        self
    }

    fn sign(&mut self, key: &str) -> Result<&mut Self, BuilderError> {
        let key_pair = KeyPair::from_private_key_hex(key, self.params.network)
            .map_err(|_| BuilderError::UnsupportedPrivateKey)?;
        let hash = self.payload()?.signing_hash();
        let (recovery_id, signature) = key_pair.sign_hash(&hash)?;
        debug!(
            "accumulated signature from {} ({} total)",
            key_pair.public_key_hex(),
            self.signatures.len() + 1
        );
        self.signatures.push(TransactionSignature {
            public_key: *key_pair.public_key(),
            recovery_id,
            signature,
        });
        Ok(self)
    }

    fn build(&self) -> Result<Transaction, BuilderError> {
        let mut payload = self.payload()?;

        let signers = if self.signers.is_empty() {
            self.signatures.signer_keys()
        } else {
            self.signers.clone()
        };
        if signers.is_empty() {
            return Err(BuilderError::MissingRequiredField("sender"));
        }

        let required = self.required_signatures.unwrap_or(1);
        if required == 0 {
            return Err(BuilderError::InvalidTransaction(
                "signature threshold must be at least 1".to_string(),
            ));
        }
        if required as usize > signers.len() {
            return Err(BuilderError::InvalidTransaction(format!(
                "threshold {} exceeds signer count {}",
                required,
                signers.len()
            )));
        }

        let hash = payload.signing_hash();
        for signature in self.signatures.iter() {
            if !signers.contains(&signature.public_key) {
                return Err(BuilderError::InvalidSignature);
            }
            if !verify_signature(&signature.public_key, &hash, &signature.signature)? {
                return Err(BuilderError::InvalidSignature);
            }
        }

        let script_sig = self.script_sig();
        for input in &mut payload.inputs {
            input.script_sig = script_sig.clone();
        }

        let fee = match self.fee {
            Some(fee) => fee,
            None => self.input_total()?.saturating_sub(self.output_total()?),
        };

        let sender_address = if signers.len() == 1 {
            address_from_public_key(&signers[0], &self.params.pubkey_address_version)
        } else {
            multisig_address(required, &signers, &self.params.script_address_version)
        };

        debug!(
            "built transfer with {} inputs, {} outputs, {}/{} signatures",
            payload.inputs.len(),
            payload.outputs.len(),
            self.signatures.len(),
            required
        );

        Ok(Transaction::new(
            Payload::Transfer(payload),
            0,
            fee,
            self.params.network,
            signers,
            required,
            self.signatures.clone(),
            sender_address,
        ))
    }
}
