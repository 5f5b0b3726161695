//! Account-model contract-call builder
//!
//! Builds a single-function smart-contract invocation. Policy checks run
//! at the setters (allow-listed contract address and name, recognized
//! function with a compatible argument schema) so no cryptographic work is
//! spent on a call the network would reject.

use log::debug;
use secp256k1::PublicKey;
use serde_json::Value;

use crate::coin::CoinParameters;
use crate::crypto::{
    address_from_public_key, multisig_address, public_key_from_hex, sha256, verify_signature,
    KeyPair,
};
use crate::transaction::args::ArgValue;
use crate::transaction::signing::{SignatureSet, TransactionSignature};
use crate::transaction::wire::Reader;
use crate::transaction::{
    contract_presign_image, network_from_wire_byte, ContractCallPayload, Payload, Transaction,
};

use super::{BuilderError, TransactionBuilder};

/// Builder for account-model contract-call transactions
#[derive(Debug, Clone)]
pub struct ContractCallBuilder {
    params: CoinParameters,
    fee: Option<u64>,
    nonce: Option<u64>,
    contract_address: Option<String>,
    contract_name: Option<String>,
    function_name: Option<String>,
    function_args: Vec<ArgValue>,
    signers: Vec<PublicKey>,
    required_signatures: Option<u8>,
    signatures: SignatureSet,
}

impl ContractCallBuilder {
    pub(crate) fn new(params: CoinParameters) -> Self {
        Self {
            params,
            fee: None,
            nonce: None,
            contract_address: None,
            contract_name: None,
            function_name: None,
            function_args: Vec::new(),
            signers: Vec::new(),
            required_signatures: None,
            signatures: SignatureSet::new(),
        }
    }

    /// Set the target contract address; must be allow-listed on the
    /// configured network
    pub fn contract_address(&mut self, address: &str) -> Result<&mut Self, BuilderError> {
        if !self.params.is_allowed_contract_address(address) {
            return Err(BuilderError::InvalidContractAddress(address.to_string()));
        }
        self.contract_address = Some(address.to_string());
        Ok(self)
    }

    /// Set the target contract name; must be allow-listed
    pub fn contract_name(&mut self, name: &str) -> Result<&mut Self, BuilderError> {
        if !self.params.is_allowed_contract_name(name) {
            return Err(BuilderError::UnsupportedContractName(name.to_string()));
        }
        self.contract_name = Some(name.to_string());
        Ok(self)
    }

    /// Set the function to invoke; must be a recognized entry with a schema
    pub fn function_name(&mut self, name: &str) -> Result<&mut Self, BuilderError> {
        if self.params.function_schema(name).is_none() {
            return Err(BuilderError::UnsupportedFunctionName(name.to_string()));
        }
        self.function_name = Some(name.to_string());
        Ok(self)
    }

    /// Set the typed argument list
    ///
    /// Arguments are checked against the function's schema immediately when
    /// the function is already set, and re-checked at `build()` so the
    /// setters stay order-tolerant.
    pub fn function_args(&mut self, args: Vec<ArgValue>) -> Result<&mut Self, BuilderError> {
        for arg in &args {
            arg.validate()?;
        }
        if args.len() > u8::MAX as usize {
            return Err(BuilderError::InvalidFunctionArgs(
                "too many arguments".to_string(),
            ));
        }
        if let Some(name) = &self.function_name {
            self.check_schema(name, &args)?;
        }
        self.function_args = args;
        Ok(self)
    }

    /// Set arguments from loosely-typed `{type, val}` JSON specs
    pub fn function_args_json(&mut self, specs: &[Value]) -> Result<&mut Self, BuilderError> {
        let mut args = Vec::with_capacity(specs.len());
        for spec in specs {
            args.push(ArgValue::from_json(spec)?);
        }
        self.function_args(args)
    }

    fn check_schema(&self, function: &str, args: &[ArgValue]) -> Result<(), BuilderError> {
        let schema = self
            .params
            .function_schema(function)
            .ok_or_else(|| BuilderError::UnsupportedFunctionName(function.to_string()))?;
        let kinds: Vec<_> = args.iter().map(ArgValue::kind).collect();
        if !schema.accepts(&kinds) {
            return Err(BuilderError::InvalidFunctionArgs(format!(
                "arguments {kinds:?} do not match the schema of {function}"
            )));
        }
        Ok(())
    }

    fn payload(&self) -> Result<ContractCallPayload, BuilderError> {
        Ok(ContractCallPayload {
            contract_address: self
                .contract_address
                .clone()
                .ok_or(BuilderError::MissingRequiredField("contractAddress"))?,
            contract_name: self
                .contract_name
                .clone()
                .ok_or(BuilderError::MissingRequiredField("contractName"))?,
            function_name: self
                .function_name
                .clone()
                .ok_or(BuilderError::MissingRequiredField("functionName"))?,
            function_args: self.function_args.clone(),
        })
    }

    /// Signing hash over the configuration accumulated so far
    ///
    /// Covers network, nonce, fee, and payload; excludes the signer set and
    /// threshold so signature validity does not depend on setter order.
    fn signing_hash(&self) -> Result<Vec<u8>, BuilderError> {
        let payload = self.payload()?;
        Ok(sha256(&contract_presign_image(
            self.params.network,
            self.nonce.unwrap_or(0),
            self.fee.unwrap_or(0),
            &payload,
        )))
    }

    /// Restore a builder from previously serialized wire bytes
    ///
    /// The builder comes back in Configuring state: fields may be inspected
    /// or mutated and further signatures accumulated before rebuilding.
    pub(crate) fn from_wire(params: CoinParameters, bytes: &[u8]) -> Result<Self, BuilderError> {
        let mut r = Reader::new(bytes);
        let network = network_from_wire_byte(r.read_u8()?)?;
        if network != params.network {
            return Err(BuilderError::InvalidTransaction(
                "serialized transaction belongs to a different network".to_string(),
            ));
        }
        let nonce = r.read_u64_be()?;
        let fee = r.read_u64_be()?;
        let _hash_mode = r.read_u8()?;
        let required_signatures = r.read_u8()?;
        let signer_count = r.read_u8()? as usize;
        let mut signers = Vec::with_capacity(signer_count);
        for _ in 0..signer_count {
            let bytes = r.read_bytes(33)?;
            signers.push(PublicKey::from_slice(bytes).map_err(|_| {
                BuilderError::InvalidTransaction("malformed signer key".to_string())
            })?);
        }
        let signature_count = r.read_u8()? as usize;
        let mut signatures = SignatureSet::new();
        for _ in 0..signature_count {
            signatures.push(TransactionSignature::decode(&mut r)?);
        }
        let payload = ContractCallPayload::decode(&mut r)?;
        r.expect_end()?;

        let mut builder = Self::new(params);
        builder
            .contract_address(&payload.contract_address)?
            .contract_name(&payload.contract_name)?
            .function_name(&payload.function_name)?
            .function_args(payload.function_args)?;
        builder.fee = Some(fee);
        builder.nonce = Some(nonce);
        builder.signers = signers;
        builder.required_signatures = Some(required_signatures);
        builder.signatures = signatures;
        Ok(builder)
    }
}

impl TransactionBuilder for ContractCallBuilder {
    fn fee(&mut self, fee: u64) -> &mut Self {
        self.fee = Some(fee);
        self
    }

    fn nonce(&mut self, nonce: u64) -> &mut Self {
        self.nonce = Some(nonce);
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
        let hash = self.signing_hash()?;
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
        let fee = self.fee.ok_or(BuilderError::MissingRequiredField("fee"))?;
        let nonce = self
            .nonce
            .ok_or(BuilderError::MissingRequiredField("nonce"))?;
        let payload = self.payload()?;

        // Re-run policy checks holistically: a network() call may have
        // swapped the allow-lists after a field was accepted
        if !self
            .params
            .is_allowed_contract_address(&payload.contract_address)
        {
            return Err(BuilderError::InvalidContractAddress(
                payload.contract_address,
            ));
        }
        if !self.params.is_allowed_contract_name(&payload.contract_name) {
            return Err(BuilderError::UnsupportedContractName(payload.contract_name));
        }
        self.check_schema(&payload.function_name, &payload.function_args)?;

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
        if self.signatures.len() > signers.len() {
            return Err(BuilderError::InvalidTransaction(
                "more signatures than declared signers".to_string(),
            ));
        }

        let hash = self.signing_hash()?;
        for signature in self.signatures.iter() {
            if !signers.contains(&signature.public_key) {
                return Err(BuilderError::InvalidSignature);
            }
            if !verify_signature(&signature.public_key, &hash, &signature.signature)? {
                return Err(BuilderError::InvalidSignature);
            }
        }

        let sender_address = if signers.len() == 1 {
            address_from_public_key(&signers[0], &self.params.pubkey_address_version)
        } else {
            multisig_address(required, &signers, &self.params.script_address_version)
        };

        debug!(
            "built contract call {}::{} with {}/{} signatures",
            payload.contract_address,
            payload.function_name,
            self.signatures.len(),
            required
        );

        Ok(Transaction::new(
            Payload::ContractCall(payload),
            nonce,
            fee,
            self.params.network,
            signers,
            required,
            self.signatures.clone(),
            sender_address,
        ))
    }
}
