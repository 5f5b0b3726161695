//! Transaction artifact and canonical serialization
//!
//! A `Transaction` is the immutable result of a successful `build()`:
//! a typed payload, fee, nonce, declared signer set, and accumulated
//! signatures. `to_broadcast_format()` and `to_json()` are pure
//! projections; nothing mutates a transaction after construction.

pub mod args;
pub mod signing;
pub mod wire;

use secp256k1::PublicKey;
use serde_json::Value;

use crate::coin::Network;
use crate::crypto::double_sha256;
use args::ArgValue;
use signing::SignatureSet;
use wire::{Reader, Writer, WireError};

/// Wire tag for a contract-call payload
pub(crate) const PAYLOAD_TAG_CONTRACT_CALL: u8 = 0x02;
/// Hash mode byte for a single-signer spending condition
pub(crate) const HASH_MODE_SINGLE: u8 = 0x00;
/// Hash mode byte for a threshold multisig spending condition
pub(crate) const HASH_MODE_MULTISIG: u8 = 0x01;
/// High bit of the UTXO version word signalling a post-fork transaction
pub(crate) const OVERWINTER_FLAG: u32 = 0x8000_0000;

/// Transaction families supported by the builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Transfer,
    ContractCall,
}

/// Normalized accounting view of one side of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEntry {
    pub address: String,
    pub value: String,
}

/// Account-model contract invocation payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallPayload {
    pub contract_address: String,
    pub contract_name: String,
    pub function_name: String,
    pub function_args: Vec<ArgValue>,
}

impl ContractCallPayload {
    pub fn encode(&self, w: &mut Writer) {
        w.put_u8(PAYLOAD_TAG_CONTRACT_CALL);
        w.put_short_string(&self.contract_address);
        w.put_short_string(&self.contract_name);
        w.put_short_string(&self.function_name);
        w.put_u8(self.function_args.len() as u8);
        for arg in &self.function_args {
            arg.encode(w);
        }
    }

    pub fn decode(r: &mut Reader) -> Result<Self, WireError> {
        let tag = r.read_u8()?;
        if tag != PAYLOAD_TAG_CONTRACT_CALL {
            return Err(WireError::Invalid(format!(
                "unexpected payload tag {tag:#04x}"
            )));
        }
        let contract_address = r.read_short_string()?;
        let contract_name = r.read_short_string()?;
        let function_name = r.read_short_string()?;
        let arg_count = r.read_u8()? as usize;
        let mut function_args = Vec::with_capacity(arg_count);
        for _ in 0..arg_count {
            function_args.push(ArgValue::decode(r)?);
        }
        Ok(Self {
            contract_address,
            contract_name,
            function_name,
            function_args,
        })
    }

    fn to_json(&self) -> Value {
        serde_json::json!({
            "contractAddress": self.contract_address,
            "contractName": self.contract_name,
            "functionName": self.function_name,
            "functionArgs": self.function_args.iter().map(ArgValue::to_json).collect::<Vec<_>>(),
        })
    }
}

/// A spend of one previously unspent output
///
/// `address` and `amount` are accounting metadata recovered from the
/// unspent; they are not part of the wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Transaction id of the spent output, big-endian
    pub tx_id: [u8; 32],
    /// Output index within that transaction
    pub index: u32,
    pub sequence: u32,
    pub script_sig: Vec<u8>,
    pub address: String,
    pub amount: u64,
}

impl TxInput {
    pub fn tx_id_hex(&self) -> String {
        hex::encode(self.tx_id)
    }
}

/// A newly created output: amount plus its locking script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: String,
    pub amount: u64,
    pub script: Vec<u8>,
}

/// UTXO-model transfer payload with fork-specific header fields
///
/// `consensus_branch_id` is part of the signing hash but deliberately not
/// part of the wire body, matching the reference chain: a deserialized
/// transaction must be re-stamped by the coin adapter before re-signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPayload {
    pub version: u32,
    pub version_group_id: u32,
    pub consensus_branch_id: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
    pub expiry_height: u32,
}

impl TransferPayload {
    /// Legacy little-endian layout; txids are serialized reversed
    pub fn encode(&self, w: &mut Writer) {
        w.put_u32_le(self.version | OVERWINTER_FLAG);
        w.put_u32_le(self.version_group_id);
        w.put_var_int(self.inputs.len() as u64);
        for input in &self.inputs {
            let mut reversed = input.tx_id;
            reversed.reverse();
            w.put_bytes(&reversed);
            w.put_u32_le(input.index);
            w.put_var_int(input.script_sig.len() as u64);
            w.put_bytes(&input.script_sig);
            w.put_u32_le(input.sequence);
        }
        w.put_var_int(self.outputs.len() as u64);
        for output in &self.outputs {
            w.put_u64_le(output.amount);
            w.put_var_int(output.script.len() as u64);
            w.put_bytes(&output.script);
        }
        w.put_u32_le(self.locktime);
        w.put_u32_le(self.expiry_height);
    }

    /// Decode wire bytes; the consensus branch id is not on the wire and
    /// must be supplied by the caller (normally the coin adapter).
    pub fn decode(r: &mut Reader) -> Result<Self, WireError> {
        let version_word = r.read_u32_le()?;
        if version_word & OVERWINTER_FLAG == 0 {
            return Err(WireError::Invalid(
                "missing post-fork version flag".to_string(),
            ));
        }
        let version = version_word & !OVERWINTER_FLAG;
        let version_group_id = r.read_u32_le()?;
        let input_count = r.read_var_int()? as usize;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let mut tx_id: [u8; 32] = r
                .read_bytes(32)?
                .try_into()
                .map_err(|_| WireError::UnexpectedEof)?;
            tx_id.reverse();
            let index = r.read_u32_le()?;
            let script_len = r.read_var_int()? as usize;
            let script_sig = r.read_bytes(script_len)?.to_vec();
            let sequence = r.read_u32_le()?;
            inputs.push(TxInput {
                tx_id,
                index,
                sequence,
                script_sig,
                address: String::new(),
                amount: 0,
            });
        }
        let output_count = r.read_var_int()? as usize;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let amount = r.read_u64_le()?;
            let script_len = r.read_var_int()? as usize;
            let script = r.read_bytes(script_len)?.to_vec();
            outputs.push(TxOutput {
                address: String::new(),
                amount,
                script,
            });
        }
        let locktime = r.read_u32_le()?;
        let expiry_height = r.read_u32_le()?;
        Ok(Self {
            version,
            version_group_id,
            consensus_branch_id: 0,
            inputs,
            outputs,
            locktime,
            expiry_height,
        })
    }

    /// Fork-salted signing hash shared by every input
    ///
    /// Double SHA-256 over the header triple (including the branch id, which
    /// the wire body omits), all outpoints and sequences, all outputs, and
    /// the lock/expiry fields. Mixing a version from one upgrade with the
    /// branch id of another still hashes; the network, not the builder,
    /// rejects the result.
    pub fn signing_hash(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_u32_le(self.version | OVERWINTER_FLAG);
        w.put_u32_le(self.version_group_id);
        w.put_u32_le(self.consensus_branch_id);
        w.put_var_int(self.inputs.len() as u64);
        for input in &self.inputs {
            let mut reversed = input.tx_id;
            reversed.reverse();
            w.put_bytes(&reversed);
            w.put_u32_le(input.index);
            w.put_u32_le(input.sequence);
        }
        w.put_var_int(self.outputs.len() as u64);
        for output in &self.outputs {
            w.put_u64_le(output.amount);
            w.put_var_int(output.script.len() as u64);
            w.put_bytes(&output.script);
        }
        w.put_u32_le(self.locktime);
        w.put_u32_le(self.expiry_height);
        double_sha256(&w.into_bytes())
    }

    fn to_json(&self) -> Value {
        serde_json::json!({
            "version": self.version,
            "versionGroupId": format!("{:#010x}", self.version_group_id),
            "consensusBranchId": format!("{:#010x}", self.consensus_branch_id),
            "inputs": self.inputs.iter().map(|i| serde_json::json!({
                "txId": i.tx_id_hex(),
                "index": i.index,
                "address": i.address,
                "value": i.amount.to_string(),
            })).collect::<Vec<_>>(),
            "outputs": self.outputs.iter().map(|o| serde_json::json!({
                "address": o.address,
                "value": o.amount.to_string(),
            })).collect::<Vec<_>>(),
            "locktime": self.locktime,
            "expiryHeight": self.expiry_height,
        })
    }
}

/// Typed payload variants, one per transaction family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    ContractCall(ContractCallPayload),
    Transfer(TransferPayload),
}

/// Wire byte identifying the network of an account-family transaction
pub(crate) fn network_wire_byte(network: Network) -> u8 {
    match network {
        Network::Mainnet => 0x00,
        Network::Testnet => 0x80,
    }
}

pub(crate) fn network_from_wire_byte(byte: u8) -> Result<Network, WireError> {
    match byte {
        0x00 => Ok(Network::Mainnet),
        0x80 => Ok(Network::Testnet),
        other => Err(WireError::Invalid(format!(
            "unknown network byte {other:#04x}"
        ))),
    }
}

/// Pre-signature image of a contract call: everything a signature commits to
///
/// Deliberately excludes the signer set, threshold, and accumulated
/// signatures so that the signing hash does not depend on the order in
/// which `sign`, `from_pub_keys`, and `number_signatures` were called.
pub(crate) fn contract_presign_image(
    network: Network,
    nonce: u64,
    fee: u64,
    payload: &ContractCallPayload,
) -> Vec<u8> {
    let mut w = Writer::new();
    w.put_u8(network_wire_byte(network));
    w.put_u64_be(nonce);
    w.put_u64_be(fee);
    payload.encode(&mut w);
    w.into_bytes()
}

/// An immutable, fully constructed transaction
#[derive(Debug, Clone)]
pub struct Transaction {
    payload: Payload,
    nonce: u64,
    fee: u64,
    network: Network,
    signers: Vec<PublicKey>,
    required_signatures: u8,
    signatures: SignatureSet,
    sender_address: String,
}

impl Transaction {
    /// Builders are the only constructors; see `builder::*::build()`
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        payload: Payload,
        nonce: u64,
        fee: u64,
        network: Network,
        signers: Vec<PublicKey>,
        required_signatures: u8,
        signatures: SignatureSet,
        sender_address: String,
    ) -> Self {
        Self {
            payload,
            nonce,
            fee,
            network,
            signers,
            required_signatures,
            signatures,
            sender_address,
        }
    }

    pub fn tx_type(&self) -> TransactionType {
        match self.payload {
            Payload::ContractCall(_) => TransactionType::ContractCall,
            Payload::Transfer(_) => TransactionType::Transfer,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn signers(&self) -> &[PublicKey] {
        &self.signers
    }

    pub fn required_signatures(&self) -> u8 {
        self.required_signatures
    }

    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    pub fn sender_address(&self) -> &str {
        &self.sender_address
    }

    /// Whether enough signatures have been collected for broadcast acceptance
    ///
    /// An under-threshold transaction still serializes; the network rejects
    /// it. This keeps offline co-signing workflows constructible.
    pub fn is_fully_signed(&self) -> bool {
        self.signatures.len() >= self.required_signatures as usize
    }

    /// Normalized input entries for accounting and display
    ///
    /// A contract call carries no native-asset transfer, so its single
    /// input entry has value zero addressed to the sender.
    pub fn inputs(&self) -> Vec<TransactionEntry> {
        match &self.payload {
            Payload::ContractCall(_) => vec![TransactionEntry {
                address: self.sender_address.clone(),
                value: "0".to_string(),
            }],
            Payload::Transfer(transfer) => transfer
                .inputs
                .iter()
                .map(|i| TransactionEntry {
                    address: i.address.clone(),
                    value: i.amount.to_string(),
                })
                .collect(),
        }
    }

    /// Normalized output entries for accounting and display
    pub fn outputs(&self) -> Vec<TransactionEntry> {
        match &self.payload {
            Payload::ContractCall(call) => vec![TransactionEntry {
                address: call.contract_address.clone(),
                value: "0".to_string(),
            }],
            Payload::Transfer(transfer) => transfer
                .outputs
                .iter()
                .map(|o| TransactionEntry {
                    address: o.address.clone(),
                    value: o.amount.to_string(),
                })
                .collect(),
        }
    }

    /// Canonical wire bytes of this transaction
    pub fn to_wire(&self) -> Vec<u8> {
        let mut w = Writer::new();
        match &self.payload {
            Payload::ContractCall(call) => {
                w.put_u8(network_wire_byte(self.network));
                w.put_u64_be(self.nonce);
                w.put_u64_be(self.fee);
                let hash_mode = if self.signers.len() > 1 {
                    HASH_MODE_MULTISIG
                } else {
                    HASH_MODE_SINGLE
                };
                w.put_u8(hash_mode);
                w.put_u8(self.required_signatures);
                w.put_u8(self.signers.len() as u8);
                for signer in &self.signers {
                    w.put_bytes(&signer.serialize());
                }
                w.put_u8(self.signatures.len() as u8);
                for signature in self.signatures.sorted() {
                    signature.encode(&mut w);
                }
                call.encode(&mut w);
            }
            Payload::Transfer(transfer) => {
                transfer.encode(&mut w);
            }
        }
        w.into_bytes()
    }

    /// The broadcast format: hex of the canonical wire bytes
    pub fn to_broadcast_format(&self) -> String {
        hex::encode(self.to_wire())
    }

    /// JSON projection for debugging and inspection; not a wire format
    pub fn to_json(&self) -> Value {
        let payload = match &self.payload {
            Payload::ContractCall(call) => call.to_json(),
            Payload::Transfer(transfer) => transfer.to_json(),
        };
        serde_json::json!({
            "type": match self.tx_type() {
                TransactionType::ContractCall => "ContractCall",
                TransactionType::Transfer => "Transfer",
            },
            "nonce": self.nonce,
            "fee": self.fee.to_string(),
            "numberSignatures": self.required_signatures,
            "signatures": self.signatures.sorted().iter().map(|s| serde_json::json!({
                "publicKey": s.public_key_hex(),
                "signature": hex::encode(s.signature),
                "recoveryId": s.recovery_id,
            })).collect::<Vec<_>>(),
            "payload": payload,
        })
    }
}
