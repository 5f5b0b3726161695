//! End-to-end builder flows across both chain families

use serde_json::json;

use txforge::builder::{BuilderError, TransactionBuilder};
use txforge::coin::{CoinFamily, Network, Registry, UtxoCoinAdapter};
use txforge::crypto::{base58check_encode, hash160, KeyPair};
use txforge::transaction::Payload;
use txforge::TransactionType;

const POX_TESTNET: &str = "ST000000000000000000002AMW42H";
const TXID: &str = "3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b";

fn scalar_hex(kp: &KeyPair) -> String {
    hex::encode(kp.to_scalar().unwrap())
}

#[test]
fn contract_call_full_flow() {
    let registry = Registry::standard();
    let factory = registry.factory("tstx").unwrap();
    let kp = KeyPair::generate(Network::Testnet);

    let mut builder = factory.contract_builder().unwrap();
    builder.fee(180).nonce(0);
    builder
        .contract_address(POX_TESTNET)
        .unwrap()
        .contract_name("pox")
        .unwrap()
        .function_name("stack-stx")
        .unwrap();
    builder
        .function_args_json(&[
            json!({ "type": "uint128", "val": "400000000" }),
            json!({ "type": "principal", "val": POX_TESTNET }),
            json!({ "type": "uint128", "val": "200" }),
        ])
        .unwrap();
    builder.sign(&scalar_hex(&kp)).unwrap();

    let tx = builder.build().unwrap();
    assert_eq!(tx.tx_type(), TransactionType::ContractCall);
    assert!(tx.is_fully_signed());
    assert_eq!(tx.fee(), 180);
    assert_eq!(tx.nonce(), 0);

    // a contract call moves no native value
    assert_eq!(tx.inputs().len(), 1);
    assert_eq!(tx.inputs()[0].value, "0");
    assert_eq!(tx.outputs()[0].address, POX_TESTNET);
    assert_eq!(tx.outputs()[0].value, "0");

    let json = tx.to_json();
    assert_eq!(json["fee"], "180");
    assert_eq!(json["payload"]["functionName"], "stack-stx");
}

#[test]
fn contract_call_setter_order_does_not_change_bytes() {
    let registry = Registry::standard();
    let factory = registry.factory("tstx").unwrap();
    let k1 = KeyPair::generate(Network::Testnet);
    let k2 = KeyPair::generate(Network::Testnet);
    let pubs = [k1.public_key_hex(), k2.public_key_hex()];
    let pub_refs: Vec<&str> = pubs.iter().map(String::as_str).collect();

    let configure = |builder: &mut txforge::ContractCallBuilder| {
        builder.fee(200).nonce(3);
        builder
            .contract_address(POX_TESTNET)
            .unwrap()
            .contract_name("pox")
            .unwrap()
            .function_name("delegate-stx")
            .unwrap();
    };

    // sign before declaring the signer set, in one order
    let mut a = factory.contract_builder().unwrap();
    configure(&mut a);
    a.sign(&scalar_hex(&k1)).unwrap().sign(&scalar_hex(&k2)).unwrap();
    a.from_pub_keys(&pub_refs).unwrap().number_signatures(2);

    // declare first, sign in the reverse order
    let mut b = factory.contract_builder().unwrap();
    configure(&mut b);
    b.from_pub_keys(&pub_refs).unwrap().number_signatures(2);
    b.sign(&scalar_hex(&k2)).unwrap().sign(&scalar_hex(&k1)).unwrap();

    let tx_a = a.build().unwrap();
    let tx_b = b.build().unwrap();
    assert_eq!(tx_a.to_broadcast_format(), tx_b.to_broadcast_format());
    assert_eq!(tx_a.sender_address(), tx_b.sender_address());
}

#[test]
fn contract_call_round_trip_and_cosign() {
    let registry = Registry::standard();
    let factory = registry.factory("tstx").unwrap();
    let k1 = KeyPair::generate(Network::Testnet);
    let k2 = KeyPair::generate(Network::Testnet);
    let pubs = [k1.public_key_hex(), k2.public_key_hex()];
    let pub_refs: Vec<&str> = pubs.iter().map(String::as_str).collect();

    let mut builder = factory.contract_builder().unwrap();
    builder.fee(200).nonce(7);
    builder
        .contract_address(POX_TESTNET)
        .unwrap()
        .contract_name("pox")
        .unwrap()
        .function_name("delegate-stx")
        .unwrap();
    builder.from_pub_keys(&pub_refs).unwrap().number_signatures(2);
    builder.sign(&scalar_hex(&k1)).unwrap();
    let partial = builder.build().unwrap();
    assert!(!partial.is_fully_signed());

    // hand the hex to the second signer
    let mut restored = factory
        .from(&partial.to_broadcast_format())
        .unwrap()
        .into_contract_call()
        .unwrap();
    restored.sign(&scalar_hex(&k2)).unwrap();
    let full = restored.build().unwrap();
    assert!(full.is_fully_signed());
    assert_eq!(full.nonce(), 7);
    assert_eq!(full.sender_address(), partial.sender_address());
}

#[test]
fn contract_call_allow_list_is_per_network() {
    let registry = Registry::standard();
    let mainnet = registry.factory("stx").unwrap();
    let mut builder = mainnet.contract_builder().unwrap();
    assert!(matches!(
        builder.contract_address(POX_TESTNET).unwrap_err(),
        BuilderError::InvalidContractAddress(_)
    ));
    assert!(builder
        .contract_address("SP000000000000000000002Q6VF78")
        .is_ok());
}

#[test]
fn family_mismatch_is_rejected() {
    let registry = Registry::standard();
    assert_eq!(registry.get("tstx").unwrap().0, CoinFamily::Account);
    assert!(registry
        .factory("tstx")
        .unwrap()
        .transfer_builder()
        .is_err());
    assert!(registry
        .factory("tzec")
        .unwrap()
        .contract_builder()
        .is_err());
}

#[test]
fn utxo_transfer_full_flow() {
    let registry = Registry::standard();
    let factory = registry.factory("tzec").unwrap();
    let params = factory.params().clone();
    let kp = KeyPair::generate(Network::Testnet);
    let from = kp.address(&params.pubkey_address_version);
    let dest = base58check_encode(&params.pubkey_address_version, &hash160(b"dest"));

    let mut builder = factory.transfer_builder().unwrap();
    builder
        .add_input(TXID, 0, &from, 100_000)
        .unwrap()
        .add_output(&dest, 90_000)
        .unwrap();
    builder.fee(10_000);
    builder.sign(&scalar_hex(&kp)).unwrap();

    let tx = builder.build().unwrap();
    assert_eq!(tx.tx_type(), TransactionType::Transfer);
    assert!(tx.is_fully_signed());

    match tx.payload() {
        Payload::Transfer(transfer) => {
            assert_eq!(transfer.version, 4);
            assert_eq!(transfer.version_group_id, 0x892f2085);
        }
        other => panic!("expected transfer payload, got {other:?}"),
    }
}

#[test]
fn utxo_round_trip_requires_restamping() {
    let registry = Registry::standard();
    let factory = registry.factory("tzec").unwrap();
    let params = factory.params().clone();
    let kp = KeyPair::generate(Network::Testnet);
    let from = kp.address(&params.pubkey_address_version);
    let dest = base58check_encode(&params.pubkey_address_version, &hash160(b"dest"));

    let mut builder = factory.transfer_builder().unwrap();
    builder
        .add_input(TXID, 0, &from, 100_000)
        .unwrap()
        .add_output(&dest, 90_000)
        .unwrap();
    builder.fee(10_000);
    builder.sign(&scalar_hex(&kp)).unwrap();
    let tx = builder.build().unwrap();

    let mut restored = factory
        .from(&tx.to_broadcast_format())
        .unwrap()
        .into_transfer()
        .unwrap();

    // the branch id never rides the wire: signing is blocked until the
    // adapter stamps the active fork back on
    assert!(matches!(
        restored.sign(&scalar_hex(&kp)).unwrap_err(),
        BuilderError::MissingRequiredField("consensusBranchId")
    ));
    let adapter = UtxoCoinAdapter::new(params).unwrap();
    adapter.prepare_builder(&mut restored).unwrap();
    let rebuilt = restored.build().unwrap();
    assert_eq!(rebuilt.to_wire(), tx.to_wire());
}

#[test]
fn fork_header_mismatch_still_serializes() {
    // mixing one upgrade's version with another's branch id is the
    // network's problem, not the builder's
    let registry = Registry::standard();
    let factory = registry.factory("tzec").unwrap();
    let params = factory.params().clone();
    let kp = KeyPair::generate(Network::Testnet);
    let from = kp.address(&params.pubkey_address_version);
    let dest = base58check_encode(&params.pubkey_address_version, &hash160(b"dest"));

    let mut builder = factory.transfer_builder().unwrap();
    builder.consensus_branch_id(txforge::coin::HEARTWOOD_BRANCH_ID);
    builder
        .add_input(TXID, 0, &from, 100_000)
        .unwrap()
        .add_output(&dest, 90_000)
        .unwrap();
    builder.fee(10_000);
    builder.sign(&scalar_hex(&kp)).unwrap();
    let tx = builder.build().unwrap();
    assert!(!tx.to_broadcast_format().is_empty());
}
