//! Pinned broadcast bytes for fixed keys
//!
//! These fixtures freeze the wire layout: the private keys are the fixed
//! scalars 1, 2, 3, signing is deterministic (RFC 6979), and every byte of
//! the broadcast hex is asserted literally. Any change to the wire format
//! shows up here first.

use txforge::builder::TransactionBuilder;
use txforge::coin::Registry;
use txforge::crypto::{base58check_encode, hash160};

const POX_TESTNET: &str = "ST000000000000000000002AMW42H";
const TXID: &str = "3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b";

// scalars 1, 2, 3 as 32-byte big-endian hex
const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const KEY_TWO: &str = "0000000000000000000000000000000000000000000000000000000000000002";
const KEY_THREE: &str = "0000000000000000000000000000000000000000000000000000000000000003";

// compressed public keys of the scalars above
const PUB_ONE: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
const PUB_TWO: &str = "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5";
const PUB_THREE: &str = "02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9";

#[test]
fn unsigned_contract_call_broadcast_bytes() {
    let factory = Registry::standard().factory("tstx").unwrap();
    let mut builder = factory.contract_builder().unwrap();
    builder.fee(180).nonce(0);
    builder
        .contract_address(POX_TESTNET)
        .unwrap()
        .contract_name("pox")
        .unwrap()
        .function_name("delegate-stx")
        .unwrap();
    builder.from_pub_keys(&[PUB_ONE]).unwrap().number_signatures(1);
    let tx = builder.build().unwrap();

    // network 0x80 | nonce 0 | fee 180 | single-signer mode | threshold 1 |
    // 1 signer | no signatures | contract-call payload
    let expected = concat!(
        "80",
        "0000000000000000",
        "00000000000000b4",
        "000101",
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        "00",
        "02",
        "1d5354303030303030303030303030303030303030303032414d57343248",
        "03706f78",
        "0c64656c65676174652d737478",
        "00",
    );
    assert_eq!(tx.to_broadcast_format(), expected);
}

#[test]
fn two_of_three_signed_contract_call_broadcast_bytes() {
    let factory = Registry::standard().factory("tstx").unwrap();
    let mut builder = factory.contract_builder().unwrap();
    builder.fee(180).nonce(0);
    builder
        .contract_address(POX_TESTNET)
        .unwrap()
        .contract_name("pox")
        .unwrap()
        .function_name("delegate-stx")
        .unwrap();
    builder
        .from_pub_keys(&[PUB_ONE, PUB_TWO, PUB_THREE])
        .unwrap()
        .number_signatures(2);
    // sign in reverse key order; the serialized order is still by pubkey
    builder.sign(KEY_TWO).unwrap().sign(KEY_ONE).unwrap();
    let tx = builder.build().unwrap();
    assert!(tx.is_fully_signed());

    let expected = concat!(
        "80",
        "0000000000000000",
        "00000000000000b4",
        "010203",
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
        "02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
        "02",
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        "00",
        "0ededa5540500cc15913ba62e84f92c0ae66c5fb9953f5e873950d94f1a272ab",
        "79162f79dd8d0c48cd0792dcac1c2570f41127650779a41a9091a77d68192d50",
        "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
        "00",
        "cf62c1958d7afe9edbcffc813d5c1d64f295fc2d1a1a79831be4c7edb102ce9c",
        "018dd6d011edce51f4a054023bff5de78472b83d049e90da905a87ce441efe6e",
        "02",
        "1d5354303030303030303030303030303030303030303032414d57343248",
        "03706f78",
        "0c64656c65676174652d737478",
        "00",
    );
    assert_eq!(tx.to_broadcast_format(), expected);
}

#[test]
fn signed_transfer_broadcast_bytes() {
    let factory = Registry::standard().factory("tzec").unwrap();
    let params = factory.params().clone();
    let dest = base58check_encode(&params.pubkey_address_version, &hash160(b"dest"));

    let mut builder = factory.transfer_builder().unwrap();
    builder
        .add_input(TXID, 0, "sender", 100_000)
        .unwrap()
        .add_output(&dest, 90_000)
        .unwrap();
    builder.fee(10_000);
    builder.sign(KEY_ONE).unwrap();
    let tx = builder.build().unwrap();

    // overwintered version word | version group id | 1 input (reversed txid,
    // vout 0, 100-byte scriptSig, final sequence) | 1 output (90000 to the
    // P2PKH script) | locktime 0 | expiry 0
    let expected = concat!(
        "0400008085202f89",
        "01",
        "0b1a2d3f0b1a2d3f0b1a2d3f0b1a2d3f0b1a2d3f0b1a2d3f0b1a2d3f0b1a2d3f",
        "00000000",
        "64",
        "4101",
        "7376bc8d2bcbda1b6e8b056637789ed40165b2bf5fc6953977543256560c3b43",
        "3fa449d8861abe28e05a6d056fd6c1b4015c4783929f0ac96c589122cc506832",
        "21",
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        "ffffffff",
        "01",
        "905f010000000000",
        "1976a91495a05529371f9d107b22f3f620c197f897fe69c188ac",
        "00000000",
        "00000000",
    );
    assert_eq!(tx.to_broadcast_format(), expected);
}
