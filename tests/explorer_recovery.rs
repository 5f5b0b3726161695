//! Explorer client and recovery adapter against a local mock explorer

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use txforge::builder::TransactionBuilderFactory;
use txforge::coin::{zcash_testnet, CoinFamily, UtxoCoinAdapter};
use txforge::explorer::{ExplorerClient, ExplorerError};

/// Serve one HTTP request with a canned JSON body and return the base URL
async fn mock_explorer(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 2048];
        let _ = socket.read(&mut request).await.unwrap();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn address_info_normalizes_explorer_payload() {
    let base = mock_explorer(
        r#"{ "addrStr": "t1abc", "txApperances": 12, "balanceSat": 340000, "balance": 0.0034 }"#,
    )
    .await;
    let client = ExplorerClient::new(&base, Duration::from_secs(5)).unwrap();
    let info = client.address_info("t1abc").await.unwrap();
    assert_eq!(info.tx_count, 12);
    assert_eq!(info.total_balance, 340_000);
}

#[tokio::test]
async fn unspents_normalize_explorer_payload() {
    let base = mock_explorer(
        r#"[{ "txid": "3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b",
             "address": "t1abc", "satoshis": 50000, "amount": 0.0005, "vout": 2 }]"#,
    )
    .await;
    let client = ExplorerClient::new(&base, Duration::from_secs(5)).unwrap();
    let unspents = client.unspents("t1abc").await.unwrap();
    assert_eq!(unspents.len(), 1);
    assert_eq!(unspents[0].amount, 50_000);
    assert_eq!(unspents[0].n, 2);
}

#[tokio::test]
async fn schema_drift_is_reported_not_swallowed() {
    let base = mock_explorer(r#"{ "balanceSat": 1 }"#).await;
    let client = ExplorerClient::new(&base, Duration::from_secs(5)).unwrap();
    let err = client.address_info("t1abc").await.unwrap_err();
    assert!(matches!(err, ExplorerError::SchemaMismatch("txApperances")));
}

#[tokio::test]
async fn unreachable_explorer_is_unavailable() {
    // nothing listens on this port; connection is refused
    let client = ExplorerClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let err = client.address_info("t1abc").await.unwrap_err();
    assert!(matches!(err, ExplorerError::Unavailable(_)));
}

#[tokio::test]
async fn adapter_funds_builder_from_recovered_unspents() {
    let base = mock_explorer(
        r#"[{ "txid": "3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b",
              "address": "t1abc", "satoshis": 60000, "vout": 0 },
            { "txid": "3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b3f2d1a0b",
              "address": "t1abc", "satoshis": 40000, "vout": 1 }]"#,
    )
    .await;
    let mut params = zcash_testnet();
    params.explorer_base_url = base;

    let adapter = UtxoCoinAdapter::new(params.clone()).unwrap();
    let factory = TransactionBuilderFactory::new(CoinFamily::Utxo, params);
    let mut builder = factory.transfer_builder().unwrap();
    let total = adapter.fund_builder(&mut builder, "t1abc").await.unwrap();
    assert_eq!(total, 100_000);
}
