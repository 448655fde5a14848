use std::{collections::HashMap, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use warden_relay::relay_version;
use warden_relay_pubsub::start_pubsub_server;
use warden_test_tools::{
    accounts::counter_account,
    relay::{stub_relay_handler, StubRelayHandler},
    validator_controller_stub::ValidatorControllerStub,
};
use warden_validator::RestoredState;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start() -> (TempDir, std::sync::Arc<StubRelayHandler>, String) {
    let dir = TempDir::new().unwrap();
    let (_, handler) = stub_relay_handler(
        dir.path(),
        ValidatorControllerStub::default(),
        RestoredState::default(),
    )
    .await;
    let (url, _) = start_pubsub_server(handler.clone(), Some("127.0.0.1:0"))
        .await
        .unwrap();
    (dir, handler, format!("ws://{}", url))
}

async fn connect(url: &str) -> Client {
    let (client, _) = connect_async(url).await.unwrap();
    client
}

async fn send(client: &mut Client, msg: Value) {
    client.send(Message::Text(msg.to_string())).await.unwrap();
}

async fn next_message(client: &mut Client) -> Value {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match client.next().await.unwrap().unwrap() {
                Message::Text(txt) => break serde_json::from_str(&txt).unwrap(),
                _ => continue,
            }
        }
    })
    .await
    .expect("timed out waiting for message")
}

async fn assert_no_message(client: &mut Client) {
    let res =
        tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(res.is_err(), "unexpected message: {:?}", res);
}

#[tokio::test]
async fn test_relay_version() {
    let (_dir, _handler, url) = start().await;
    let mut client = connect(&url).await;

    send(&mut client, json!({ "event": "request:relay-version" })).await;
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "respond:relay-version");
    assert_eq!(msg["args"][0]["result"], json!(relay_version()));
}

#[tokio::test]
async fn test_validator_pid() {
    let (_dir, _handler, url) = start().await;
    let mut client = connect(&url).await;

    send(&mut client, json!({ "event": "request:validator-pid", "args": [] }))
        .await;
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "respond:validator-pid");
    assert_eq!(msg["args"][0]["result"], 4242);
}

#[tokio::test]
async fn test_account_states_requests_subscribe_to_changes() {
    let (_dir, handler, url) = start().await;
    let mut client = connect(&url).await;
    let address = Pubkey::new_unique();

    send(
        &mut client,
        json!({ "event": "request:account-states", "args": [address.to_string()] }),
    )
    .await;
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "respond:account-states");
    assert_eq!(
        msg["args"][0]["result"],
        json!([address.to_string(), []])
    );

    // Changes of other accounts are not pushed
    handler
        .account_states()
        .await
        .update(Pubkey::new_unique(), 1, Some(counter_account(1)))
        .await
        .unwrap();
    handler
        .account_states()
        .await
        .update(address, 2, Some(counter_account(7)))
        .await
        .unwrap();

    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "update:account-states");
    assert_eq!(msg["args"][0], address.to_string());
    assert_eq!(msg["args"][1][0]["account"]["count"], 7);
    assert_eq!(msg["args"][1][0]["slot"], 2);
}

#[tokio::test]
async fn test_label_updates_are_broadcast_to_other_clients() {
    let (_dir, handler, url) = start().await;
    let mut sender = connect(&url).await;
    let mut receiver = connect(&url).await;

    // Make sure the receiver is registered before labels are sent
    send(&mut receiver, json!({ "event": "request:relay-version" })).await;
    next_message(&mut receiver).await;

    let address = Pubkey::new_unique().to_string();
    send(
        &mut sender,
        json!({
            "event": "update:address-labels",
            "args": [{ (address.clone()): "alice" }],
            "ack": true,
        }),
    )
    .await;

    let ack = next_message(&mut sender).await;
    assert_eq!(ack["event"], "ack:update:address-labels");

    let update = next_message(&mut receiver).await;
    assert_eq!(update["event"], "update:address-labels");
    assert_eq!(update["args"][0][&address], "alice");
    // Forwarded exactly as the sender sent them
    assert_eq!(update["args"], json!([{ (address.clone()): "alice" }]));

    // The sender does not get its own labels back
    assert_no_message(&mut sender).await;

    let mut expected = HashMap::new();
    expected.insert(address, "alice".to_string());
    assert_eq!(handler.known_labels().await, expected);
}

#[tokio::test]
async fn test_label_updates_without_ack() {
    let (_dir, _handler, url) = start().await;
    let mut client = connect(&url).await;

    send(
        &mut client,
        json!({
            "event": "update:address-labels",
            "args": [{ (Pubkey::new_unique().to_string()): "bob" }],
        }),
    )
    .await;
    assert_no_message(&mut client).await;

    send(&mut client, json!({ "event": "get:known-address-labels" })).await;
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "update:address-labels");
    let labels = msg["args"][0].as_object().unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels.values().next().unwrap(), "bob");
}

#[tokio::test]
async fn test_invalid_messages_are_answered_with_errors() {
    let (_dir, _handler, url) = start().await;
    let mut client = connect(&url).await;

    send(&mut client, json!({ "event": "request:unknown" })).await;
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "error");
    assert!(msg["args"][0].as_str().unwrap().contains("request:unknown"));

    client
        .send(Message::Text("not json".to_string()))
        .await
        .unwrap();
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "error");

    send(&mut client, json!({ "event": "update:address-labels", "args": [] }))
        .await;
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "error");
    assert!(msg["args"][0]
        .as_str()
        .unwrap()
        .contains("record of address labels"));

    // The connection stays usable
    send(&mut client, json!({ "event": "request:relay-version" })).await;
    let msg = next_message(&mut client).await;
    assert_eq!(msg["event"], "respond:relay-version");
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let (_dir, _handler, url) = start().await;
    let mut client = connect(&url).await;

    client.send(Message::Ping(vec![1, 2, 3])).await.unwrap();
    let pong = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Message::Pong(data) = client.next().await.unwrap().unwrap() {
                break data;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(pong, vec![1, 2, 3]);
}
