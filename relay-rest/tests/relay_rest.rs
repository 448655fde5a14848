use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use tempfile::TempDir;
use tower::ServiceExt;
use warden_relay::relay_version;
use warden_relay_rest::relay_router;
use warden_test_tools::{
    relay::stub_relay_handler,
    validator_controller_stub::ValidatorControllerStub,
};
use warden_validator::RestoredState;

async fn setup_with(validator: ValidatorControllerStub) -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let (_, handler) =
        stub_relay_handler(dir.path(), validator, RestoredState::default())
            .await;
    (dir, relay_router(handler))
}

async fn setup() -> (TempDir, Router) {
    setup_with(ValidatorControllerStub::default()).await
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = match body {
        Some(body) => Body::from(body.to_string()),
        None => Body::empty(),
    };
    send(app, method, uri, body).await
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Body,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_get_relay_version() {
    let (_dir, app) = setup().await;
    let (status, body) =
        request(&app, Method::GET, "/relay/request:relay-version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": relay_version() }));
}

#[tokio::test]
async fn test_get_validator_pid() {
    let (_dir, app) = setup().await;
    let (status, body) =
        request(&app, Method::GET, "/relay/request:validator-pid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": 4242 }));

    // Application errors are still handled requests
    let (_dir, app) = setup_with(ValidatorControllerStub::new(None)).await;
    let (status, body) =
        request(&app, Method::GET, "/relay/request:validator-pid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["err"].as_str().unwrap().contains("no validator"));
}

#[tokio::test]
async fn test_update_and_get_address_labels() {
    let (_dir, app) = setup().await;
    let address = Pubkey::new_unique().to_string();

    let (status, body) = request(
        &app,
        Method::POST,
        "/relay/update:address-labels",
        Some(json!([{ (address.clone()): "alice" }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": null }));

    let (status, body) =
        request(&app, Method::GET, "/relay/get:known-address-labels", None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"][&address], "alice");
}

#[tokio::test]
async fn test_update_address_labels_with_empty_body() {
    let (_dir, app) = setup().await;
    let (status, body) =
        request(&app, Method::POST, "/relay/update:address-labels", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err = body["err"].as_str().unwrap();
    assert!(err.starts_with("Internal Server Error"), "{}", err);
    assert!(err.contains("record of address labels"), "{}", err);
}

#[tokio::test]
async fn test_account_states_of_unknown_account() {
    let (_dir, app) = setup().await;
    let address = Pubkey::new_unique().to_string();
    let (status, body) = request(
        &app,
        Method::GET,
        "/relay/request:account-states",
        Some(json!([address.clone()])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": [address, []] }));
}

#[tokio::test]
async fn test_account_states_needs_get() {
    let (_dir, app) = setup().await;
    let (status, body) = request(
        &app,
        Method::POST,
        "/relay/request:account-states",
        Some(json!([Pubkey::new_unique().to_string()])),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body["err"],
        "/relay/request:account-states needs to be GET"
    );
}

#[tokio::test]
async fn test_wrong_method() {
    let (_dir, app) = setup().await;
    let (status, body) =
        request(&app, Method::GET, "/relay/request:snapshot-save", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body["err"],
        "/relay/request:snapshot-save needs to be POST"
    );

    let (status, body) =
        request(&app, Method::POST, "/relay/request:relay-version", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["err"].as_str().unwrap().ends_with("needs to be GET"));
}

#[tokio::test]
async fn test_unknown_routes() {
    let (_dir, app) = setup().await;
    let (status, _) =
        request(&app, Method::GET, "/relay/request:unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&app, Method::GET, "/somewhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body() {
    let (_dir, app) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/relay/request:snapshot-save",
        Body::from("[\"label\""),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["err"].as_str().unwrap().contains("not valid JSON"));

    let (status, body) = request(
        &app,
        Method::POST,
        "/relay/request:snapshot-save",
        Some(json!([42])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["err"].as_str().unwrap().contains("label"));
}
