use std::{str::FromStr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use hyper::header;
use log::*;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use warden_core::{AccountProvider, TransactionProvider};
use warden_relay::{
    dispatch_request, errors::RelayError, RelayHandler, RelayMethod,
    RelayRequest, RELAY_REST_PATH,
};
use warden_validator::ValidatorController;

/// Routes every relay request to `/relay/<request>`.
/// Unknown requests are answered with a `404`.
pub fn relay_router<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
>(
    handler: Arc<RelayHandler<T, U, V>>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            &format!("/{}/:request", RELAY_REST_PATH),
            any(handle_relay_request::<T, U, V>),
        )
        .fallback(not_found)
        .layer(cors)
        .with_state(handler)
}

// -----------------
// Responses
// -----------------
fn err_response(status: StatusCode, err: impl ToString) -> Response {
    (status, Json(json!({ "err": err.to_string() }))).into_response()
}

async fn not_found(uri: Uri) -> Response {
    debug!("No relay route for {}", uri);
    err_response(StatusCode::NOT_FOUND, format!("Not Found: {}", uri))
}

fn allows(method: &Method, expected: RelayMethod) -> bool {
    match expected {
        RelayMethod::Get => method == Method::GET,
        RelayMethod::Post => method == Method::POST,
    }
}

/// Args are sent as a JSON array, an empty body means no args
fn parse_args(body: &[u8]) -> Result<Vec<Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(vec![]);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(args)) => Ok(args),
        Ok(value) => Err(format!(
            "Body needs to be an array of arguments, got '{}'",
            value
        )),
        Err(err) => Err(format!("Body is not valid JSON: {}", err)),
    }
}

// -----------------
// Handler
// -----------------
async fn handle_relay_request<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
>(
    State(handler): State<Arc<RelayHandler<T, U, V>>>,
    method: Method,
    uri: Uri,
    Path(request): Path<String>,
    body: Bytes,
) -> Response {
    let Ok(request) = RelayRequest::from_str(&request) else {
        return not_found(uri).await;
    };
    if !allows(&method, request.method()) {
        return err_response(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{} needs to be {}", uri, request.method()),
        );
    }
    let args = match parse_args(&body) {
        Ok(args) => args,
        Err(err) => {
            debug!("Malformed body for {}: {}", request, err);
            return err_response(StatusCode::UNPROCESSABLE_ENTITY, err);
        }
    };

    match dispatch_request(&handler, request, &args).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err @ RelayError::InvalidArgument { .. }) => {
            err_response(StatusCode::UNPROCESSABLE_ENTITY, err)
        }
        Err(err) => {
            warn!("Failed to handle {}: {}", request, err);
            err_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal Server Error: {}", err),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(b"").unwrap(), Vec::<Value>::new());
        assert_eq!(parse_args(b"  \n").unwrap(), Vec::<Value>::new());
        assert_eq!(
            parse_args(br#"["label", 1]"#).unwrap(),
            vec![json!("label"), json!(1)]
        );
        assert!(parse_args(br#"{"label": 1}"#)
            .unwrap_err()
            .contains("array of arguments"));
        assert!(parse_args(b"[1,").unwrap_err().contains("not valid JSON"));
    }

    #[test]
    fn test_allows() {
        assert!(allows(&Method::GET, RelayMethod::Get));
        assert!(allows(&Method::POST, RelayMethod::Post));
        assert!(!allows(&Method::POST, RelayMethod::Get));
        assert!(!allows(&Method::PUT, RelayMethod::Post));
    }
}
