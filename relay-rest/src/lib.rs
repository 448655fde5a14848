use std::sync::Arc;

use errors::RelayRestResult;
use log::*;
use tokio::{net::TcpListener, task::JoinHandle};
use warden_core::{AccountProvider, TransactionProvider};
use warden_relay::RelayHandler;
use warden_validator::ValidatorController;

pub mod errors;
mod router;

pub use router::relay_router;

pub const DEFAULT_RELAY_REST_URL: &str = "127.0.0.1:50474";

/// Starts the REST transport of the relay and returns the address it
/// listens on
pub async fn start_rest_server<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
>(
    handler: Arc<RelayHandler<T, U, V>>,
    url: Option<&str>,
) -> RelayRestResult<(String, JoinHandle<()>)> {
    let url = url.unwrap_or(DEFAULT_RELAY_REST_URL);
    let listener = TcpListener::bind(url).await?;
    let local_addr = listener.local_addr()?.to_string();
    let app = relay_router(handler);
    let rest_handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Relay REST server stopped: {}", err);
        }
    });
    Ok((local_addr, rest_handle))
}
