use std::sync::Arc;

use errors::RelayPubsubResult;
use log::*;
use tokio::{net::TcpListener, task::JoinHandle};
use warden_core::{AccountProvider, TransactionProvider};
use warden_relay::RelayHandler;
use warden_validator::ValidatorController;

mod accept_connection;
pub mod errors;
pub mod messages;
mod relay_pubsub;

pub use relay_pubsub::RelayPubsub;

pub const DEFAULT_RELAY_PUBSUB_URL: &str = "127.0.0.1:50475";

/// Starts the websocket transport of the relay.
/// Returns the address it listens on, which resolves the actual port if
/// port `0` was requested.
pub async fn start_pubsub_server<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
>(
    handler: Arc<RelayHandler<T, U, V>>,
    url: Option<&str>,
) -> RelayPubsubResult<(String, JoinHandle<()>)> {
    let url = url.unwrap_or(DEFAULT_RELAY_PUBSUB_URL);
    let listener = TcpListener::bind(url).await?;
    let local_addr = listener.local_addr()?.to_string();
    let relay = Arc::new(RelayPubsub::new(handler));
    let pubsub_handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let relay = relay.clone();
            tokio::spawn(async move {
                if let Err(err) =
                    accept_connection::accept_connection(relay, stream).await
                {
                    warn!("Relay connection failed: {}", err);
                }
            });
        }
    });

    Ok((local_addr, pubsub_handle))
}
