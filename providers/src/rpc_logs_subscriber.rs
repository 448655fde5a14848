use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::*;
use serde::Deserialize;
use solana_rpc_client_api::response::{Response, RpcLogsResponse};
use solana_sdk::commitment_config::CommitmentLevel;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;
use warden_core::{
    errors::{CoreError, CoreResult},
    LogsNotification, LogsProvider,
};

use crate::{
    errors::{ProvidersError, ProvidersResult},
    rpc_provider_config::RpcProviderConfig,
};

// -----------------
// Subscription Messages
// -----------------
#[derive(Debug, Deserialize)]
struct SubscriptionConfirmation {
    #[allow(unused)]
    id: u64,
    result: Option<u64>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LogsNotificationParams {
    result: Response<RpcLogsResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
enum PubsubNotification {
    LogsNotification { params: LogsNotificationParams },
}

fn logs_subscribe_request(commitment: CommitmentLevel) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "logsSubscribe",
        "params": [ "all", { "commitment": commitment.to_string() } ]
    })
    .to_string()
}

/// Parses a text message received on the logs subscription socket.
/// Returns `None` for anything that is not a logs notification.
fn parse_logs_notification(msg: &str) -> Option<LogsNotification> {
    match serde_json::from_str::<PubsubNotification>(msg) {
        Ok(PubsubNotification::LogsNotification { params }) => {
            Some(params.result.into())
        }
        Err(err) => {
            trace!("Ignoring pubsub message '{}' ({:?})", msg, err);
            None
        }
    }
}

// -----------------
// RpcLogsSubscriber
// -----------------
/// Subscribes to the transaction logs of the validator via its websocket
/// endpoint and forwards each notification on a channel.
pub struct RpcLogsSubscriber {
    config: RpcProviderConfig,
}

impl RpcLogsSubscriber {
    pub fn new(config: RpcProviderConfig) -> Self {
        Self { config }
    }

    pub async fn subscribe(
        &self,
    ) -> ProvidersResult<(mpsc::UnboundedReceiver<LogsNotification>, JoinHandle<()>)>
    {
        let url = Url::parse(self.config.ws_url())?;
        let (socket, _) = connect_async(url).await?;
        let (mut write, mut read) = socket.split();

        let commitment = self
            .config
            .commitment()
            .unwrap_or(CommitmentLevel::Confirmed);
        write
            .send(Message::Text(logs_subscribe_request(commitment)))
            .await?;

        // The first text message confirms the subscription
        loop {
            match read.next().await {
                Some(Ok(Message::Text(txt))) => {
                    let confirmation =
                        serde_json::from_str::<SubscriptionConfirmation>(&txt)?;
                    if let Some(err) = confirmation.error {
                        return Err(ProvidersError::SubscriptionRejected(
                            err.to_string(),
                        ));
                    }
                    debug!(
                        "Subscribed to logs with id {:?}",
                        confirmation.result
                    );
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err.into()),
                None => {
                    return Err(ProvidersError::SubscriptionRejected(
                        "socket closed before subscription was confirmed"
                            .to_string(),
                    ))
                }
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while let Some(next) = read.next().await {
                match next {
                    Ok(Message::Text(txt)) => {
                        if let Some(notification) =
                            parse_logs_notification(&txt)
                        {
                            if tx.send(notification).is_err() {
                                debug!("Logs receiver dropped, unsubscribing");
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        // Need to respond in order to keep the socket open
                        if let Err(err) = write.send(Message::Pong(data)).await
                        {
                            trace!("Failed to send pong: {:?}", err);
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        debug!("Logs socket closed: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!("Error reading logs message: {:?}", err);
                        break;
                    }
                }
            }
        });

        Ok((rx, handle))
    }
}

#[async_trait]
impl LogsProvider for RpcLogsSubscriber {
    async fn subscribe_logs(
        &self,
    ) -> CoreResult<mpsc::UnboundedReceiver<LogsNotification>> {
        // The forwarding task ends by itself once the socket closes or the
        // receiver is dropped
        let (rx, _handle) = self
            .subscribe()
            .await
            .map_err(|err| CoreError::LogsSubscriptionFailed(err.to_string()))?;
        Ok(rx)
    }
}
