use std::{
    collections::HashSet,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::*;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::{broadcast, mpsc};
use warden_core::{AccountProvider, TransactionProvider};
use warden_relay::{
    dispatch_request,
    messages::{ACK_UPDATE_ADDRESS_LABELS, MSG_UPDATE_ADDRESS_LABELS},
    RelayHandler, RelayRequest,
};
use warden_validator::ValidatorController;

use crate::messages::RelayMessage;

pub(crate) type ConnectionId = u64;

const LABEL_UPDATES_CAPACITY: usize = 256;

/// Labels sent by one client which are forwarded to all others
#[derive(Debug, Clone)]
pub(crate) struct LabelsUpdate {
    pub origin: ConnectionId,
    pub msg: RelayMessage,
}

/// Shared by all websocket connections
pub struct RelayPubsub<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
> {
    pub(crate) handler: Arc<RelayHandler<T, U, V>>,
    pub(crate) label_updates: broadcast::Sender<LabelsUpdate>,
    next_connection_id: AtomicU64,
}

impl<T: AccountProvider, U: TransactionProvider, V: ValidatorController>
    RelayPubsub<T, U, V>
{
    pub fn new(handler: Arc<RelayHandler<T, U, V>>) -> Self {
        let (label_updates, _) = broadcast::channel(LABEL_UPDATES_CAPACITY);
        Self {
            handler,
            label_updates,
            next_connection_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Parses the text sent by a client into a request.
    /// Addresses whose account states are requested are added to the
    /// `subscriptions` of the connection right away, so no change is missed
    /// while the request is queued.
    pub(crate) fn parse_client_message(
        &self,
        txt: &str,
        subscriptions: &mut HashSet<Pubkey>,
    ) -> Result<(RelayRequest, RelayMessage), RelayMessage> {
        let msg = serde_json::from_str::<RelayMessage>(txt).map_err(|err| {
            RelayMessage::error(format!("Invalid message '{}': {}", txt, err))
        })?;
        let request = RelayRequest::from_str(&msg.event)
            .map_err(RelayMessage::error)?;

        if request == RelayRequest::AccountStates {
            if let Some(pubkey) = msg
                .args
                .first()
                .and_then(Value::as_str)
                .and_then(|x| Pubkey::from_str(x).ok())
            {
                if subscriptions.insert(pubkey) {
                    trace!("Subscribed to account states of {}", pubkey);
                }
            }
        }
        Ok((request, msg))
    }

    /// Handles the requests of one connection in the order they were sent.
    /// Replies are queued on `outgoing`.
    pub(crate) async fn handle_requests(
        self: Arc<Self>,
        connection_id: ConnectionId,
        mut requests: mpsc::UnboundedReceiver<(RelayRequest, RelayMessage)>,
        outgoing: mpsc::UnboundedSender<RelayMessage>,
    ) {
        while let Some((request, msg)) = requests.recv().await {
            let replies = self.handle_request(connection_id, request, msg).await;
            for reply in replies {
                if outgoing.send(reply).is_err() {
                    return;
                }
            }
        }
    }

    async fn handle_request(
        &self,
        connection_id: ConnectionId,
        request: RelayRequest,
        msg: RelayMessage,
    ) -> Vec<RelayMessage> {
        let payload =
            match dispatch_request(&self.handler, request, &msg.args).await {
                Ok(payload) => payload,
                Err(err) => {
                    debug!("Failed to handle {}: {}", request, err);
                    return vec![RelayMessage::error(err)];
                }
            };

        // Labels are always pushed as `[labels]`, the same shape clients
        // send them in
        if request == RelayRequest::GetKnownAddressLabels {
            let labels = payload.get("result").cloned().unwrap_or_default();
            return vec![RelayMessage::new(
                MSG_UPDATE_ADDRESS_LABELS,
                vec![labels],
            )];
        }

        if request == RelayRequest::UpdateAddressLabels {
            let labels = msg.args.first().cloned().unwrap_or_default();
            trace!("Broadcasting address labels update");
            // Fails if no other client is connected which is fine
            let _ = self.label_updates.send(LabelsUpdate {
                origin: connection_id,
                msg: RelayMessage::new(MSG_UPDATE_ADDRESS_LABELS, vec![labels]),
            });
            return if msg.ack {
                vec![RelayMessage::new(ACK_UPDATE_ADDRESS_LABELS, vec![])]
            } else {
                vec![]
            };
        }

        match request.response_message() {
            Some(event) => vec![RelayMessage::new(event, vec![payload])],
            None => vec![],
        }
    }
}
