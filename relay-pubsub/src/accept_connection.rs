use std::{collections::HashSet, sync::Arc};

use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use log::*;
use serde_json::json;
use tokio::{
    net::TcpStream,
    sync::{broadcast::error::RecvError, mpsc},
};
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use warden_core::{AccountProvider, TransactionProvider};
use warden_relay::messages::MSG_UPDATE_ACCOUNT_STATES;
use warden_validator::ValidatorController;

use crate::{
    errors::RelayPubsubResult, messages::RelayMessage, relay_pubsub::RelayPubsub,
};

type ClientWriter = SplitSink<WebSocketStream<TcpStream>, Message>;

async fn send_message(
    write: &mut ClientWriter,
    msg: &RelayMessage,
) -> RelayPubsubResult<()> {
    let txt = serde_json::to_string(msg)?;
    write.send(Message::Text(txt)).await?;
    Ok(())
}

pub(crate) async fn accept_connection<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
>(
    relay: Arc<RelayPubsub<T, U, V>>,
    incoming_stream: TcpStream,
) -> RelayPubsubResult<()> {
    let addr = incoming_stream.peer_addr()?;
    let client_stream =
        tokio_tungstenite::accept_async(incoming_stream).await?;
    let connection_id = relay.next_connection_id();
    debug!("Client {} connected from {}", connection_id, addr);

    let (mut write_client, mut read_client) = client_stream.split();
    let mut account_changes = relay.handler.subscribe_account_changes();
    let mut label_updates = relay.label_updates.subscribe();
    let mut subscriptions = HashSet::new();

    // Requests are handled on their own task so pushes keep flowing while
    // a long running request like a restart is in flight
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel();
    let requests_handle = tokio::spawn(relay.clone().handle_requests(
        connection_id,
        requests_rx,
        outgoing_tx.clone(),
    ));

    loop {
        let res = tokio::select! {
            next = read_client.next() => {
                match next {
                    Some(Ok(Message::Text(txt))) => {
                        trace!("Client message: {}", txt);
                        match relay.parse_client_message(&txt, &mut subscriptions) {
                            Ok(request) => {
                                if requests_tx.send(request).is_err() {
                                    break;
                                }
                                Ok(())
                            }
                            Err(reply) => send_message(&mut write_client, &reply).await,
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write_client.send(Message::Pong(data)).await.map_err(Into::into)
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Client {} closed: {:?}", connection_id, frame);
                        break;
                    }
                    Some(Ok(_)) => Ok(()),
                    Some(Err(err)) => {
                        warn!("Error reading client message: {:?}", err);
                        break;
                    }
                    None => {
                        debug!("Client {} stream ended", connection_id);
                        break;
                    }
                }
            }
            Some(reply) = outgoing_rx.recv() => {
                send_message(&mut write_client, &reply).await
            }
            event = account_changes.recv() => {
                match event {
                    Ok(event) if subscriptions.contains(&event.address) => {
                        let msg = RelayMessage::new(
                            MSG_UPDATE_ACCOUNT_STATES,
                            vec![json!(event.address.to_string()), json!(event.states)],
                        );
                        send_message(&mut write_client, &msg).await
                    }
                    Ok(_) => Ok(()),
                    Err(RecvError::Lagged(count)) => {
                        warn!("Client {} missed {} account changes", connection_id, count);
                        Ok(())
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            update = label_updates.recv() => {
                match update {
                    Ok(update) if update.origin != connection_id => {
                        send_message(&mut write_client, &update.msg).await
                    }
                    Ok(_) => Ok(()),
                    Err(RecvError::Lagged(count)) => {
                        warn!("Client {} missed {} label updates", connection_id, count);
                        Ok(())
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        };
        if let Err(err) = res {
            debug!("Failed to write to client {}: {}", connection_id, err);
            break;
        }
    }

    requests_handle.abort();
    Ok(())
}
