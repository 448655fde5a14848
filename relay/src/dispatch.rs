use log::*;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use solana_sdk::clock::Slot;
use warden_core::{AccountProvider, AddressLabels, TransactionProvider};
use warden_persist::PersistedAccountInfo;
use warden_validator::ValidatorController;

use crate::{
    errors::{RelayError, RelayResult},
    RelayHandler, RelayReply, RelayRequest,
};

// -----------------
// Args
// -----------------
/// Deserializes the positional argument at `idx`, `None` if it is missing
/// or `null`
fn optional_arg<T: DeserializeOwned>(
    args: &[Value],
    idx: usize,
    name: &'static str,
) -> RelayResult<Option<T>> {
    match args.get(idx) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| RelayError::InvalidArgument {
                name,
                reason: err.to_string(),
            }),
    }
}

fn arg<T: DeserializeOwned>(
    args: &[Value],
    idx: usize,
    name: &'static str,
) -> RelayResult<T> {
    optional_arg(args, idx, name)?.ok_or(RelayError::MissingArgument(name))
}

fn to_value<T: Serialize>(payload: T) -> RelayResult<Value> {
    Ok(serde_json::to_value(payload)?)
}

// -----------------
// Dispatch
// -----------------
/// Invokes the handler operation for the request with the positional
/// `args` and returns the payload to send back to the client.
///
/// Operation failures are part of the payload as `{ err }`. An `Err` is only
/// returned when the request itself is malformed, i.e. an argument is
/// missing or has the wrong shape.
pub async fn dispatch_request<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
>(
    handler: &RelayHandler<T, U, V>,
    request: RelayRequest,
    args: &[Value],
) -> RelayResult<Value> {
    trace!("{} {:?}", request, args);
    use RelayRequest::*;
    match request {
        RelayVersion => to_value(handler.request_relay_version()),
        ValidatorPid => to_value(handler.request_validator_pid().await),
        Kill => to_value(handler.request_kill().await),
        UpdateAddressLabels => {
            let labels: AddressLabels = optional_arg(args, 0, "labels")?
                .ok_or(RelayError::MissingAddressLabels)?;
            handler.update_address_labels(&labels).await;
            to_value(RelayReply::ok(()))
        }
        GetKnownAddressLabels => {
            to_value(RelayReply::ok(handler.known_labels().await))
        }
        RestartValidator => {
            to_value(handler.request_restart_validator().await)
        }
        AccountStates => {
            let address: String = arg(args, 0, "address")?;
            to_value(RelayReply::ok(
                handler.request_account_states(&address).await,
            ))
        }
        AccountSave => {
            let address: String = arg(args, 0, "address")?;
            let slot: Option<Slot> = optional_arg(args, 1, "slot")?;
            to_value(RelayReply::ok(
                handler.request_account_save(&address, slot).await,
            ))
        }
        SnapshotSave => {
            let label: String = arg(args, 0, "label")?;
            to_value(handler.request_snapshot_save(&label).await)
        }
        LoadSnapshot => {
            let label: String = arg(args, 0, "label")?;
            to_value(handler.request_load_snapshot(&label).await)
        }
        StoreKeypair => {
            let id: String = arg(args, 0, "id")?;
            let secret_key: Vec<u8> = arg(args, 1, "secretKey")?;
            to_value(handler.request_store_keypair(&id, &secret_key).await)
        }
        LoadKeypair => {
            let id: String = arg(args, 0, "id")?;
            to_value(RelayReply::ok(handler.request_load_keypair(&id).await))
        }
        SetAccount => {
            let account: PersistedAccountInfo = arg(args, 0, "account")?;
            to_value(handler.request_set_account(account).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_args() {
        let args = vec![json!("label"), Value::Null, json!(3)];
        assert_eq!(arg::<String>(&args, 0, "label").unwrap(), "label");
        assert_eq!(optional_arg::<u64>(&args, 1, "slot").unwrap(), None);
        assert_eq!(optional_arg::<u64>(&args, 2, "slot").unwrap(), Some(3));
        assert!(matches!(
            arg::<String>(&args, 1, "id"),
            Err(RelayError::MissingArgument("id"))
        ));
        assert!(matches!(
            arg::<String>(&args, 5, "id"),
            Err(RelayError::MissingArgument("id"))
        ));
        assert!(matches!(
            arg::<String>(&args, 2, "label"),
            Err(RelayError::InvalidArgument { name: "label", .. })
        ));
    }
}
