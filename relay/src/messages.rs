//! Names of the messages exchanged with relay clients.
//! Requests are answered with the matching `respond:*` message.

pub const MSG_UPDATE_ADDRESS_LABELS: &str = "update:address-labels";
pub const ACK_UPDATE_ADDRESS_LABELS: &str = "ack:update:address-labels";
pub const MSG_GET_KNOWN_ADDRESS_LABELS: &str = "get:known-address-labels";
pub const MSG_UPDATE_ACCOUNT_STATES: &str = "update:account-states";

pub const MSG_REQUEST_ACCOUNT_STATES: &str = "request:account-states";
pub const MSG_RESPOND_ACCOUNT_STATES: &str = "respond:account-states";

pub const MSG_REQUEST_SNAPSHOT_SAVE: &str = "request:snapshot-save";
pub const MSG_RESPOND_SNAPSHOT_SAVE: &str = "respond:snapshot-save";

pub const MSG_REQUEST_ACCOUNT_SAVE: &str = "request:account-save";
pub const MSG_RESPOND_ACCOUNT_SAVE: &str = "respond:account-save";

pub const MSG_REQUEST_STORE_KEYPAIR: &str = "request:store-keypair";
pub const MSG_RESPOND_STORE_KEYPAIR: &str = "respond:store-keypair";

pub const MSG_REQUEST_LOAD_KEYPAIR: &str = "request:load-keypair";
pub const MSG_RESPOND_LOAD_KEYPAIR: &str = "respond:load-keypair";

pub const MSG_REQUEST_SET_ACCOUNT: &str = "request:set-account";
pub const MSG_RESPOND_SET_ACCOUNT: &str = "respond:set-account";

pub const MSG_REQUEST_LOAD_SNAPSHOT: &str = "request:load-snapshot";
pub const MSG_RESPOND_LOAD_SNAPSHOT: &str = "respond:load-snapshot";

pub const MSG_REQUEST_RESTART_VALIDATOR: &str = "request:restart-validator";
pub const MSG_RESPOND_RESTART_VALIDATOR: &str = "respond:restart-validator";

pub const MSG_REQUEST_RELAY_VERSION: &str = "request:relay-version";
pub const MSG_RESPOND_RELAY_VERSION: &str = "respond:relay-version";

pub const MSG_REQUEST_VALIDATOR_PID: &str = "request:validator-pid";
pub const MSG_RESPOND_VALIDATOR_PID: &str = "respond:validator-pid";

pub const MSG_REQUEST_KILL_WARDEN: &str = "request:kill-warden";
pub const MSG_RESPOND_KILL_WARDEN: &str = "respond:kill-warden";

/// Sent to a websocket client whose message could not be handled
pub const MSG_ERROR: &str = "error";
