use std::{fmt, str::FromStr};

use warden_addresses::consts::RELAY_URI;

use crate::{
    errors::{RelayError, RelayResult},
    messages::*,
};

/// Path segment under which the REST transport serves requests
pub const RELAY_REST_PATH: &str = "relay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMethod {
    Get,
    Post,
}

impl fmt::Display for RelayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayMethod::Get => write!(f, "GET"),
            RelayMethod::Post => write!(f, "POST"),
        }
    }
}

/// Every request the relay handles, regardless of transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayRequest {
    UpdateAddressLabels,
    GetKnownAddressLabels,
    AccountStates,
    SnapshotSave,
    AccountSave,
    StoreKeypair,
    LoadKeypair,
    SetAccount,
    LoadSnapshot,
    RestartValidator,
    RelayVersion,
    ValidatorPid,
    Kill,
}

impl RelayRequest {
    pub const ALL: [RelayRequest; 13] = [
        RelayRequest::UpdateAddressLabels,
        RelayRequest::GetKnownAddressLabels,
        RelayRequest::AccountStates,
        RelayRequest::SnapshotSave,
        RelayRequest::AccountSave,
        RelayRequest::StoreKeypair,
        RelayRequest::LoadKeypair,
        RelayRequest::SetAccount,
        RelayRequest::LoadSnapshot,
        RelayRequest::RestartValidator,
        RelayRequest::RelayVersion,
        RelayRequest::ValidatorPid,
        RelayRequest::Kill,
    ];

    pub fn as_str(&self) -> &'static str {
        use RelayRequest::*;
        match self {
            UpdateAddressLabels => MSG_UPDATE_ADDRESS_LABELS,
            GetKnownAddressLabels => MSG_GET_KNOWN_ADDRESS_LABELS,
            AccountStates => MSG_REQUEST_ACCOUNT_STATES,
            SnapshotSave => MSG_REQUEST_SNAPSHOT_SAVE,
            AccountSave => MSG_REQUEST_ACCOUNT_SAVE,
            StoreKeypair => MSG_REQUEST_STORE_KEYPAIR,
            LoadKeypair => MSG_REQUEST_LOAD_KEYPAIR,
            SetAccount => MSG_REQUEST_SET_ACCOUNT,
            LoadSnapshot => MSG_REQUEST_LOAD_SNAPSHOT,
            RestartValidator => MSG_REQUEST_RESTART_VALIDATOR,
            RelayVersion => MSG_REQUEST_RELAY_VERSION,
            ValidatorPid => MSG_REQUEST_VALIDATOR_PID,
            Kill => MSG_REQUEST_KILL_WARDEN,
        }
    }

    /// Message a websocket client receives in response to the request.
    /// Known labels are answered with a label update and a label update
    /// itself is only acknowledged if the client asked for it.
    pub fn response_message(&self) -> Option<&'static str> {
        use RelayRequest::*;
        match self {
            UpdateAddressLabels => None,
            GetKnownAddressLabels => Some(MSG_UPDATE_ADDRESS_LABELS),
            AccountStates => Some(MSG_RESPOND_ACCOUNT_STATES),
            SnapshotSave => Some(MSG_RESPOND_SNAPSHOT_SAVE),
            AccountSave => Some(MSG_RESPOND_ACCOUNT_SAVE),
            StoreKeypair => Some(MSG_RESPOND_STORE_KEYPAIR),
            LoadKeypair => Some(MSG_RESPOND_LOAD_KEYPAIR),
            SetAccount => Some(MSG_RESPOND_SET_ACCOUNT),
            LoadSnapshot => Some(MSG_RESPOND_LOAD_SNAPSHOT),
            RestartValidator => Some(MSG_RESPOND_RESTART_VALIDATOR),
            RelayVersion => Some(MSG_RESPOND_RELAY_VERSION),
            ValidatorPid => Some(MSG_RESPOND_VALIDATOR_PID),
            Kill => Some(MSG_RESPOND_KILL_WARDEN),
        }
    }

    /// Requests that only read state are served via GET, everything else
    /// needs a POST. Arguments of a GET are sent as body as well.
    pub fn method(&self) -> RelayMethod {
        use RelayRequest::*;
        match self {
            GetKnownAddressLabels | AccountStates | RelayVersion
            | ValidatorPid => RelayMethod::Get,
            UpdateAddressLabels | SnapshotSave | AccountSave
            | StoreKeypair | LoadKeypair | SetAccount | LoadSnapshot
            | RestartValidator | Kill => RelayMethod::Post,
        }
    }
}

impl FromStr for RelayRequest {
    type Err = RelayError;

    fn from_str(s: &str) -> RelayResult<Self> {
        RelayRequest::ALL
            .into_iter()
            .find(|request| request.as_str() == s)
            .ok_or_else(|| RelayError::UnknownRequest(s.to_string()))
    }
}

impl fmt::Display for RelayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: RelayMethod,
    pub url: String,
}

/// Resolves the REST url and method of each request
pub struct RelayRoutes {
    root_url: String,
}

impl Default for RelayRoutes {
    fn default() -> Self {
        Self::new(RELAY_URI)
    }
}

impl RelayRoutes {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn route(&self, request: RelayRequest) -> Route {
        Route {
            method: request.method(),
            url: format!("{}/{}/{}", self.root_url, RELAY_REST_PATH, request),
        }
    }
}
