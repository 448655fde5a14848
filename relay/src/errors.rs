use thiserror::Error;

pub type RelayResult<T> = std::result::Result<T, RelayError>;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("ValidatorError: {0}")]
    ValidatorError(#[from] warden_validator::errors::ValidatorError),
    #[error("PersistError: {0}")]
    PersistError(#[from] warden_persist::errors::PersistError),
    #[error("CoreError: {0}")]
    CoreError(#[from] warden_core::errors::CoreError),
    #[error("SerdeJSONError: {0}")]
    SerdeJSONError(#[from] serde_json::Error),

    #[error("Need to provide a record of address labels to update")]
    MissingAddressLabels,
    #[error("Missing argument '{0}'")]
    MissingArgument(&'static str),
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    #[error("Invalid public key '{0}'")]
    InvalidPubkey(String),
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),
    #[error("A validator restart is already in progress")]
    RestartInProgress,
    #[error("Unknown request '{0}'")]
    UnknownRequest(String),
}
