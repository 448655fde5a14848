use thiserror::Error;

pub type WardenResult<T> = Result<T, WardenError>;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("StdIoError: {0}")]
    StdIoError(#[from] std::io::Error),
    #[error("SerdeJSONError: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("ValidatorError: {0}")]
    ValidatorError(#[from] warden_validator::errors::ValidatorError),
    #[error("RelayRestError: {0}")]
    RelayRestError(#[from] warden_relay_rest::errors::RelayRestError),
    #[error("RelayPubsubError: {0}")]
    RelayPubsubError(#[from] warden_relay_pubsub::errors::RelayPubsubError),
}
