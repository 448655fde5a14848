use thiserror::Error;

pub type RelayClientResult<T> = Result<T, RelayClientError>;

#[derive(Debug, Error)]
pub enum RelayClientError {
    #[error(
        "Request to {0} timed out. Is the warden running with the relay enabled?"
    )]
    Timeout(String),
    #[error("Relay responded with an error: {0}")]
    Relay(String),
    #[error("RequestError: {0}")]
    Request(#[from] reqwest::Error),
    #[error("SerdeJSONError: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
}
