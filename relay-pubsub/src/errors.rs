use thiserror::Error;

pub type RelayPubsubResult<T> = Result<T, RelayPubsubError>;

#[derive(Debug, Error)]
pub enum RelayPubsubError {
    #[error("StdIoError: {0}")]
    StdIoError(#[from] std::io::Error),
    #[error("TungsteniteWsError: {0}")]
    WsError(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("SerdeJSONError: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
}
