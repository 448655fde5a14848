use thiserror::Error;

pub type ProvidersResult<T> = Result<T, ProvidersError>;

#[derive(Debug, Error)]
pub enum ProvidersError {
    #[error("TungsteniteWsError: {0}")]
    WsError(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("UrlParseError: {0}")]
    URLParseError(#[from] url::ParseError),
    #[error("SerdeJSONError: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("Logs subscription was rejected: {0}")]
    SubscriptionRejected(String),
}
