use solana_account_decoder::parse_account_data::ParseAccountError;
use thiserror::Error;

pub type DecodersResult<T> = std::result::Result<T, DecodersError>;

#[derive(Error, Debug)]
pub enum DecodersError {
    #[error("ParseAccountError: {0}")]
    ParseAccountError(#[from] ParseAccountError),
    #[error("SerdeJSONError: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("InvalidData: {0}")]
    InvalidData(String),
}
