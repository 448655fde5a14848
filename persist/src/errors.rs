use std::path::PathBuf;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub type PersistResult<T> = std::result::Result<T, PersistError>;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("StdIoError: {0}")]
    StdIoError(#[from] std::io::Error),
    #[error("SerdeJSONError: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("CoreError: {0}")]
    CoreError(#[from] warden_core::errors::CoreError),
    #[error("Base64DecodeError: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("Can only save non-executable accounts, {0} is executable")]
    ExecutableAccount(String),
    #[error("Account not found at address {0}")]
    AccountNotFound(Pubkey),
    #[error("Invalid public key '{0}'")]
    InvalidPubkey(String),
    #[error("Expected persisted account data to be encoded as 'base64', found '{0}'")]
    UnsupportedDataEncoding(String),
    #[error("Invalid keypair at {0}: {1}")]
    InvalidKeypair(PathBuf, String),
    #[error("'{0}' cannot be used as a file name")]
    InvalidFileName(String),
    #[error("Persister needs an account provider to {0}")]
    MissingAccountProvider(&'static str),
}
