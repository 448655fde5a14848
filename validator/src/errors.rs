use thiserror::Error;

pub type ValidatorResult<T> = std::result::Result<T, ValidatorError>;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("StdIoError: {0}")]
    StdIoError(#[from] std::io::Error),
    #[error("PersistError: {0}")]
    PersistError(#[from] warden_persist::errors::PersistError),
    #[error("RpcClientError: {0}")]
    RpcClientError(#[from] solana_rpc_client_api::client_error::Error),

    #[error("Cannot access program deploy path of {0}")]
    ProgramNotAccessible(String),
    #[error("Failed to spawn '{binary}': {err}")]
    FailedToSpawn { binary: String, err: std::io::Error },
    #[error("Validator at {0} did not come up in time")]
    ValidatorNotUp(String),
    #[error("Validator did not charge fees in time")]
    NoFeesCharged,
    #[error("It seems like no validator is running currently")]
    NotRunning,
    #[error("Validator was killed and cannot be restarted")]
    Killed,
    #[error("Snapshot not found at {0:?}")]
    SnapshotNotFound(std::path::PathBuf),
    #[error("Transaction {0} could not be found")]
    TransactionNotFound(String),
}
