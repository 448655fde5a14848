use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("RpcClientError: {0}")]
    RpcClientError(#[from] solana_rpc_client_api::client_error::Error),
    #[error("Requested {requested} accounts at once, at most {max} are allowed")]
    TooManyAccountsRequested { requested: usize, max: usize },
    #[error("Failed to get account from cluster")]
    FailedToGetAccountFromCluster,
    #[error("Failed to decode transaction {0}")]
    FailedToDecodeTransaction(String),
    #[error("Failed to subscribe to logs: {0}")]
    LogsSubscriptionFailed(String),
}
