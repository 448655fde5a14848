use thiserror::Error;

pub type RelayRestResult<T> = Result<T, RelayRestError>;

#[derive(Debug, Error)]
pub enum RelayRestError {
    #[error("StdIoError: {0}")]
    StdIoError(#[from] std::io::Error),
}
