use std::{fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Tagged outcome of a relay operation, serialized as `{ "result": .. }`
/// or `{ "err": ".." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayReply<T> {
    Result { result: T },
    Err { err: String },
}

impl<T> RelayReply<T> {
    pub fn ok(result: T) -> Self {
        Self::Result { result }
    }

    pub fn err(err: impl Display) -> Self {
        Self::Err {
            err: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Result { .. })
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Result { result } => Ok(result),
            Self::Err { err } => Err(err),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for RelayReply<T> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(result) => Self::ok(result),
            Err(err) => Self::err(err),
        }
    }
}

/// Outcome of saving a single account, paired with the address it was
/// requested for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountSaveResult {
    Saved {
        #[serde(rename = "accountPath")]
        account_path: PathBuf,
    },
    Err {
        err: String,
    },
}
