mod account_persister;
pub mod errors;
mod persisted_account_info;
mod snapshot;

pub use account_persister::*;
pub use persisted_account_info::*;
pub use snapshot::*;

/// Subdirectory of a snapshot holding one json file per account
pub const SNAPSHOT_ACCOUNTS_DIR: &str = "accounts";
/// Subdirectory of a snapshot holding one json file per keypair
pub const SNAPSHOT_KEYPAIRS_DIR: &str = "keypairs";
