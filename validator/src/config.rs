use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentLevel;
use warden_addresses::cluster::{LOCALHOST, WS_LOCALHOST};
use warden_core::AddressLabels;

pub const DEFAULT_VALIDATOR_BINARY: &str = "solana-test-validator";
pub const DEFAULT_LIMIT_LEDGER_SIZE: u64 = 10_000;
pub const DEFAULT_SNAPSHOT_FOLDER: &str = "snapshots";
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 120;

/// `true` when running in CI as indicated by the `CI` environment variable
pub fn is_ci() -> bool {
    std::env::var_os("CI").is_some()
}

pub fn tmp_ledger_dir() -> PathBuf {
    std::env::temp_dir().join("warden-ledger")
}

// -----------------
// ValidatorConfig
// -----------------
/// Program the validator deploys at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramConfig {
    #[serde(default)]
    pub label: Option<String>,
    pub program_id: String,
    /// Path of the `.so` file of the program
    pub deploy_path: PathBuf,
}

/// Account the validator loads at startup from the accounts folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    #[serde(default)]
    pub label: Option<String>,
    pub account_id: String,
    #[serde(default)]
    pub executable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorConfig {
    pub kill_running_validators: bool,
    pub programs: Vec<ProgramConfig>,
    pub accounts: Vec<AccountConfig>,
    pub json_rpc_url: String,
    pub websocket_url: String,
    pub commitment: CommitmentLevel,
    pub ledger_dir: PathBuf,
    pub reset_ledger: bool,
    pub limit_ledger_size: u64,
    /// If `true` the validator is only considered up once it charges fees
    pub verify_fees: bool,
    /// If `true` the validator keeps running when the supervisor exits
    pub detached: bool,
    pub validator_binary: String,
    /// How long to wait for a launched validator to be up, including fee
    /// verification
    pub ready_timeout_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            kill_running_validators: true,
            programs: vec![],
            accounts: vec![],
            json_rpc_url: LOCALHOST.to_string(),
            websocket_url: WS_LOCALHOST.to_string(),
            commitment: CommitmentLevel::Confirmed,
            ledger_dir: tmp_ledger_dir(),
            reset_ledger: true,
            limit_ledger_size: DEFAULT_LIMIT_LEDGER_SIZE,
            verify_fees: false,
            detached: is_ci(),
            validator_binary: DEFAULT_VALIDATOR_BINARY.to_string(),
            ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
        }
    }
}

impl ValidatorConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    /// Labels of the configured programs and accounts keyed by address
    pub fn labels(&self) -> AddressLabels {
        let programs = self
            .programs
            .iter()
            .filter_map(|x| Some((x.program_id.clone(), x.label.clone()?)));
        let accounts = self
            .accounts
            .iter()
            .filter_map(|x| Some((x.account_id.clone(), x.label.clone()?)));
        programs.chain(accounts).collect()
    }
}

// -----------------
// SnapshotConfig
// -----------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotConfig {
    /// Folder that snapshots are saved to and loaded from
    pub snapshot_folder: PathBuf,
    /// Label of the snapshot to load at startup
    pub load: Option<String>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_folder: PathBuf::from(DEFAULT_SNAPSHOT_FOLDER),
            load: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ValidatorConfig = serde_json::from_value(json!({
            "resetLedger": false,
            "programs": [{
                "label": "counter",
                "programId": "Counter111111111111111111111111111111111111",
                "deployPath": "target/deploy/counter.so"
            }],
            "accounts": [{
                "accountId": "8k2V7EzQtNg38Gi9HK5ZtQYp1YpGKNGrMcuGa737gZX4",
                "label": "fixture"
            }]
        }))
        .unwrap();

        assert!(!config.reset_ledger);
        assert_eq!(config.limit_ledger_size, 10_000);
        assert_eq!(config.commitment, CommitmentLevel::Confirmed);
        assert_eq!(config.json_rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.validator_binary, "solana-test-validator");
        assert_eq!(config.ready_timeout(), Duration::from_secs(120));

        let labels = config.labels();
        assert_eq!(labels.len(), 2);
        assert_eq!(
            labels["Counter111111111111111111111111111111111111"],
            "counter"
        );
        assert_eq!(
            labels["8k2V7EzQtNg38Gi9HK5ZtQYp1YpGKNGrMcuGa737gZX4"],
            "fixture"
        );
    }

    #[test]
    fn test_ready_timeout() {
        let config: ValidatorConfig =
            serde_json::from_value(json!({ "readyTimeoutSecs": 5 })).unwrap();
        assert_eq!(config.ready_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_snapshot_config_defaults() {
        let config: SnapshotConfig =
            serde_json::from_value(json!({ "load": "snap1" })).unwrap();
        assert_eq!(config.snapshot_folder, PathBuf::from("snapshots"));
        assert_eq!(config.load.as_deref(), Some("snap1"));
    }
}
