use std::path::{Path, PathBuf};

use log::*;
use serde::{Deserialize, Serialize};
use warden_relay::RelayConfig;
use warden_validator::config::{SnapshotConfig, ValidatorConfig};

use crate::errors::WardenResult;

pub const DEFAULT_ASSETS_FOLDER: &str = ".warden";
const ACCOUNTS_DIR: &str = "accounts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WardenConfig {
    pub validator: ValidatorConfig,
    pub relay: RelayConfig,
    pub snapshot: SnapshotConfig,
    /// Accounts saved via the relay end up in the `accounts` folder in here
    /// and are loaded into the validator on the next start
    pub assets_folder: PathBuf,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            validator: ValidatorConfig::default(),
            relay: RelayConfig::default(),
            snapshot: SnapshotConfig::default(),
            assets_folder: PathBuf::from(DEFAULT_ASSETS_FOLDER),
        }
    }
}

impl WardenConfig {
    pub fn accounts_folder(&self) -> PathBuf {
        self.assets_folder.join(ACCOUNTS_DIR)
    }
}

/// Loads the config from the JSON file at `path`, missing keys take their
/// default. Without a path the default config is used.
pub async fn load_config(path: Option<&Path>) -> WardenResult<WardenConfig> {
    let Some(path) = path else {
        debug!("No config provided, using defaults");
        return Ok(WardenConfig::default());
    };
    debug!("Loading config from {:?}", path);
    let json = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::errors::WardenError;

    #[tokio::test]
    async fn test_load_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warden.json");
        let json = json!({
            "validator": { "resetLedger": false },
            "relay": { "enabled": true, "port": 6000 },
            "snapshot": { "load": "fixtures" },
            "assetsFolder": "assets",
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let config = load_config(Some(&path)).await.unwrap();
        assert!(!config.validator.reset_ledger);
        assert!(config.validator.kill_running_validators);
        assert!(config.relay.enabled);
        assert_eq!(config.relay.port, 6000);
        assert_eq!(config.relay.pubsub_port, 50475);
        assert_eq!(config.snapshot.load.as_deref(), Some("fixtures"));
        assert_eq!(config.snapshot.snapshot_folder, PathBuf::from("snapshots"));
        assert_eq!(config.accounts_folder(), PathBuf::from("assets/accounts"));
    }

    #[tokio::test]
    async fn test_load_without_path() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config, WardenConfig::default());
        assert_eq!(
            config.accounts_folder(),
            PathBuf::from(".warden/accounts")
        );
    }

    #[tokio::test]
    async fn test_load_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warden.json");
        std::fs::write(&path, "{ \"relay\": ").unwrap();
        assert!(matches!(
            load_config(Some(&path)).await,
            Err(WardenError::SerdeJSONError(_))
        ));
        assert!(matches!(
            load_config(Some(&dir.path().join("missing.json"))).await,
            Err(WardenError::StdIoError(_))
        ));
    }
}
