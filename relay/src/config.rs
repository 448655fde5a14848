use serde::{Deserialize, Serialize};
use warden_addresses::consts::{RELAY_PORT, RELAY_PUBSUB_PORT};
use warden_validator::config::is_ci;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    /// Disabled in CI so automated runs do not need a running relay
    pub enabled: bool,
    /// Kill whatever process listens on the relay ports before starting
    pub kill_running_relay: bool,
    pub port: u16,
    pub pubsub_port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: !is_ci(),
            kill_running_relay: true,
            port: RELAY_PORT,
            pubsub_port: RELAY_PUBSUB_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config: RelayConfig =
            serde_json::from_value(json!({ "enabled": true })).unwrap();
        assert!(config.enabled);
        assert!(config.kill_running_relay);
        assert_eq!(config.port, 50474);
        assert_eq!(config.pubsub_port, 50475);
    }
}
