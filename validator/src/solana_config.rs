use std::path::Path;

use solana_sdk::commitment_config::CommitmentLevel;
use tempfile::TempPath;

use crate::{config::ValidatorConfig, errors::ValidatorResult};

/// Solana CLI config passed to the validator via `-C`.
/// The file is removed when this is dropped.
#[derive(Debug)]
pub struct SolanaConfigFile {
    path: TempPath,
}

impl SolanaConfigFile {
    pub async fn create(config: &ValidatorConfig) -> ValidatorResult<Self> {
        let text = solana_config_text(
            &config.json_rpc_url,
            &config.websocket_url,
            config.commitment,
        );
        let path = tempfile::Builder::new()
            .prefix("warden-config.")
            .suffix(".yml")
            .tempfile()?
            .into_temp_path();
        tokio::fs::write(&path, text).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cleanup(self) -> ValidatorResult<()> {
        Ok(self.path.close()?)
    }
}

pub fn solana_config_text(
    json_rpc_url: &str,
    websocket_url: &str,
    commitment: CommitmentLevel,
) -> String {
    format!(
        "---\njson_rpc_url: \"{}\"\nwebsocket_url: \"{}\"\ncommitment: {}\n",
        json_rpc_url, websocket_url, commitment
    )
}
