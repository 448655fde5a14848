use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use log::*;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::Mutex;
use warden_core::{AccountProvider, AddressLabels, KeypairEntries};
use warden_persist::{
    account_args, create_temporary_snapshot, load_accounts_dir, load_snapshot,
    map_persisted_account_infos, LoadedAccount, LoadedSnapshot,
    PersistedAccountInfo,
};

use crate::{
    build_validator_args,
    config::{SnapshotConfig, ValidatorConfig},
    ensure_validator_up,
    errors::{ValidatorError, ValidatorResult},
    kill_running_validators, RestoredState, SolanaConfigFile,
    ValidatorController, ValidatorLifecycle, ValidatorProcess,
};

struct ValidatorInner {
    lifecycle: ValidatorLifecycle,
    process: Option<ValidatorProcess>,
}

/// Supervises a `solana-test-validator` child process
pub struct SolanaValidator<T: AccountProvider> {
    config: ValidatorConfig,
    snapshot: SnapshotConfig,
    /// Folder holding account json files loaded at every start
    accounts_folder: PathBuf,
    account_provider: Arc<T>,
    inner: Mutex<ValidatorInner>,
}

impl<T: AccountProvider> SolanaValidator<T> {
    pub fn new(
        config: ValidatorConfig,
        snapshot: SnapshotConfig,
        accounts_folder: PathBuf,
        account_provider: Arc<T>,
    ) -> Self {
        Self {
            config,
            snapshot,
            accounts_folder,
            account_provider,
            inner: Mutex::new(ValidatorInner {
                lifecycle: ValidatorLifecycle::NotStarted,
                process: None,
            }),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn snapshot_config(&self) -> &SnapshotConfig {
        &self.snapshot
    }

    /// Kills validators that are already running if so configured and
    /// launches the validator with the configured snapshot.
    pub async fn start(&self) -> ValidatorResult<RestoredState> {
        if self.config.kill_running_validators {
            kill_running_validators(&self.config.validator_binary).await?;
        }
        info!(
            "Launching new {} with programs predeployed and ledger at {:?}",
            self.config.validator_binary, self.config.ledger_dir
        );
        self.launch(&self.snapshot).await
    }

    async fn set_lifecycle(&self, lifecycle: ValidatorLifecycle) {
        debug!("Validator {:?}", lifecycle);
        self.inner.lock().await.lifecycle = lifecycle;
    }

    async fn load_assets_accounts(&self) -> ValidatorResult<Vec<LoadedAccount>> {
        if !tokio::fs::try_exists(&self.accounts_folder).await? {
            return Ok(vec![]);
        }
        Ok(load_accounts_dir(&self.accounts_folder).await?)
    }

    /// Launches the validator and waits for it to be up.
    /// If that fails the process is killed and the lifecycle is
    /// [ValidatorLifecycle::Failed].
    async fn launch(
        &self,
        snapshot: &SnapshotConfig,
    ) -> ValidatorResult<RestoredState> {
        self.set_lifecycle(ValidatorLifecycle::Spawning).await;
        match self.try_launch(snapshot).await {
            Ok(restored) => {
                self.set_lifecycle(ValidatorLifecycle::Up).await;
                Ok(restored)
            }
            Err(err) => {
                error!("Failed to launch validator: {}", err);
                if let Err(kill_err) = self.kill_process().await {
                    warn!("Failed to kill validator: {}", kill_err);
                }
                self.set_lifecycle(ValidatorLifecycle::Failed).await;
                Err(err)
            }
        }
    }

    async fn try_launch(
        &self,
        snapshot: &SnapshotConfig,
    ) -> ValidatorResult<RestoredState> {
        let config_file = SolanaConfigFile::create(&self.config).await?;
        let assets_accounts = self.load_assets_accounts().await?;
        let loaded_snapshot = match &snapshot.load {
            Some(label) => load_snapshot(&snapshot.snapshot_folder, label).await?,
            None => LoadedSnapshot::default(),
        };

        let account_args = account_args(&assets_accounts)
            .into_iter()
            .chain(loaded_snapshot.account_args());
        let args =
            build_validator_args(&self.config, config_file.path(), account_args)?;

        let process = ValidatorProcess::spawn(
            &self.config.validator_binary,
            &args,
            self.config.detached,
        )?;
        self.inner.lock().await.process = Some(process);

        ensure_validator_up(
            &self.config.json_rpc_url,
            self.config.verify_fees,
            self.config.ready_timeout(),
        )
        .await?;
        config_file.cleanup()?;

        restored_state(&self.config, assets_accounts, loaded_snapshot)
    }

    async fn kill_process(&self) -> ValidatorResult<()> {
        let process = self.inner.lock().await.process.take();
        if let Some(mut process) = process {
            debug!("Killing validator with pid {:?}", process.pid());
            process.kill().await?;
        }
        Ok(())
    }

    /// Returns the lifecycle from before the restart
    async fn begin_restart(&self) -> ValidatorResult<ValidatorLifecycle> {
        let mut inner = self.inner.lock().await;
        if inner.lifecycle == ValidatorLifecycle::Killed {
            return Err(ValidatorError::Killed);
        }
        Ok(std::mem::replace(
            &mut inner.lifecycle,
            ValidatorLifecycle::Restarting,
        ))
    }
}

fn restored_state(
    config: &ValidatorConfig,
    assets_accounts: Vec<LoadedAccount>,
    loaded_snapshot: LoadedSnapshot,
) -> ValidatorResult<RestoredState> {
    let mut labels = config.labels();
    labels.extend(loaded_snapshot.labels());
    labels.extend(
        assets_accounts
            .iter()
            .filter(|x| x.label != x.info.pubkey)
            .map(|x| (x.info.pubkey.clone(), x.label.clone())),
    );

    let accounts = map_persisted_account_infos(
        assets_accounts
            .iter()
            .chain(loaded_snapshot.accounts.iter())
            .map(|x| &x.info),
    )?;
    Ok(RestoredState {
        accounts,
        keypairs: loaded_snapshot.keypair_entries(),
        labels,
    })
}

#[async_trait]
impl<T: AccountProvider> ValidatorController for SolanaValidator<T> {
    async fn pid(&self) -> Option<u32> {
        self.inner
            .lock()
            .await
            .process
            .as_ref()
            .and_then(ValidatorProcess::pid)
    }

    async fn lifecycle(&self) -> ValidatorLifecycle {
        self.inner.lock().await.lifecycle
    }

    async fn restart_with_overrides(
        &self,
        addresses: &[Pubkey],
        labels: &AddressLabels,
        keypairs: &KeypairEntries,
        overrides: &HashMap<Pubkey, PersistedAccountInfo>,
    ) -> ValidatorResult<RestoredState> {
        let previous = self.begin_restart().await?;

        // Needs to be taken while the current validator is still up
        let snapshot = match create_temporary_snapshot(
            self.account_provider.clone(),
            addresses,
            labels,
            keypairs,
            overrides,
        )
        .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                // The running validator was not touched
                self.set_lifecycle(previous).await;
                return Err(err.into());
            }
        };

        self.kill_process().await?;
        let restored = self
            .launch(&SnapshotConfig {
                snapshot_folder: snapshot.snapshot_folder().to_path_buf(),
                load: Some(snapshot.label().to_string()),
            })
            .await;
        // Removed whether or not the validator came back up
        snapshot.cleanup()?;
        restored
    }

    async fn restart_with_snapshot(
        &self,
        label: &str,
    ) -> ValidatorResult<RestoredState> {
        let snapshot_dir = self.snapshot.snapshot_folder.join(label);
        if !tokio::fs::try_exists(&snapshot_dir).await? {
            return Err(ValidatorError::SnapshotNotFound(snapshot_dir));
        }
        self.begin_restart().await?;

        self.kill_process().await?;
        self.launch(&SnapshotConfig {
            snapshot_folder: self.snapshot.snapshot_folder.clone(),
            load: Some(label.to_string()),
        })
        .await
    }

    async fn kill(&self) -> ValidatorResult<()> {
        self.kill_process().await?;
        self.set_lifecycle(ValidatorLifecycle::Killed).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::Path};

    use solana_sdk::account::Account;
    use warden_persist::PersistedAccountInfo;

    use super::*;
    use crate::config::AccountConfig;

    fn loaded(label: &str, pubkey: &Pubkey) -> LoadedAccount {
        let account = Account {
            lamports: 10,
            data: vec![1],
            ..Account::default()
        };
        LoadedAccount {
            label: label.to_string(),
            account_path: Path::new("/tmp").join(format!("{}.json", label)),
            info: PersistedAccountInfo::from_account(pubkey, &account),
        }
    }

    #[test]
    fn test_restored_state_merges_labels_and_accounts() {
        let configured = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        let snapshot_labeled = Pubkey::new_unique();
        let snapshot_unlabeled = Pubkey::new_unique();

        let config = ValidatorConfig {
            accounts: vec![AccountConfig {
                label: Some("configured".to_string()),
                account_id: configured.to_string(),
                executable: false,
            }],
            ..ValidatorConfig::default()
        };
        let assets = vec![loaded(&asset.to_string(), &asset)];
        let snapshot = LoadedSnapshot {
            accounts: vec![
                loaded("alice", &snapshot_labeled),
                loaded(&snapshot_unlabeled.to_string(), &snapshot_unlabeled),
            ],
            keypairs: vec![],
        };

        let restored = restored_state(&config, assets, snapshot).unwrap();
        assert_eq!(restored.accounts.len(), 3);
        assert_eq!(
            restored.labels,
            HashMap::from([
                (configured.to_string(), "configured".to_string()),
                (snapshot_labeled.to_string(), "alice".to_string()),
            ])
        );
        assert!(restored.keypairs.is_empty());
    }
}
