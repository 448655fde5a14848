use std::{
    collections::{HashMap, HashSet},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use futures_util::future::try_join_all;
use log::*;
use solana_sdk::{account::Account, pubkey::Pubkey, signature::Keypair};
use tokio::fs;
use warden_core::{AccountProvider, AddressLabels, KeypairEntries};

use crate::{
    errors::{PersistError, PersistResult},
    PersistedAccountInfo, SNAPSHOT_ACCOUNTS_DIR, SNAPSHOT_KEYPAIRS_DIR,
};

/// Snapshot labels, account labels and keypair ids name a single entry
/// inside the directory they are saved to.
pub fn ensure_file_name(name: &str) -> PersistResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('/') => Ok(()),
        _ => Err(PersistError::InvalidFileName(name.to_string())),
    }
}

/// Writes accounts and keypairs into a directory tree rooted at `target_dir`.
/// The account provider is only needed for operations that fetch accounts
/// from the validator.
pub struct AccountPersister<T: AccountProvider> {
    target_dir: PathBuf,
    account_provider: Option<Arc<T>>,
}

impl<T: AccountProvider> AccountPersister<T> {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            account_provider: None,
        }
    }

    pub fn with_provider(
        target_dir: impl Into<PathBuf>,
        account_provider: Arc<T>,
    ) -> Self {
        Self {
            target_dir: target_dir.into(),
            account_provider: Some(account_provider),
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    // -----------------
    // Account Infos
    // -----------------
    pub async fn save_account_info(
        &self,
        address: &Pubkey,
        account: &Account,
        subdir: Option<&Path>,
        label: Option<&str>,
    ) -> PersistResult<PathBuf> {
        let persisted = PersistedAccountInfo::from_account(address, account);
        self.save_persisted_account_info(&persisted, subdir, label)
            .await
    }

    /// Writes the account to `<target_dir>[/<subdir>]/<label or pubkey>.json`
    pub async fn save_persisted_account_info(
        &self,
        persisted: &PersistedAccountInfo,
        subdir: Option<&Path>,
        label: Option<&str>,
    ) -> PersistResult<PathBuf> {
        trace!(
            "Saving account info {} {}",
            persisted.pubkey,
            label.unwrap_or_default()
        );
        if persisted.account.executable {
            return Err(PersistError::ExecutableAccount(
                persisted.pubkey.clone(),
            ));
        }
        if let Some(label) = label {
            ensure_file_name(label)?;
        }
        let full_dir = match subdir {
            Some(subdir) => self.target_dir.join(subdir),
            None => self.target_dir.clone(),
        };
        fs::create_dir_all(&full_dir).await?;

        let account_path = full_dir
            .join(format!("{}.json", label.unwrap_or(&persisted.pubkey)));
        let json = serde_json::to_string_pretty(persisted)?;
        fs::write(&account_path, json).await?;
        Ok(account_path)
    }

    /// Fetches the account from the validator and saves it, replacing its
    /// data with `data` if provided.
    pub async fn save_account(
        &self,
        address: &Pubkey,
        data: Option<Vec<u8>>,
    ) -> PersistResult<PathBuf> {
        let provider = self.require_provider("save account")?;
        let (_, account) = provider.get_account(address).await?;
        let mut account =
            account.ok_or(PersistError::AccountNotFound(*address))?;
        if let Some(data) = data {
            account.data = data;
        }
        self.save_account_info(address, &account, None, None).await
    }

    // -----------------
    // Keypairs
    // -----------------
    /// Writes the secret key as a json array of bytes to
    /// `<target_dir>[/<subdir>]/keypairs/<id>.json`
    pub async fn save_keypair(
        &self,
        id: &str,
        keypair: &Keypair,
        subdir: Option<&Path>,
    ) -> PersistResult<PathBuf> {
        trace!("Saving keypair {}", id);
        ensure_file_name(id)?;
        let full_dir = match subdir {
            Some(subdir) => self.target_dir.join(subdir),
            None => self.target_dir.clone(),
        }
        .join(SNAPSHOT_KEYPAIRS_DIR);
        fs::create_dir_all(&full_dir).await?;

        let keypair_path = full_dir.join(format!("{}.json", id));
        let json = serde_json::to_string(&keypair.to_bytes().to_vec())?;
        fs::write(&keypair_path, json).await?;
        Ok(keypair_path)
    }

    // -----------------
    // Snapshot
    // -----------------
    /// Saves a snapshot into `<target_dir>/<label>`, replacing any snapshot
    /// with the same label.
    ///
    /// 1. known addresses without override are fetched from the validator,
    ///    missing and executable accounts are skipped
    /// 2. overrides are saved as is
    /// 3. keypairs are saved by id, only the first keypair for an id is kept
    ///
    /// Accounts are named by their label if they have one.
    pub async fn snapshot(
        &self,
        snapshot_label: &str,
        addresses: &[Pubkey],
        labels: &AddressLabels,
        keypairs: &KeypairEntries,
        overrides: &HashMap<Pubkey, PersistedAccountInfo>,
    ) -> PersistResult<PathBuf> {
        let provider = self.require_provider("take snapshot")?;
        ensure_file_name(snapshot_label)?;

        let snapshot_dir = self.target_dir.join(snapshot_label);
        if fs::try_exists(&snapshot_dir).await? {
            fs::remove_dir_all(&snapshot_dir).await?;
        }
        fs::create_dir_all(&snapshot_dir).await?;

        let accounts_subdir =
            Path::new(snapshot_label).join(SNAPSHOT_ACCOUNTS_DIR);

        // 1. Accounts at known addresses
        let fetch_addresses = addresses
            .iter()
            .filter(|address| !overrides.contains_key(*address))
            .copied()
            .collect::<Vec<_>>();
        let (_, accounts) =
            provider.get_accounts_batched(&fetch_addresses).await?;
        let saves = fetch_addresses
            .iter()
            .zip(accounts)
            .filter_map(|(address, account)| match account {
                Some(account) if !account.executable => Some((address, account)),
                _ => None,
            })
            .map(|(address, account)| {
                let subdir = accounts_subdir.as_path();
                let label = file_label(labels, &address.to_string());
                async move {
                    self.save_account_info(address, &account, Some(subdir), label)
                        .await
                }
            });
        try_join_all(saves).await?;

        // 2. Account overrides
        let saves = overrides.values().map(|persisted| {
            trace!("Saving override account info {}", persisted.pubkey);
            self.save_persisted_account_info(
                persisted,
                Some(accounts_subdir.as_path()),
                file_label(labels, &persisted.pubkey),
            )
        });
        try_join_all(saves).await?;

        // 3. Keypairs, files are named by id which need to be unique
        let mut seen_ids = HashSet::new();
        let saves = keypairs
            .values()
            .filter(|entry| match ensure_file_name(&entry.id) {
                Ok(()) => true,
                Err(err) => {
                    warn!("Not saving keypair to snapshot: {}", err);
                    false
                }
            })
            .filter(|entry| seen_ids.insert(entry.id.as_str()))
            .map(|entry| {
                self.save_keypair(
                    &entry.id,
                    &entry.keypair,
                    Some(Path::new(snapshot_label)),
                )
            });
        try_join_all(saves).await?;

        debug!("Saved snapshot '{}' to {:?}", snapshot_label, snapshot_dir);
        Ok(snapshot_dir)
    }

    fn require_provider(&self, task: &'static str) -> PersistResult<&Arc<T>> {
        self.account_provider
            .as_ref()
            .ok_or(PersistError::MissingAccountProvider(task))
    }
}

/// The label of the address if it can be used as a file name, accounts
/// with other labels are saved under their address
fn file_label<'a>(labels: &'a AddressLabels, address: &str) -> Option<&'a str> {
    let label = labels.get(address)?;
    match ensure_file_name(label) {
        Ok(()) => Some(label.as_str()),
        Err(err) => {
            warn!("Saving {} under its address: {}", address, err);
            None
        }
    }
}
