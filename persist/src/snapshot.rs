use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::*;
use solana_sdk::{account::Account, pubkey::Pubkey, signature::Keypair};
use tempfile::TempDir;
use tokio::fs;
use warden_core::{
    AccountProvider, AddressLabels, KeypairEntries, KeypairEntry,
};

use crate::{
    errors::{PersistError, PersistResult},
    map_persisted_account_infos, AccountPersister, PersistedAccountInfo,
    SNAPSHOT_ACCOUNTS_DIR, SNAPSHOT_KEYPAIRS_DIR,
};

/// Label of the snapshot that is created to restart the validator
pub const TEMPORARY_SNAPSHOT_LABEL: &str = "temporary";

// -----------------
// Loading
// -----------------
/// A persisted account together with the file it was loaded from
#[derive(Debug, Clone)]
pub struct LoadedAccount {
    /// File stem, which is the label of the account or its address
    pub label: String,
    pub account_path: PathBuf,
    pub info: PersistedAccountInfo,
}

#[derive(Debug, Default)]
pub struct LoadedSnapshot {
    pub accounts: Vec<LoadedAccount>,
    /// Keyed by id
    pub keypairs: Vec<(String, Keypair)>,
}

impl LoadedSnapshot {
    /// `--account <pubkey> <path>` for every account of the snapshot
    pub fn account_args(&self) -> Vec<String> {
        account_args(&self.accounts)
    }

    pub fn account_infos(&self) -> PersistResult<HashMap<Pubkey, Account>> {
        map_persisted_account_infos(self.accounts.iter().map(|x| &x.info))
    }

    /// Labels of accounts that were saved under a label instead of their
    /// address
    pub fn labels(&self) -> AddressLabels {
        self.accounts
            .iter()
            .filter(|x| x.label != x.info.pubkey)
            .map(|x| (x.info.pubkey.clone(), x.label.clone()))
            .collect()
    }

    pub fn keypair_entries(self) -> KeypairEntries {
        self.keypairs
            .into_iter()
            .map(|(id, keypair)| {
                let entry = KeypairEntry::new(id, keypair);
                (entry.address(), entry)
            })
            .collect()
    }
}

pub fn account_args(accounts: &[LoadedAccount]) -> Vec<String> {
    accounts
        .iter()
        .flat_map(|x| {
            [
                "--account".to_string(),
                x.info.pubkey.clone(),
                x.account_path.to_string_lossy().to_string(),
            ]
        })
        .collect()
}

/// Loads the single account saved as `<source_dir>/<label or address>.json`
pub async fn load_account(
    address: &Pubkey,
    source_dir: &Path,
    label: Option<&str>,
) -> PersistResult<PersistedAccountInfo> {
    let address = address.to_string();
    trace!("Loading account {} {}", address, label.unwrap_or_default());
    let account_path =
        source_dir.join(format!("{}.json", label.unwrap_or(&address)));
    let json = fs::read_to_string(account_path).await?;
    Ok(serde_json::from_str(&json)?)
}

/// Loads all `*.json` account files found in `dir`, sorted by file name
pub async fn load_accounts_dir(dir: &Path) -> PersistResult<Vec<LoadedAccount>> {
    let mut accounts = vec![];
    for account_path in json_files(dir).await? {
        let label = file_stem(&account_path);
        let json = fs::read_to_string(&account_path).await?;
        let info: PersistedAccountInfo = serde_json::from_str(&json)?;
        trace!("Loaded account labeled {} with pubkey {}", label, info.pubkey);
        accounts.push(LoadedAccount {
            label,
            account_path,
            info,
        });
    }
    Ok(accounts)
}

/// Loads all `*.json` keypair files found in `dir` keyed by file stem
pub async fn load_keypairs_dir(
    dir: &Path,
) -> PersistResult<Vec<(String, Keypair)>> {
    let mut keypairs = vec![];
    for keypair_path in json_files(dir).await? {
        let json = fs::read_to_string(&keypair_path).await?;
        let bytes: Vec<u8> = serde_json::from_str(&json)?;
        let keypair = Keypair::from_bytes(&bytes).map_err(|err| {
            PersistError::InvalidKeypair(keypair_path.clone(), err.to_string())
        })?;
        keypairs.push((file_stem(&keypair_path), keypair));
    }
    Ok(keypairs)
}

/// Loads the accounts and keypairs of the snapshot at
/// `<snapshot_folder>/<label>`. The keypairs directory is optional.
pub async fn load_snapshot(
    snapshot_folder: &Path,
    label: &str,
) -> PersistResult<LoadedSnapshot> {
    let snapshot_dir = snapshot_folder.join(label);

    let accounts =
        load_accounts_dir(&snapshot_dir.join(SNAPSHOT_ACCOUNTS_DIR)).await?;

    let keypairs_dir = snapshot_dir.join(SNAPSHOT_KEYPAIRS_DIR);
    let keypairs = if fs::try_exists(&keypairs_dir).await? {
        load_keypairs_dir(&keypairs_dir).await?
    } else {
        vec![]
    };

    info!(
        "Loading {} accounts and {} keypairs from snapshot at {:?}",
        accounts.len(),
        keypairs.len(),
        snapshot_dir
    );
    Ok(LoadedSnapshot { accounts, keypairs })
}

async fn json_files(dir: &Path) -> PersistResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = vec![];
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_default()
}

// -----------------
// Temporary Snapshot
// -----------------
/// Snapshot written into a temporary folder, removed when dropped
#[derive(Debug)]
pub struct TemporarySnapshot {
    folder: TempDir,
}

impl TemporarySnapshot {
    pub fn snapshot_folder(&self) -> &Path {
        self.folder.path()
    }

    pub fn label(&self) -> &str {
        TEMPORARY_SNAPSHOT_LABEL
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.folder.path().join(TEMPORARY_SNAPSHOT_LABEL)
    }

    pub fn cleanup(self) -> PersistResult<()> {
        debug!("Removing temporary snapshot at {:?}", self.folder.path());
        Ok(self.folder.close()?)
    }
}

/// Snapshots the current state merged with the overrides into a temporary
/// folder, overrides win for addresses present in both.
pub async fn create_temporary_snapshot<T: AccountProvider>(
    account_provider: Arc<T>,
    addresses: &[Pubkey],
    labels: &AddressLabels,
    keypairs: &KeypairEntries,
    overrides: &HashMap<Pubkey, PersistedAccountInfo>,
) -> PersistResult<TemporarySnapshot> {
    debug!(
        "Creating temporary snapshot with {} overrides",
        overrides.len()
    );
    let folder = tempfile::Builder::new()
        .prefix("warden-snapshots")
        .tempdir()?;
    let persister =
        AccountPersister::with_provider(folder.path(), account_provider);
    persister
        .snapshot(
            TEMPORARY_SNAPSHOT_LABEL,
            addresses,
            labels,
            keypairs,
            overrides,
        )
        .await?;
    Ok(TemporarySnapshot { folder })
}
