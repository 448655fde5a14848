use std::{
    collections::HashMap, path::PathBuf, str::FromStr, sync::Arc,
};

use log::*;
use solana_sdk::{clock::Slot, pubkey::Pubkey, signature::Keypair};
use tokio::sync::{watch, Mutex, RwLock};
use warden_accounts::{
    AccountChangedReceiver, AccountChangedSender, AccountStates,
    RelayAccountState,
};
use warden_core::{
    AccountProvider, AddressLabels, LogsProvider, TransactionProvider,
};
use warden_decoders::AccountDecoderRegistry;
use warden_persist::{AccountPersister, PersistedAccountInfo};
use warden_validator::{RestoredState, ValidatorController};

use crate::{
    errors::{RelayError, RelayResult},
    relay_version, AccountSaveResult, RelayReply, RelayVersion,
};

/// `(address, states)`, the states are empty for unknown addresses
pub type AccountStatesResult = (String, Vec<RelayAccountState>);

/// `(id, secret key)`, the secret key is `None` if no keypair was stored
/// under the id
pub type LoadKeypairResult = (String, Option<Vec<u8>>);

/// Folders the relay persists accounts to
#[derive(Debug, Clone)]
pub struct RelayHandlerConfig {
    /// Target of single accounts saved by clients
    pub accounts_folder: PathBuf,
    /// Root of labeled snapshots
    pub snapshot_folder: PathBuf,
}

/// Chain data sources the account states are driven by
pub struct RelayProviders<T: AccountProvider, U: TransactionProvider> {
    pub account_provider: Arc<T>,
    pub transaction_provider: Arc<U>,
    /// Subscribed again whenever the validator restarted, without it account
    /// states only contain the accounts they were seeded with
    pub logs_provider: Option<Arc<dyn LogsProvider>>,
}

enum Restart {
    WithOverrides(HashMap<Pubkey, PersistedAccountInfo>),
    WithSnapshot(String),
}

/// Implements every operation the relay supports. Transports only parse
/// requests and serialize the replies of this handler.
pub struct RelayHandler<
    T: AccountProvider,
    U: TransactionProvider,
    V: ValidatorController,
> {
    providers: RelayProviders<T, U>,
    registry: Arc<AccountDecoderRegistry>,
    account_persister: AccountPersister<T>,
    snapshot_persister: AccountPersister<T>,
    validator: Arc<V>,
    account_changed: AccountChangedSender,
    account_states: RwLock<Arc<AccountStates<T, U>>>,
    // Keyed pubkey:label
    known_labels: RwLock<AddressLabels>,
    restart_lock: Mutex<()>,
    kill_signal: watch::Sender<bool>,
}

impl<T: AccountProvider, U: TransactionProvider, V: ValidatorController>
    RelayHandler<T, U, V>
{
    /// Creates the handler with account states seeded from the state the
    /// validator was started with
    pub async fn with_providers(
        config: RelayHandlerConfig,
        providers: RelayProviders<T, U>,
        registry: Arc<AccountDecoderRegistry>,
        validator: Arc<V>,
        account_changed: AccountChangedSender,
        restored: RestoredState,
    ) -> Self {
        let account_persister = AccountPersister::with_provider(
            config.accounts_folder,
            providers.account_provider.clone(),
        );
        let snapshot_persister = AccountPersister::with_provider(
            config.snapshot_folder,
            providers.account_provider.clone(),
        );
        let RestoredState {
            accounts,
            keypairs,
            labels,
        } = restored;
        let account_states = AccountStates::with_providers(
            providers.account_provider.clone(),
            providers.transaction_provider.clone(),
            registry.clone(),
            account_changed.clone(),
            accounts,
            keypairs,
        )
        .await;
        let (kill_signal, _) = watch::channel(false);

        let handler = Self {
            providers,
            registry,
            account_persister,
            snapshot_persister,
            validator,
            account_changed,
            account_states: RwLock::new(account_states.clone()),
            known_labels: RwLock::new(labels),
            restart_lock: Mutex::new(()),
            kill_signal,
        };
        handler.listen_to_logs(&account_states).await;
        handler
    }

    // -----------------
    // Account States
    // -----------------
    /// The currently authoritative account states
    pub async fn account_states(&self) -> Arc<AccountStates<T, U>> {
        self.account_states.read().await.clone()
    }

    /// Receives changes of all accounts, including changes made after the
    /// account states were replaced by a restart
    pub fn subscribe_account_changes(&self) -> AccountChangedReceiver {
        self.account_changed.subscribe()
    }

    pub async fn request_account_states(
        &self,
        address: &str,
    ) -> AccountStatesResult {
        let states = match Pubkey::from_str(address) {
            Ok(pubkey) => self.account_states().await.relay_states(&pubkey).await,
            Err(_) => {
                debug!("Requested account states for invalid address {}", address);
                vec![]
            }
        };
        (address.to_string(), states)
    }

    async fn listen_to_logs(&self, account_states: &Arc<AccountStates<T, U>>) {
        let Some(logs_provider) = &self.providers.logs_provider else {
            return;
        };
        match logs_provider.subscribe_logs().await {
            Ok(logs) => account_states.listen_to_logs(logs),
            Err(err) => warn!(
                "Failed to subscribe to logs, account states won't update: {}",
                err
            ),
        }
    }

    /// Replaces the account states with fresh ones seeded from the state the
    /// validator was restarted with
    async fn replace_account_states(&self, restored: RestoredState) {
        let RestoredState {
            accounts,
            keypairs,
            labels,
        } = restored;
        self.known_labels.write().await.extend(labels);

        let account_states = AccountStates::with_providers(
            self.providers.account_provider.clone(),
            self.providers.transaction_provider.clone(),
            self.registry.clone(),
            self.account_changed.clone(),
            accounts,
            keypairs,
        )
        .await;
        self.listen_to_logs(&account_states).await;
        *self.account_states.write().await = account_states;
    }

    // -----------------
    // Address Labels
    // -----------------
    pub async fn known_labels(&self) -> AddressLabels {
        self.known_labels.read().await.clone()
    }

    /// Merges the labels into the known labels, last write wins.
    /// Stored keypairs are relabeled accordingly.
    pub async fn update_address_labels(&self, labels: &AddressLabels) {
        let known = {
            let mut known = self.known_labels.write().await;
            known.extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
            known.clone()
        };
        trace!("Updated {} address labels", labels.len());
        self.account_states().await.label_keypairs(&known).await;
    }

    // -----------------
    // Relay Version
    // -----------------
    pub fn request_relay_version(&self) -> RelayReply<RelayVersion> {
        RelayReply::ok(relay_version())
    }

    // -----------------
    // Validator Pid
    // -----------------
    pub async fn request_validator_pid(&self) -> RelayReply<u32> {
        match self.validator.pid().await {
            Some(pid) => RelayReply::ok(pid),
            None => RelayReply::err(
                "It seems like no validator is running currently, cannot get pid",
            ),
        }
    }

    // -----------------
    // Kill
    // -----------------
    /// Resolves to `true` once a client requested the supervisor to exit
    pub fn kill_signal(&self) -> watch::Receiver<bool> {
        self.kill_signal.subscribe()
    }

    /// Kills the validator and signals the supervisor to exit
    pub async fn request_kill(&self) -> RelayReply<()> {
        debug!("Killing validator");
        if let Err(err) = self.validator.kill().await {
            error!("Failed to kill validator: {}", err);
        }
        debug!("Signaling supervisor to exit");
        self.kill_signal.send_replace(true);
        RelayReply::ok(())
    }

    // -----------------
    // Save Account
    // -----------------
    /// Saves the account to the accounts folder. If `slot` is provided the
    /// data the account had at that slot is saved.
    pub async fn request_account_save(
        &self,
        address: &str,
        slot: Option<Slot>,
    ) -> (String, AccountSaveResult) {
        let result = match self.account_save(address, slot).await {
            Ok(account_path) => AccountSaveResult::Saved { account_path },
            Err(err) => AccountSaveResult::Err {
                err: err.to_string(),
            },
        };
        (address.to_string(), result)
    }

    async fn account_save(
        &self,
        address: &str,
        slot: Option<Slot>,
    ) -> RelayResult<PathBuf> {
        let pubkey = parse_pubkey(address)?;
        let data = match slot {
            Some(slot) => {
                self.account_states()
                    .await
                    .account_data_for_slot(&pubkey, slot)
                    .await
            }
            None => None,
        };
        Ok(self.account_persister.save_account(&pubkey, data).await?)
    }

    // -----------------
    // Snapshot
    // -----------------
    /// Saves all known accounts, labels and keypairs as a snapshot
    /// under `label`
    pub async fn request_snapshot_save(&self, label: &str) -> RelayReply<PathBuf> {
        let account_states = self.account_states().await;
        let addresses = account_states.all_account_addresses().await;
        let keypairs = account_states.all_keypairs().await;
        let labels = self.known_labels().await;
        self.snapshot_persister
            .snapshot(label, &addresses, &labels, &keypairs, &HashMap::new())
            .await
            .into()
    }

    pub async fn request_load_snapshot(&self, label: &str) -> RelayReply<()> {
        self.restart(Restart::WithSnapshot(label.to_string()))
            .await
            .into()
    }

    // -----------------
    // Keypair
    // -----------------
    pub async fn request_store_keypair(
        &self,
        id: &str,
        secret_key: &[u8],
    ) -> RelayReply<()> {
        let keypair = match Keypair::from_bytes(secret_key) {
            Ok(keypair) => keypair,
            Err(err) => {
                return RelayReply::err(RelayError::InvalidSecretKey(
                    err.to_string(),
                ))
            }
        };
        let address = self.account_states().await.store_keypair(id, keypair).await;
        trace!("Stored keypair {} for {}", id, address);
        RelayReply::ok(())
    }

    pub async fn request_load_keypair(&self, id: &str) -> LoadKeypairResult {
        let secret_key = self
            .account_states()
            .await
            .get_keypair_by_id(id)
            .await
            .map(|entry| entry.keypair.to_bytes().to_vec());
        (id.to_string(), secret_key)
    }

    // -----------------
    // Set Account
    // -----------------
    /// Restarts the validator with the account replaced, keeping all other
    /// known accounts and keypairs
    pub async fn request_set_account(
        &self,
        account: PersistedAccountInfo,
    ) -> RelayReply<()> {
        let pubkey = match account.address() {
            Ok(pubkey) => pubkey,
            Err(err) => return RelayReply::err(err),
        };
        self.restart(Restart::WithOverrides(HashMap::from([(pubkey, account)])))
            .await
            .into()
    }

    // -----------------
    // Restart Validator
    // -----------------
    pub async fn request_restart_validator(&self) -> RelayReply<()> {
        self.restart(Restart::WithOverrides(HashMap::new()))
            .await
            .into()
    }

    /// Only one restart runs at a time, others are rejected while it is in
    /// flight. The account states are only replaced once the validator is up
    /// again.
    async fn restart(&self, restart: Restart) -> RelayResult<()> {
        let Ok(_guard) = self.restart_lock.try_lock() else {
            warn!("Rejecting restart since another one is in progress");
            return Err(RelayError::RestartInProgress);
        };

        let account_states = self.account_states().await;
        account_states.set_paused(true);

        let restored = match restart {
            Restart::WithOverrides(overrides) => {
                let addresses = account_states.all_account_addresses().await;
                let keypairs = account_states.all_keypairs().await;
                let labels = self.known_labels().await;
                info!(
                    "Restarting validator with {} accounts and {} overrides",
                    addresses.len(),
                    overrides.len()
                );
                self.validator
                    .restart_with_overrides(
                        &addresses, &labels, &keypairs, &overrides,
                    )
                    .await
            }
            Restart::WithSnapshot(label) => {
                info!("Restarting validator with snapshot '{}'", label);
                self.validator.restart_with_snapshot(&label).await
            }
        };

        match restored {
            Ok(restored) => {
                self.replace_account_states(restored).await;
                Ok(())
            }
            Err(err) => {
                error!("Failed to restart validator: {}", err);
                account_states.set_paused(false);
                Err(err.into())
            }
        }
    }
}

fn parse_pubkey(address: &str) -> RelayResult<Pubkey> {
    Pubkey::from_str(address)
        .map_err(|_| RelayError::InvalidPubkey(address.to_string()))
}
