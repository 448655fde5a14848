use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, Weak,
    },
};

use futures_util::future::join_all;
use log::*;
use solana_sdk::{
    account::Account,
    clock::Slot,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};
use tokio::{
    sync::{mpsc, RwLock},
    task::JoinHandle,
};
use warden_core::{
    errors::CoreResult, AccountProvider, AddressLabels, KeypairEntries,
    KeypairEntry, LogsNotification, TransactionProvider,
};
use warden_decoders::{AccountDecoderRegistry, ResolvedAccount};

use crate::{
    AccountChangedEvent, AccountChangedReceiver, AccountChangedSender,
    AccountHistory, AccountSnapshot, RelayAccountState,
};

/// Tracks the history of every account touched by a transaction on the
/// validator together with the keypairs stored by clients.
pub struct AccountStates<T: AccountProvider, U: TransactionProvider> {
    account_provider: Arc<T>,
    transaction_provider: Arc<U>,
    registry: Arc<AccountDecoderRegistry>,
    histories: RwLock<HashMap<Pubkey, AccountHistory>>,
    keypairs: RwLock<KeypairEntries>,
    paused: AtomicBool,
    account_changed: AccountChangedSender,
    logs_listener: Mutex<Option<JoinHandle<()>>>,
}

impl<T: AccountProvider, U: TransactionProvider> Drop for AccountStates<T, U> {
    fn drop(&mut self) {
        if let Ok(mut listener) = self.logs_listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

impl<T: AccountProvider, U: TransactionProvider> AccountStates<T, U> {
    /// Creates the account states and adds a state at slot `0` for each of
    /// the `loaded_accounts` before returning.
    pub async fn with_providers(
        account_provider: Arc<T>,
        transaction_provider: Arc<U>,
        registry: Arc<AccountDecoderRegistry>,
        account_changed: AccountChangedSender,
        loaded_accounts: HashMap<Pubkey, Account>,
        loaded_keypairs: KeypairEntries,
    ) -> Arc<Self> {
        let states = Arc::new(Self {
            account_provider,
            transaction_provider,
            registry,
            histories: RwLock::new(HashMap::new()),
            keypairs: RwLock::new(loaded_keypairs),
            paused: AtomicBool::new(false),
            account_changed,
            logs_listener: Mutex::new(None),
        });
        for (address, account) in loaded_accounts {
            if let Err(err) = states.update(address, 0, Some(account)).await {
                warn!("Failed to add loaded account {}: {:?}", address, err);
            }
        }
        states
    }

    // -----------------
    // Logs
    // -----------------
    /// Updates the accounts of every transaction received on `logs`.
    /// The listener stops when these account states are dropped.
    pub fn listen_to_logs(
        self: &Arc<Self>,
        mut logs: mpsc::UnboundedReceiver<LogsNotification>,
    ) {
        let states: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            while let Some(notification) = logs.recv().await {
                let Some(states) = states.upgrade() else {
                    break;
                };
                tokio::spawn(async move {
                    states.on_logs(notification).await;
                });
            }
            debug!("Stopped listening to logs");
        });
        if let Ok(mut listener) = self.logs_listener.lock() {
            if let Some(previous) = listener.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Updates every non program account of the transaction at the slot the
    /// logs were received.
    pub async fn on_logs(&self, notification: LogsNotification) {
        if self.is_paused() {
            return;
        }
        let signature = match Signature::from_str(&notification.signature) {
            Ok(signature) => signature,
            Err(err) => {
                warn!(
                    "Invalid signature {}: {:?}",
                    notification.signature, err
                );
                return;
            }
        };
        let addresses = match self
            .transaction_provider
            .get_non_program_addresses(&signature)
            .await
        {
            Ok(Some(addresses)) => addresses,
            Ok(None) => {
                debug!("Could not find transaction {}", signature);
                return;
            }
            Err(err) => {
                warn!("Failed to get transaction {}: {:?}", signature, err);
                return;
            }
        };

        let slot = notification.slot;
        let updates = addresses.into_iter().map(|address| async move {
            if self.is_paused() {
                return;
            }
            if let Err(err) = self.update(address, slot, None).await
            {
                warn!("Failed to update account {}: {:?}", address, err);
            }
        });
        join_all(updates).await;
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// While paused, transaction logs are ignored. Direct updates still
    /// apply.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    // -----------------
    // Account States
    // -----------------
    /// Adds the current state of the account to its history.
    /// The account is fetched from the validator unless provided.
    /// Unseen addresses the decoded account refers to are added as well.
    pub async fn update(
        &self,
        address: Pubkey,
        slot: Slot,
        account: Option<Account>,
    ) -> CoreResult<()> {
        let Some(nested) = self.fetch_and_add(address, slot, account).await?
        else {
            return Ok(());
        };

        let unseen = {
            let histories = self.histories.read().await;
            nested
                .into_iter()
                .filter(|x| *x != address && !histories.contains_key(x))
                .collect::<HashSet<_>>()
        };
        for nested_address in unseen {
            // Nested accounts are best effort and do not resolve further
            if let Err(err) = self.fetch_and_add(nested_address, slot, None).await
            {
                debug!(
                    "Failed to resolve nested account {}: {:?}",
                    nested_address, err
                );
            }
        }
        Ok(())
    }

    /// Returns the nested addresses of the decoded account or `None` if the
    /// account does not exist.
    async fn fetch_and_add(
        &self,
        address: Pubkey,
        slot: Slot,
        account: Option<Account>,
    ) -> CoreResult<Option<Vec<Pubkey>>> {
        let account = match account {
            Some(account) => account,
            None => match self.account_provider.get_account(&address).await? {
                (_, Some(account)) => account,
                (_, None) => {
                    trace!("Account {} not found", address);
                    return Ok(None);
                }
            },
        };

        // Decoding happens outside the lock, only diffing against the
        // previous state needs to be serialized per address
        let resolved = self.registry.resolve(&address, &account);
        let (decoded, rendered) = match resolved {
            Some(ResolvedAccount {
                decoded, rendered, ..
            }) => (Some(decoded), rendered),
            None => (None, None),
        };
        let nested = decoded
            .as_ref()
            .map(|x| x.nested_addresses())
            .unwrap_or_default();

        let states = {
            let mut histories = self.histories.write().await;
            let history = histories.entry(address).or_default();
            history.add(decoded, account.data, slot, rendered);
            history.relay_states()
        };
        trace!("Updated account {} at slot {}", address, slot);

        // No receivers is fine
        let _ = self
            .account_changed
            .send(AccountChangedEvent { address, states });

        Ok(Some(nested))
    }

    /// Relay view of the history of the account, empty if it was never
    /// updated
    pub async fn relay_states(&self, address: &Pubkey) -> Vec<RelayAccountState> {
        self.histories
            .read()
            .await
            .get(address)
            .map(AccountHistory::relay_states)
            .unwrap_or_default()
    }

    pub async fn history_len(&self, address: &Pubkey) -> usize {
        self.histories
            .read()
            .await
            .get(address)
            .map(AccountHistory::len)
            .unwrap_or_default()
    }

    pub async fn account_state_for_slot(
        &self,
        address: &Pubkey,
        slot: Slot,
    ) -> Option<AccountSnapshot> {
        self.histories
            .read()
            .await
            .get(address)
            .and_then(|history| history.state_for_slot(slot))
            .cloned()
    }

    pub async fn account_data_for_slot(
        &self,
        address: &Pubkey,
        slot: Slot,
    ) -> Option<Vec<u8>> {
        self.histories
            .read()
            .await
            .get(address)
            .and_then(|history| history.data_for_slot(slot))
            .map(<[u8]>::to_vec)
    }

    pub async fn all_account_addresses(&self) -> Vec<Pubkey> {
        self.histories.read().await.keys().copied().collect()
    }

    pub fn subscribe(&self) -> AccountChangedReceiver {
        self.account_changed.subscribe()
    }

    // -----------------
    // Keypairs
    // -----------------
    /// Stores the keypair under its address replacing any keypair stored
    /// for that address before
    pub async fn store_keypair(&self, id: &str, keypair: Keypair) -> Pubkey {
        let entry = KeypairEntry::new(id, keypair);
        let address = entry.address();
        self.keypairs.write().await.insert(address, entry);
        address
    }

    /// Replaces the ids of stored keypairs with the labels of their
    /// addresses. Keypairs are never added here.
    pub async fn label_keypairs(&self, labels: &AddressLabels) {
        let mut keypairs = self.keypairs.write().await;
        for (address, label) in labels {
            let Ok(address) = Pubkey::from_str(address) else {
                continue;
            };
            if let Some(entry) = keypairs.get_mut(&address) {
                entry.id = label.clone();
            }
        }
    }

    pub async fn all_keypairs(&self) -> KeypairEntries {
        self.keypairs.read().await.clone()
    }

    pub async fn get_keypair_by_id(&self, id: &str) -> Option<KeypairEntry> {
        self.keypairs
            .read()
            .await
            .values()
            .find(|entry| entry.id == id)
            .cloned()
    }

    pub async fn get_keypair_by_address(
        &self,
        address: &Pubkey,
    ) -> Option<KeypairEntry> {
        self.keypairs.read().await.get(address).cloned()
    }
}
