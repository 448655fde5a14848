use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        RwLock,
    },
};

use async_trait::async_trait;
use solana_sdk::{account::Account, clock::Slot, pubkey::Pubkey};
use warden_core::{
    errors::{CoreError, CoreResult},
    AccountProvider,
};

/// Serves accounts from memory. Accounts can be changed while the stub is
/// shared in order to simulate transactions.
#[derive(Default)]
pub struct AccountProviderStub {
    pub accounts: RwLock<HashMap<Pubkey, Account>>,
    slot: AtomicU64,
    /// Refuses larger [AccountProvider::get_multiple_accounts] requests like
    /// the RPC does
    max_multiple_accounts: Option<usize>,
    multiple_accounts_requests: AtomicUsize,
}

impl AccountProviderStub {
    pub fn with_max_multiple_accounts(max: usize) -> Self {
        Self {
            max_multiple_accounts: Some(max),
            ..Self::default()
        }
    }

    /// How many times [AccountProvider::get_multiple_accounts] was called
    pub fn multiple_accounts_requests(&self) -> usize {
        self.multiple_accounts_requests.load(Ordering::Relaxed)
    }

    pub fn add(&self, pubkey: Pubkey, account: Account) {
        self.accounts
            .write()
            .expect("accounts lock poisoned")
            .insert(pubkey, account);
    }

    pub fn remove(&self, pubkey: &Pubkey) {
        self.accounts
            .write()
            .expect("accounts lock poisoned")
            .remove(pubkey);
    }

    pub fn set_slot(&self, slot: Slot) {
        self.slot.store(slot, Ordering::Relaxed);
    }

    fn get(&self, pubkey: &Pubkey) -> Option<Account> {
        self.accounts
            .read()
            .expect("accounts lock poisoned")
            .get(pubkey)
            .cloned()
    }
}

#[async_trait]
impl AccountProvider for AccountProviderStub {
    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> CoreResult<(Slot, Option<Account>)> {
        Ok((self.slot.load(Ordering::Relaxed), self.get(pubkey)))
    }

    async fn get_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
    ) -> CoreResult<(Slot, Vec<Option<Account>>)> {
        self.multiple_accounts_requests
            .fetch_add(1, Ordering::Relaxed);
        if let Some(max) = self.max_multiple_accounts {
            if pubkeys.len() > max {
                return Err(CoreError::TooManyAccountsRequested {
                    requested: pubkeys.len(),
                    max,
                });
            }
        }
        Ok((
            self.slot.load(Ordering::Relaxed),
            pubkeys.iter().map(|pubkey| self.get(pubkey)).collect(),
        ))
    }
}
