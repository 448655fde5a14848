use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use solana_sdk::{account::Account, pubkey::Pubkey};
use warden_core::{AddressLabels, KeypairEntries};
use warden_persist::PersistedAccountInfo;
use warden_validator::{
    errors::{ValidatorError, ValidatorResult},
    RestoredState, ValidatorController, ValidatorLifecycle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCall {
    RestartWithOverrides {
        addresses: Vec<Pubkey>,
        labels: AddressLabels,
        keypair_ids: Vec<String>,
        overrides: Vec<Pubkey>,
    },
    RestartWithSnapshot(String),
    Kill,
}

#[derive(Default)]
struct StubState {
    calls: Vec<ControllerCall>,
    killed: bool,
}

/// Records the calls made to it and restores the configured accounts
/// instead of running a validator.
pub struct ValidatorControllerStub {
    pid: Option<u32>,
    restored_accounts: HashMap<Pubkey, Account>,
    restart_delay: Option<Duration>,
    state: Mutex<StubState>,
}

impl Default for ValidatorControllerStub {
    fn default() -> Self {
        Self::new(Some(4242))
    }
}

impl ValidatorControllerStub {
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            pid,
            restored_accounts: HashMap::new(),
            restart_delay: None,
            state: Mutex::new(StubState::default()),
        }
    }

    /// Accounts every restart restores in addition to the overrides
    pub fn with_restored_accounts(
        mut self,
        accounts: HashMap<Pubkey, Account>,
    ) -> Self {
        self.restored_accounts = accounts;
        self
    }

    /// Makes restarts take `delay` to complete
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ControllerCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().expect("stub state lock poisoned")
    }

    fn record(&self, call: ControllerCall) -> ValidatorResult<()> {
        let mut state = self.lock();
        if state.killed && call != ControllerCall::Kill {
            return Err(ValidatorError::Killed);
        }
        state.calls.push(call);
        Ok(())
    }

    async fn delay(&self) {
        if let Some(delay) = self.restart_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ValidatorController for ValidatorControllerStub {
    async fn pid(&self) -> Option<u32> {
        if self.lock().killed {
            None
        } else {
            self.pid
        }
    }

    async fn lifecycle(&self) -> ValidatorLifecycle {
        if self.lock().killed {
            ValidatorLifecycle::Killed
        } else {
            ValidatorLifecycle::Up
        }
    }

    async fn restart_with_overrides(
        &self,
        addresses: &[Pubkey],
        labels: &AddressLabels,
        keypairs: &KeypairEntries,
        overrides: &HashMap<Pubkey, PersistedAccountInfo>,
    ) -> ValidatorResult<RestoredState> {
        let mut keypair_ids =
            keypairs.values().map(|x| x.id.clone()).collect::<Vec<_>>();
        keypair_ids.sort();
        let mut override_addresses = overrides.keys().copied().collect::<Vec<_>>();
        override_addresses.sort();
        self.record(ControllerCall::RestartWithOverrides {
            addresses: addresses.to_vec(),
            labels: labels.clone(),
            keypair_ids,
            overrides: override_addresses,
        })?;
        self.delay().await;

        let mut accounts = self.restored_accounts.clone();
        for info in overrides.values() {
            let (address, account) = info.to_account()?;
            accounts.insert(address, account);
        }
        Ok(RestoredState {
            accounts,
            keypairs: keypairs.clone(),
            labels: labels.clone(),
        })
    }

    async fn restart_with_snapshot(
        &self,
        label: &str,
    ) -> ValidatorResult<RestoredState> {
        self.record(ControllerCall::RestartWithSnapshot(label.to_string()))?;
        self.delay().await;
        Ok(RestoredState {
            accounts: self.restored_accounts.clone(),
            ..RestoredState::default()
        })
    }

    async fn kill(&self) -> ValidatorResult<()> {
        self.record(ControllerCall::Kill)?;
        self.lock().killed = true;
        Ok(())
    }
}
