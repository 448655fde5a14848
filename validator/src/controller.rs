use std::collections::HashMap;

use async_trait::async_trait;
use solana_sdk::{account::Account, pubkey::Pubkey};
use warden_core::{AddressLabels, KeypairEntries};
use warden_persist::PersistedAccountInfo;

use crate::errors::ValidatorResult;

/// Accounts, keypairs and labels the validator was (re)started with.
/// Used to seed the account states.
#[derive(Debug, Default)]
pub struct RestoredState {
    pub accounts: HashMap<Pubkey, Account>,
    pub keypairs: KeypairEntries,
    pub labels: AddressLabels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorLifecycle {
    NotStarted,
    Spawning,
    Up,
    Restarting,
    /// The last launch failed, the validator can be restarted
    Failed,
    Killed,
}

/// Controls the validator process on behalf of the relay
#[async_trait]
pub trait ValidatorController: Send + Sync + 'static {
    /// Process id of the running validator, `None` if none is running
    async fn pid(&self) -> Option<u32>;

    async fn lifecycle(&self) -> ValidatorLifecycle;

    /// Restarts the validator with the current state of the known
    /// `addresses` and `keypairs`, replacing accounts with the `overrides`.
    async fn restart_with_overrides(
        &self,
        addresses: &[Pubkey],
        labels: &AddressLabels,
        keypairs: &KeypairEntries,
        overrides: &HashMap<Pubkey, PersistedAccountInfo>,
    ) -> ValidatorResult<RestoredState>;

    /// Restarts the validator loading the snapshot saved under `label`
    async fn restart_with_snapshot(
        &self,
        label: &str,
    ) -> ValidatorResult<RestoredState>;

    async fn kill(&self) -> ValidatorResult<()>;
}
