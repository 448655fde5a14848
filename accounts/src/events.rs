use solana_sdk::pubkey::Pubkey;
use tokio::sync::broadcast;

use crate::RelayAccountState;

const ACCOUNT_CHANGED_CHANNEL_CAPACITY: usize = 1024;

/// Emitted whenever a state was added to the history of an account.
/// Carries the full relay view of the history.
#[derive(Debug, Clone)]
pub struct AccountChangedEvent {
    pub address: Pubkey,
    pub states: Vec<RelayAccountState>,
}

impl AccountChangedEvent {
    pub fn event_name(&self) -> String {
        account_changed_event_name(&self.address)
    }
}

pub fn account_changed_event_name(address: &Pubkey) -> String {
    format!("account-changed:{}", address)
}

pub type AccountChangedSender = broadcast::Sender<AccountChangedEvent>;
pub type AccountChangedReceiver = broadcast::Receiver<AccountChangedEvent>;

/// The channel outlives account states instances, so subscribers keep
/// receiving events after the account states were replaced
pub fn account_changed_channel() -> AccountChangedSender {
    let (tx, _) = broadcast::channel(ACCOUNT_CHANGED_CHANNEL_CAPACITY);
    tx
}
