use async_trait::async_trait;
use solana_sdk::{
    account::Account, clock::Slot, pubkey::Pubkey, signature::Signature,
};
use solana_rpc_client_api::request::MAX_MULTIPLE_ACCOUNTS;
use tokio::sync::mpsc;

use crate::{errors::CoreResult, LogsNotification};

/// Source of on-chain account data, usually the local validator.
#[async_trait]
pub trait AccountProvider: Send + Sync + 'static {
    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> CoreResult<(Slot, Option<Account>)>;
    /// Fetches at most [MAX_MULTIPLE_ACCOUNTS] accounts in one request.
    async fn get_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
    ) -> CoreResult<(Slot, Vec<Option<Account>>)>;

    /// Fetches any number of accounts in batches of [MAX_MULTIPLE_ACCOUNTS].
    /// Accounts are returned in the order of `pubkeys` together with the
    /// highest slot any batch was fetched at.
    async fn get_accounts_batched(
        &self,
        pubkeys: &[Pubkey],
    ) -> CoreResult<(Slot, Vec<Option<Account>>)> {
        let mut slot = 0;
        let mut accounts = Vec::with_capacity(pubkeys.len());
        for batch in pubkeys.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let (batch_slot, batch_accounts) =
                self.get_multiple_accounts(batch).await?;
            slot = slot.max(batch_slot);
            accounts.extend(batch_accounts);
        }
        Ok((slot, accounts))
    }
}

/// Source of confirmed transactions.
#[async_trait]
pub trait TransactionProvider: Send + Sync + 'static {
    /// Resolves the addresses referenced by the transaction that are not
    /// invoked as programs.
    /// Returns `None` if the transaction could not be found.
    async fn get_non_program_addresses(
        &self,
        signature: &Signature,
    ) -> CoreResult<Option<Vec<Pubkey>>>;
}

/// Stream of transaction logs emitted by the validator.
#[async_trait]
pub trait LogsProvider: Send + Sync + 'static {
    /// Subscribes to the logs of all transactions. The subscription ends
    /// when the returned receiver is dropped or the validator goes away.
    async fn subscribe_logs(
        &self,
    ) -> CoreResult<mpsc::UnboundedReceiver<LogsNotification>>;
}
