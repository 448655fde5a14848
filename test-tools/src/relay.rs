use std::{path::Path, sync::Arc};

use warden_accounts::account_changed_channel;
use warden_relay::{RelayHandler, RelayHandlerConfig, RelayProviders};
use warden_validator::RestoredState;

use crate::{
    account_provider_stub::AccountProviderStub, decoders::counter_registry,
    transaction_provider_stub::TransactionProviderStub,
    validator_controller_stub::ValidatorControllerStub,
};

pub type StubRelayHandler = RelayHandler<
    AccountProviderStub,
    TransactionProviderStub,
    ValidatorControllerStub,
>;

/// Relay handler backed by stubs which persists into `dir`.
/// The restored accounts are also served by the returned account provider.
pub async fn stub_relay_handler(
    dir: &Path,
    validator: ValidatorControllerStub,
    restored: RestoredState,
) -> (Arc<AccountProviderStub>, Arc<StubRelayHandler>) {
    let account_provider = Arc::new(AccountProviderStub::default());
    for (address, account) in &restored.accounts {
        account_provider.add(*address, account.clone());
    }
    let handler = RelayHandler::with_providers(
        RelayHandlerConfig {
            accounts_folder: dir.join("accounts"),
            snapshot_folder: dir.join("snapshots"),
        },
        RelayProviders {
            account_provider: account_provider.clone(),
            transaction_provider: Arc::new(TransactionProviderStub::default()),
            logs_provider: None,
        },
        Arc::new(counter_registry()),
        Arc::new(validator),
        account_changed_channel(),
        restored,
    )
    .await;
    (account_provider, Arc::new(handler))
}
