use std::{
    collections::{HashMap, HashSet},
    ffi::OsString,
    path::Path,
    sync::Arc,
};

use solana_sdk::pubkey::Pubkey;
use warden_core::KeypairEntries;
use warden_test_tools::{
    account_provider_stub::AccountProviderStub, accounts::account_with_data,
};
use warden_validator::{
    config::{SnapshotConfig, ValidatorConfig},
    errors::ValidatorError,
    SolanaValidator, ValidatorController, ValidatorLifecycle,
};

/// Launches `sleep` which exits right away and never serves RPC
fn unreachable_validator_config(dir: &Path) -> ValidatorConfig {
    ValidatorConfig {
        kill_running_validators: false,
        json_rpc_url: "http://127.0.0.1:1".to_string(),
        websocket_url: "ws://127.0.0.1:2".to_string(),
        ledger_dir: dir.join("ledger"),
        detached: false,
        validator_binary: "sleep".to_string(),
        ready_timeout_secs: 1,
        ..ValidatorConfig::default()
    }
}

fn setup(
    dir: &Path,
    provider: AccountProviderStub,
) -> (Pubkey, SolanaValidator<AccountProviderStub>) {
    let address = Pubkey::new_unique();
    provider.add(address, account_with_data());
    let validator = SolanaValidator::new(
        unreachable_validator_config(dir),
        SnapshotConfig::default(),
        dir.join("accounts"),
        Arc::new(provider),
    );
    (address, validator)
}

fn temporary_snapshots() -> HashSet<OsString> {
    std::fs::read_dir(std::env::temp_dir())
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.file_name())
        .filter(|name| name.to_string_lossy().starts_with("warden-snapshots"))
        .collect()
}

#[tokio::test]
async fn test_failed_restart_removes_temporary_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (address, validator) = setup(dir.path(), AccountProviderStub::default());
    let before = temporary_snapshots();

    let res = validator
        .restart_with_overrides(
            &[address],
            &HashMap::new(),
            &KeypairEntries::new(),
            &HashMap::new(),
        )
        .await;
    assert!(
        matches!(res, Err(ValidatorError::ValidatorNotUp(_))),
        "{:?}",
        res
    );

    assert!(temporary_snapshots().is_subset(&before));
    assert_eq!(validator.lifecycle().await, ValidatorLifecycle::Failed);
    assert_eq!(validator.pid().await, None);
}

#[tokio::test]
async fn test_failed_start_can_be_restarted_until_killed() {
    let dir = tempfile::tempdir().unwrap();
    let (address, validator) = setup(dir.path(), AccountProviderStub::default());

    assert!(validator.start().await.is_err());
    assert_eq!(validator.lifecycle().await, ValidatorLifecycle::Failed);

    let res = validator
        .restart_with_overrides(
            &[address],
            &HashMap::new(),
            &KeypairEntries::new(),
            &HashMap::new(),
        )
        .await;
    assert!(matches!(res, Err(ValidatorError::ValidatorNotUp(_))));

    validator.kill().await.unwrap();
    assert_eq!(validator.lifecycle().await, ValidatorLifecycle::Killed);
    let res = validator
        .restart_with_overrides(
            &[address],
            &HashMap::new(),
            &KeypairEntries::new(),
            &HashMap::new(),
        )
        .await;
    assert!(matches!(res, Err(ValidatorError::Killed)));
}

#[tokio::test]
async fn test_failed_temporary_snapshot_keeps_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    // Every fetch is refused so the snapshot cannot be taken
    let (address, validator) = setup(
        dir.path(),
        AccountProviderStub::with_max_multiple_accounts(0),
    );

    let res = validator
        .restart_with_overrides(
            &[address],
            &HashMap::new(),
            &KeypairEntries::new(),
            &HashMap::new(),
        )
        .await;
    assert!(matches!(res, Err(ValidatorError::PersistError(_))));
    assert_eq!(validator.lifecycle().await, ValidatorLifecycle::NotStarted);
}
