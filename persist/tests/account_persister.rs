use std::{collections::HashMap, sync::Arc};

use solana_sdk::{
    account::Account,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use warden_core::{KeypairEntries, KeypairEntry};
use warden_persist::{
    create_temporary_snapshot, errors::PersistError, load_account,
    load_snapshot, AccountPersister, PersistedAccountInfo,
    SNAPSHOT_ACCOUNTS_DIR,
};
use warden_test_tools::{
    account_provider_stub::AccountProviderStub,
    accounts::{account_with_data, program_account, FIXTURE_ADDRESS},
};

fn keypair_entries(entries: Vec<KeypairEntry>) -> KeypairEntries {
    entries
        .into_iter()
        .map(|entry| (entry.address(), entry))
        .collect()
}

#[tokio::test]
async fn test_save_account_info_and_load_it_back() {
    let dir = tempfile::tempdir().unwrap();
    let persister = AccountPersister::<AccountProviderStub>::new(dir.path());

    let address = Pubkey::new_unique();
    let account = account_with_data();
    let path = persister
        .save_account_info(&address, &account, None, None)
        .await
        .unwrap();
    assert_eq!(path, dir.path().join(format!("{}.json", address)));

    let loaded = load_account(&address, dir.path(), None).await.unwrap();
    let (loaded_address, loaded_account) = loaded.to_account().unwrap();
    assert_eq!(loaded_address, address);
    assert_eq!(loaded_account.lamports, account.lamports);
    assert_eq!(loaded_account.owner, account.owner);
    assert_eq!(loaded_account.executable, account.executable);
    assert_eq!(loaded_account.data, account.data);
}

#[tokio::test]
async fn test_saved_file_is_pretty_json() {
    let dir = tempfile::tempdir().unwrap();
    let persister = AccountPersister::<AccountProviderStub>::new(dir.path());

    let address = Pubkey::new_unique();
    let path = persister
        .save_account_info(&address, &account_with_data(), None, Some("alice"))
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("alice.json"));

    let json = std::fs::read_to_string(path).unwrap();
    assert!(json.starts_with("{\n  \"pubkey\": "));
    assert!(json.contains("\"rentEpoch\": 0"));
}

#[tokio::test]
async fn test_refuses_to_save_executable() {
    let dir = tempfile::tempdir().unwrap();
    let persister = AccountPersister::<AccountProviderStub>::new(dir.path());

    let res = persister
        .save_account_info(&Pubkey::new_unique(), &program_account(), None, None)
        .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn test_save_account_with_data_override() {
    let dir = tempfile::tempdir().unwrap();
    let provider = AccountProviderStub::default();
    let address = Pubkey::new_unique();
    provider.add(address, account_with_data());
    let persister = AccountPersister::with_provider(dir.path(), Arc::new(provider));

    persister
        .save_account(&address, Some(vec![9, 9]))
        .await
        .unwrap();
    let (_, account) = load_account(&address, dir.path(), None)
        .await
        .unwrap()
        .to_account()
        .unwrap();
    assert_eq!(account.data, vec![9, 9]);

    assert!(persister
        .save_account(&Pubkey::new_unique(), None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_snapshot_of_fixture_account() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = account_with_data();
    let provider = AccountProviderStub::default();
    provider.add(FIXTURE_ADDRESS, fixture.clone());
    let persister = AccountPersister::with_provider(dir.path(), Arc::new(provider));

    let labels = HashMap::from([(
        FIXTURE_ADDRESS.to_string(),
        "fixture".to_string(),
    )]);
    let snapshot_dir = persister
        .snapshot(
            "snap1",
            &[FIXTURE_ADDRESS],
            &labels,
            &KeypairEntries::new(),
            &HashMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(snapshot_dir, dir.path().join("snap1"));

    let json = std::fs::read_to_string(
        snapshot_dir.join(SNAPSHOT_ACCOUNTS_DIR).join("fixture.json"),
    )
    .unwrap();
    let persisted: PersistedAccountInfo = serde_json::from_str(&json).unwrap();
    assert_eq!(persisted.pubkey, FIXTURE_ADDRESS.to_string());
    assert_eq!(persisted.account.lamports, fixture.lamports);
    assert_eq!(persisted.account.owner, fixture.owner.to_string());
    assert!(!persisted.account.executable);
    assert_eq!(persisted.account.data.0, "AQIDBA==");
}

#[tokio::test]
async fn test_snapshot_overrides_keypairs_and_skips() {
    let dir = tempfile::tempdir().unwrap();
    let provider = AccountProviderStub::default();

    let regular = Pubkey::new_unique();
    let overridden = Pubkey::new_unique();
    let program = Pubkey::new_unique();
    let missing = Pubkey::new_unique();
    provider.add(regular, account_with_data());
    provider.add(overridden, account_with_data());
    provider.add(program, program_account());
    let persister = AccountPersister::with_provider(dir.path(), Arc::new(provider));

    let override_account = Account {
        lamports: 42,
        ..account_with_data()
    };
    let overrides = HashMap::from([(
        overridden,
        PersistedAccountInfo::from_account(&overridden, &override_account),
    )]);

    let payer = Keypair::new();
    let payer_address = payer.pubkey();
    let keypairs = keypair_entries(vec![
        KeypairEntry::new("payer", payer),
        KeypairEntry::new("other", Keypair::new()),
    ]);

    persister
        .snapshot(
            "snap",
            &[regular, overridden, program, missing],
            &HashMap::new(),
            &keypairs,
            &overrides,
        )
        .await
        .unwrap();

    let loaded = load_snapshot(dir.path(), "snap").await.unwrap();
    let infos = loaded.account_infos().unwrap();
    assert_eq!(infos.len(), 2);
    assert!(infos.contains_key(&regular));
    assert_eq!(infos[&overridden].lamports, 42);
    assert!(!infos.contains_key(&program));
    assert!(!infos.contains_key(&missing));

    let args = loaded.account_args();
    assert_eq!(args.len(), 6);
    assert_eq!(args[0], "--account");

    let keypairs = loaded.keypair_entries();
    assert_eq!(keypairs.len(), 2);
    assert_eq!(keypairs[&payer_address].id, "payer");
}

#[tokio::test]
async fn test_snapshot_replaces_existing_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(AccountProviderStub::default());
    let first = Pubkey::new_unique();
    let second = Pubkey::new_unique();
    provider.add(first, account_with_data());
    provider.add(second, account_with_data());
    let persister = AccountPersister::with_provider(dir.path(), provider);

    let no_keypairs = KeypairEntries::new();
    for address in [first, second] {
        persister
            .snapshot(
                "snap",
                &[address],
                &HashMap::new(),
                &no_keypairs,
                &HashMap::new(),
            )
            .await
            .unwrap();
    }

    let loaded = load_snapshot(dir.path(), "snap").await.unwrap();
    assert_eq!(loaded.accounts.len(), 1);
    assert_eq!(loaded.accounts[0].info.pubkey, second.to_string());
    assert!(loaded.keypairs.is_empty());
}

#[tokio::test]
async fn test_temporary_snapshot_is_removed() {
    let provider = Arc::new(AccountProviderStub::default());
    let address = Pubkey::new_unique();
    provider.add(address, account_with_data());

    let snapshot = create_temporary_snapshot(
        provider,
        &[address],
        &HashMap::new(),
        &KeypairEntries::new(),
        &HashMap::new(),
    )
    .await
    .unwrap();

    let snapshot_dir = snapshot.snapshot_dir();
    let loaded = load_snapshot(snapshot.snapshot_folder(), snapshot.label())
        .await
        .unwrap();
    assert_eq!(loaded.accounts.len(), 1);

    snapshot.cleanup().unwrap();
    assert!(!snapshot_dir.exists());
}

#[tokio::test]
async fn test_snapshot_fetches_accounts_in_batches() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(AccountProviderStub::with_max_multiple_accounts(100));
    let addresses = (0..150).map(|_| Pubkey::new_unique()).collect::<Vec<_>>();
    for address in &addresses {
        provider.add(*address, account_with_data());
    }
    let persister = AccountPersister::with_provider(dir.path(), provider.clone());

    persister
        .snapshot(
            "many",
            &addresses,
            &HashMap::new(),
            &KeypairEntries::new(),
            &HashMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(provider.multiple_accounts_requests(), 2);

    let loaded = load_snapshot(dir.path(), "many").await.unwrap();
    assert_eq!(loaded.accounts.len(), 150);
}

#[tokio::test]
async fn test_snapshot_rejects_labels_outside_target_dir() {
    let root = tempfile::tempdir().unwrap();
    let target_dir = root.path().join("snapshots");
    let provider = Arc::new(AccountProviderStub::default());
    let address = Pubkey::new_unique();
    provider.add(address, account_with_data());
    let persister = AccountPersister::with_provider(&target_dir, provider);

    let no_keypairs = KeypairEntries::new();
    persister
        .snapshot(
            "keep-me",
            &[address],
            &HashMap::new(),
            &no_keypairs,
            &HashMap::new(),
        )
        .await
        .unwrap();
    std::fs::write(root.path().join("sibling.txt"), "x").unwrap();

    for label in ["", "..", ".", "a/b", "/tmp"] {
        let res = persister
            .snapshot(
                label,
                &[address],
                &HashMap::new(),
                &no_keypairs,
                &HashMap::new(),
            )
            .await;
        assert!(
            matches!(res, Err(PersistError::InvalidFileName(ref name)) if name == label),
            "label '{}' was accepted",
            label
        );
    }

    assert!(target_dir.join("keep-me").exists());
    assert!(root.path().join("sibling.txt").exists());
}

#[tokio::test]
async fn test_rejects_account_labels_and_keypair_ids_with_paths() {
    let dir = tempfile::tempdir().unwrap();
    let persister = AccountPersister::<AccountProviderStub>::new(dir.path());

    let res = persister
        .save_account_info(
            &Pubkey::new_unique(),
            &account_with_data(),
            None,
            Some("a/../../x"),
        )
        .await;
    assert!(matches!(res, Err(PersistError::InvalidFileName(_))));

    let res = persister.save_keypair("../payer", &Keypair::new(), None).await;
    assert!(matches!(res, Err(PersistError::InvalidFileName(_))));
}

#[tokio::test]
async fn test_snapshot_saves_accounts_with_path_labels_under_address() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(AccountProviderStub::default());
    let address = Pubkey::new_unique();
    provider.add(address, account_with_data());
    let persister = AccountPersister::with_provider(dir.path(), provider);

    let labels = HashMap::from([(address.to_string(), "../escape".to_string())]);
    let keypairs = keypair_entries(vec![
        KeypairEntry::new("../payer", Keypair::new()),
        KeypairEntry::new("payer", Keypair::new()),
    ]);
    let snapshot_dir = persister
        .snapshot("snap", &[address], &labels, &keypairs, &HashMap::new())
        .await
        .unwrap();

    assert!(snapshot_dir
        .join(SNAPSHOT_ACCOUNTS_DIR)
        .join(format!("{}.json", address))
        .exists());
    assert!(!dir.path().join("escape.json").exists());
    let loaded = load_snapshot(dir.path(), "snap").await.unwrap();
    assert_eq!(loaded.keypairs.len(), 1);
}
