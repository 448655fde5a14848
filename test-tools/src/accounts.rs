use solana_sdk::{
    account::Account, pubkey, pubkey::Pubkey, system_program,
};
use spl_token::{
    solana_program::{program_option::COption, program_pack::Pack},
    state::{Account as TokenAccount, AccountState, Mint},
};
use warden_addresses::consts::TOKEN_PROGRAM_ID;

/// Address used for the account fixture in snapshot scenarios
pub const FIXTURE_ADDRESS: Pubkey =
    pubkey!("8k2V7EzQtNg38Gi9HK5ZtQYp1YpGKNGrMcuGa737gZX4");

pub fn account_owned_by_system_program() -> Account {
    Account {
        lamports: 1_000_000,
        owner: system_program::id(),
        ..Account::default()
    }
}

pub fn account_with_data() -> Account {
    Account {
        lamports: 2_039_280,
        owner: Pubkey::new_unique(),
        data: vec![1, 2, 3, 4],
        rent_epoch: 0,
        ..Account::default()
    }
}

/// Account whose data is a single counter byte tagged for the
/// [crate::decoders::CounterDecoder]
pub fn counter_account(count: u8) -> Account {
    Account {
        lamports: 1_000_000,
        owner: Pubkey::new_unique(),
        data: vec![crate::decoders::COUNTER_TAG, count],
        ..Account::default()
    }
}

pub fn program_account() -> Account {
    Account {
        lamports: 1_000_000,
        executable: true,
        data: vec![1, 2, 3],
        ..Account::default()
    }
}

fn pack<T: Pack>(state: T) -> Vec<u8> {
    let mut data = vec![0; T::LEN];
    T::pack(state, &mut data).expect("token state fits its packed length");
    data
}

pub fn token_mint_account(mint_authority: Pubkey, supply: u64) -> Account {
    let mint = Mint {
        mint_authority: COption::Some(mint_authority),
        supply,
        decimals: 9,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    Account {
        lamports: 1_461_600,
        owner: TOKEN_PROGRAM_ID,
        data: pack(mint),
        ..Account::default()
    }
}

pub fn token_account(mint: Pubkey, owner: Pubkey, amount: u64) -> Account {
    let token = TokenAccount {
        mint,
        owner,
        amount,
        delegate: COption::None,
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount: 0,
        close_authority: COption::None,
    };
    Account {
        lamports: 2_039_280,
        owner: TOKEN_PROGRAM_ID,
        data: pack(token),
        ..Account::default()
    }
}
