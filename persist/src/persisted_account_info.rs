use std::{collections::HashMap, str::FromStr};

use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use solana_sdk::{account::Account, pubkey::Pubkey};

use crate::errors::{PersistError, PersistResult};

const BASE64_ENCODING: &str = "base64";

/// On disk representation of an account, compatible with the json files
/// written by `solana account --output json` and accepted by the
/// `--account` option of the test validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAccountInfo {
    pub pubkey: String,
    pub account: PersistedAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAccount {
    pub lamports: u64,
    /// `[<data>, <encoding>]`, the encoding is always `base64`
    pub data: (String, String),
    pub owner: String,
    pub executable: bool,
    #[serde(default)]
    pub rent_epoch: u64,
}

impl PersistedAccountInfo {
    pub fn from_account(pubkey: &Pubkey, account: &Account) -> Self {
        Self {
            pubkey: pubkey.to_string(),
            account: PersistedAccount {
                lamports: account.lamports,
                data: (
                    BASE64_STANDARD.encode(&account.data),
                    BASE64_ENCODING.to_string(),
                ),
                owner: account.owner.to_string(),
                executable: account.executable,
                rent_epoch: account.rent_epoch,
            },
        }
    }

    pub fn address(&self) -> PersistResult<Pubkey> {
        parse_pubkey(&self.pubkey)
    }

    /// Converts back into the address and the account it describes
    pub fn to_account(&self) -> PersistResult<(Pubkey, Account)> {
        let PersistedAccount {
            lamports,
            data: (data, encoding),
            owner,
            executable,
            rent_epoch,
        } = &self.account;
        if encoding != BASE64_ENCODING {
            return Err(PersistError::UnsupportedDataEncoding(
                encoding.to_string(),
            ));
        }
        let account = Account {
            lamports: *lamports,
            data: BASE64_STANDARD.decode(data)?,
            owner: parse_pubkey(owner)?,
            executable: *executable,
            rent_epoch: *rent_epoch,
        };
        Ok((self.address()?, account))
    }
}

pub(crate) fn parse_pubkey(address: &str) -> PersistResult<Pubkey> {
    Pubkey::from_str(address)
        .map_err(|_| PersistError::InvalidPubkey(address.to_string()))
}

/// Maps persisted accounts to the accounts they describe keyed by address
pub fn map_persisted_account_infos<'a>(
    persisteds: impl IntoIterator<Item = &'a PersistedAccountInfo>,
) -> PersistResult<HashMap<Pubkey, Account>> {
    persisteds
        .into_iter()
        .map(PersistedAccountInfo::to_account)
        .collect()
}
