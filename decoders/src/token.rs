//! Builtin decoders for SPL token mints and token accounts which are tried
//! when no registered decoder matched an account.
//! Parsing is done by [solana_account_decoder::parse_token] so token-2022
//! accounts with extensions are understood as well.

use std::str::FromStr;

use serde_json::{Map, Value};
use solana_account_decoder::{
    parse_token::{
        parse_token, TokenAccountType, UiAccountState, UiMint, UiTokenAccount,
    },
    parse_token_extension::UiExtension,
};
use solana_sdk::pubkey::Pubkey;

use crate::{
    errors::{DecodersError, DecodersResult},
    AccountDecoder, DecodedAccount, DecoderByteSize,
};

/// Token accounts are parsed without looking up their mint, only the raw
/// amounts are exposed so the decimals passed here never show up.
const RAW_AMOUNT_DECIMALS: u8 = 0;

fn parse_amount(amount: &str) -> DecodersResult<u64> {
    amount.parse().map_err(|err| {
        DecodersError::InvalidData(format!(
            "invalid token amount '{}': {}",
            amount, err
        ))
    })
}

fn parse_address(address: &str) -> DecodersResult<Pubkey> {
    Pubkey::from_str(address).map_err(|err| {
        DecodersError::InvalidData(format!(
            "invalid address '{}': {}",
            address, err
        ))
    })
}

fn optional_address(address: &Option<String>) -> DecodersResult<Option<Pubkey>> {
    address.as_deref().map(parse_address).transpose()
}

fn optional_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn extensions_value(
    extensions: &[UiExtension],
) -> DecodersResult<Option<Value>> {
    if extensions.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_value(extensions)?))
}

// -----------------
// Mint
// -----------------
#[derive(Debug)]
pub struct TokenMint {
    pub mint: UiMint,
    pub supply: u64,
    authorities: Vec<Pubkey>,
    extensions: Option<Value>,
}

impl TokenMint {
    pub fn unpack(data: &[u8]) -> DecodersResult<Self> {
        match parse_token(data, None)? {
            TokenAccountType::Mint(mint) => Self::from_ui(mint),
            _ => Err(DecodersError::InvalidData(
                "not a token mint".to_string(),
            )),
        }
    }

    fn from_ui(mint: UiMint) -> DecodersResult<Self> {
        let supply = parse_amount(&mint.supply)?;
        let authorities = optional_address(&mint.mint_authority)?
            .into_iter()
            .chain(optional_address(&mint.freeze_authority)?)
            .collect();
        let extensions = extensions_value(&mint.extensions)?;
        Ok(Self {
            mint,
            supply,
            authorities,
            extensions,
        })
    }
}

impl DecodedAccount for TokenMint {
    fn pretty(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "mintAuthority".to_string(),
            optional_string(&self.mint.mint_authority),
        );
        map.insert("supply".to_string(), self.supply.into());
        map.insert("decimals".to_string(), self.mint.decimals.into());
        map.insert(
            "isInitialized".to_string(),
            self.mint.is_initialized.into(),
        );
        map.insert(
            "freezeAuthority".to_string(),
            optional_string(&self.mint.freeze_authority),
        );
        if let Some(extensions) = &self.extensions {
            map.insert("extensions".to_string(), extensions.clone());
        }
        map
    }

    fn nested_addresses(&self) -> Vec<Pubkey> {
        self.authorities.clone()
    }
}

pub struct TokenMintDecoder;

impl AccountDecoder for TokenMintDecoder {
    fn name(&self) -> &str {
        "TokenMint"
    }

    fn byte_size(&self) -> DecoderByteSize {
        DecoderByteSize::Variable
    }

    fn try_decode(&self, data: &[u8]) -> DecodersResult<Box<dyn DecodedAccount>> {
        Ok(Box::new(TokenMint::unpack(data)?))
    }
}

// -----------------
// Token Account
// -----------------
#[derive(Debug)]
pub struct TokenAccount {
    pub account: UiTokenAccount,
    pub amount: u64,
    pub delegated_amount: u64,
    /// Rent exempt reserve of wrapped SOL accounts
    pub native_reserve: Option<u64>,
    nested: Vec<Pubkey>,
    extensions: Option<Value>,
}

impl TokenAccount {
    pub fn unpack(data: &[u8]) -> DecodersResult<Self> {
        match parse_token(data, Some(RAW_AMOUNT_DECIMALS))? {
            TokenAccountType::Account(account) => Self::from_ui(account),
            _ => Err(DecodersError::InvalidData(
                "not a token account".to_string(),
            )),
        }
    }

    fn from_ui(account: UiTokenAccount) -> DecodersResult<Self> {
        if let UiAccountState::Uninitialized = account.state {
            return Err(DecodersError::InvalidData(
                "token account is not initialized".to_string(),
            ));
        }
        let amount = parse_amount(&account.token_amount.amount)?;
        let delegated_amount = account
            .delegated_amount
            .as_ref()
            .map(|x| parse_amount(&x.amount))
            .transpose()?
            .unwrap_or_default();
        let native_reserve = match (
            account.is_native,
            account.rent_exempt_reserve.as_ref(),
        ) {
            (true, Some(reserve)) => Some(parse_amount(&reserve.amount)?),
            _ => None,
        };

        let mut nested = vec![
            parse_address(&account.mint)?,
            parse_address(&account.owner)?,
        ];
        nested.extend(optional_address(&account.delegate)?);
        nested.extend(optional_address(&account.close_authority)?);
        let extensions = extensions_value(&account.extensions)?;

        Ok(Self {
            account,
            amount,
            delegated_amount,
            native_reserve,
            nested,
            extensions,
        })
    }

    fn state(&self) -> &'static str {
        match self.account.state {
            UiAccountState::Uninitialized => "uninitialized",
            UiAccountState::Initialized => "initialized",
            UiAccountState::Frozen => "frozen",
        }
    }
}

impl DecodedAccount for TokenAccount {
    fn pretty(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("mint".to_string(), self.account.mint.clone().into());
        map.insert("owner".to_string(), self.account.owner.clone().into());
        map.insert("amount".to_string(), self.amount.into());
        map.insert(
            "delegate".to_string(),
            optional_string(&self.account.delegate),
        );
        map.insert("state".to_string(), self.state().into());
        map.insert(
            "isNative".to_string(),
            self.native_reserve.map(Value::from).unwrap_or(Value::Null),
        );
        map.insert(
            "delegatedAmount".to_string(),
            self.delegated_amount.into(),
        );
        map.insert(
            "closeAuthority".to_string(),
            optional_string(&self.account.close_authority),
        );
        if let Some(extensions) = &self.extensions {
            map.insert("extensions".to_string(), extensions.clone());
        }
        map
    }

    fn nested_addresses(&self) -> Vec<Pubkey> {
        self.nested.clone()
    }
}

pub struct TokenAccountDecoder;

impl AccountDecoder for TokenAccountDecoder {
    fn name(&self) -> &str {
        "TokenAccount"
    }

    fn byte_size(&self) -> DecoderByteSize {
        DecoderByteSize::Variable
    }

    fn try_decode(&self, data: &[u8]) -> DecodersResult<Box<dyn DecodedAccount>> {
        Ok(Box::new(TokenAccount::unpack(data)?))
    }
}
