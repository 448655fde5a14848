use std::fmt;

use serde_json::{Map, Value};
use solana_sdk::pubkey::Pubkey;

use crate::errors::DecodersResult;

/// An account decoded into a representation that can be inspected.
/// The account states only ever look at the [DecodedAccount::pretty] view.
pub trait DecodedAccount: fmt::Debug + Send + Sync + 'static {
    /// Ordered key/value view of the decoded account.
    fn pretty(&self) -> Map<String, Value>;

    /// Addresses referenced by fields of the account, i.e. a mint or an owner.
    fn nested_addresses(&self) -> Vec<Pubkey> {
        vec![]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderByteSize {
    /// Only accounts with exactly this many bytes of data are tried
    Fixed(usize),
    /// Tried for any data length once no fixed size decoder matched
    Variable,
}

pub trait AccountDecoder: Send + Sync + 'static {
    /// Unique name which is also used to find the renderer for the decoder
    fn name(&self) -> &str;

    fn byte_size(&self) -> DecoderByteSize;

    /// Returns an error if the data is not of the account type this decoder
    /// handles.
    fn try_decode(&self, data: &[u8]) -> DecodersResult<Box<dyn DecodedAccount>>;
}
