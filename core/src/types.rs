use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use solana_rpc_client_api::response::{Response, RpcLogsResponse};
use solana_sdk::{
    clock::Slot,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

// -----------------
// LogsNotification
// -----------------
/// A transaction observed on the logs stream of the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsNotification {
    /// The slot at which the logs were emitted
    pub slot: Slot,
    /// Base58 signature of the transaction
    pub signature: String,
    /// `true` if the transaction failed
    pub failed: bool,
}

impl From<Response<RpcLogsResponse>> for LogsNotification {
    fn from(response: Response<RpcLogsResponse>) -> Self {
        Self {
            slot: response.context.slot,
            signature: response.value.signature,
            failed: response.value.err.is_some(),
        }
    }
}

// -----------------
// Keypairs and Labels
// -----------------
/// A keypair stored with the supervisor together with the id it was stored
/// under. The id doubles as the display label of the keypair's address.
#[derive(Debug, Clone)]
pub struct KeypairEntry {
    pub keypair: Arc<Keypair>,
    pub id: String,
}

impl KeypairEntry {
    pub fn new(id: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
            id: id.into(),
        }
    }

    pub fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

/// Keypairs keyed by the address of their public key
pub type KeypairEntries = HashMap<Pubkey, KeypairEntry>;

/// Display labels keyed by base58 address
pub type AddressLabels = HashMap<String, String>;
