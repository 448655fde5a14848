use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use warden_core::{errors::CoreResult, TransactionProvider};

/// Resolves the non program addresses of known transactions
#[derive(Default)]
pub struct TransactionProviderStub {
    pub transactions: RwLock<HashMap<Signature, Vec<Pubkey>>>,
}

impl TransactionProviderStub {
    pub fn add(&self, signature: Signature, addresses: Vec<Pubkey>) {
        self.transactions
            .write()
            .expect("transactions lock poisoned")
            .insert(signature, addresses);
    }
}

#[async_trait]
impl TransactionProvider for TransactionProviderStub {
    async fn get_non_program_addresses(
        &self,
        signature: &Signature,
    ) -> CoreResult<Option<Vec<Pubkey>>> {
        Ok(self
            .transactions
            .read()
            .expect("transactions lock poisoned")
            .get(signature)
            .cloned())
    }
}
