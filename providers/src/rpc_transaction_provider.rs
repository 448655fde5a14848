use std::collections::HashSet;

use async_trait::async_trait;
use log::*;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig, message::VersionedMessage,
    pubkey::Pubkey, signature::Signature,
};
use solana_transaction_status::UiTransactionEncoding;
use warden_core::{
    errors::{CoreError, CoreResult},
    TransactionProvider,
};

use crate::rpc_provider_config::RpcProviderConfig;

pub struct RpcTransactionProvider {
    rpc_client: RpcClient,
}

impl RpcTransactionProvider {
    pub fn new(config: RpcProviderConfig) -> Self {
        let rpc_client = RpcClient::new_with_commitment(
            config.cluster().url().to_string(),
            CommitmentConfig {
                commitment: config.commitment().unwrap_or_default(),
            },
        );
        Self { rpc_client }
    }
}

#[async_trait]
impl TransactionProvider for RpcTransactionProvider {
    async fn get_non_program_addresses(
        &self,
        signature: &Signature,
    ) -> CoreResult<Option<Vec<Pubkey>>> {
        let tx = match self
            .rpc_client
            .get_transaction_with_config(
                signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Base64),
                    commitment: Some(self.rpc_client.commitment()),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await
        {
            Ok(tx) => tx,
            Err(err) => {
                debug!("Could not find transaction {}: {:?}", signature, err);
                return Ok(None);
            }
        };
        let versioned_tx =
            tx.transaction.transaction.decode().ok_or_else(|| {
                CoreError::FailedToDecodeTransaction(signature.to_string())
            })?;
        Ok(Some(non_program_addresses(&versioned_tx.message)))
    }
}

/// Static account keys of the message which are not invoked as a program by
/// any of its instructions, in the order they appear in the message.
pub fn non_program_addresses(message: &VersionedMessage) -> Vec<Pubkey> {
    let account_keys = message.static_account_keys();
    let program_indexes = message
        .instructions()
        .iter()
        .map(|ix| ix.program_id_index as usize)
        .collect::<HashSet<_>>();
    account_keys
        .iter()
        .enumerate()
        .filter(|(idx, _)| !program_indexes.contains(idx))
        .map(|(_, key)| *key)
        .collect()
}

#[cfg(test)]
mod tests {
    use solana_sdk::{
        hash::Hash, message::Message, signature::Keypair, signer::Signer,
        system_instruction, system_program,
    };

    use super::*;

    #[test]
    fn test_non_program_addresses_of_transfer() {
        let payer = Keypair::new();
        let receiver = Pubkey::new_unique();
        let ix =
            system_instruction::transfer(&payer.pubkey(), &receiver, 1_000);
        let message = VersionedMessage::Legacy(Message::new_with_blockhash(
            &[ix],
            Some(&payer.pubkey()),
            &Hash::default(),
        ));

        let addresses = non_program_addresses(&message);
        assert_eq!(addresses, vec![payer.pubkey(), receiver]);
        assert!(!addresses.contains(&system_program::id()));
    }
}
