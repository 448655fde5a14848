use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::{
    config::RpcAccountInfoConfig, request::MAX_MULTIPLE_ACCOUNTS,
};
use solana_sdk::{
    account::Account, clock::Slot, commitment_config::CommitmentConfig,
    pubkey::Pubkey,
};
use warden_core::{
    errors::{CoreError, CoreResult},
    AccountProvider,
};

use crate::rpc_provider_config::RpcProviderConfig;

pub struct RpcAccountProvider {
    rpc_client: RpcClient,
}

impl RpcAccountProvider {
    pub fn new(config: RpcProviderConfig) -> Self {
        let rpc_client = RpcClient::new_with_commitment(
            config.cluster().url().to_string(),
            CommitmentConfig {
                commitment: config.commitment().unwrap_or_default(),
            },
        );
        Self { rpc_client }
    }

    pub fn localhost() -> Self {
        Self::new(RpcProviderConfig::localhost())
    }

    fn account_info_config(&self) -> RpcAccountInfoConfig {
        RpcAccountInfoConfig {
            commitment: Some(self.rpc_client.commitment()),
            min_context_slot: None,
            encoding: Some(UiAccountEncoding::Base64Zstd),
            data_slice: None,
        }
    }
}

#[async_trait]
impl AccountProvider for RpcAccountProvider {
    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> CoreResult<(Slot, Option<Account>)> {
        let response = self
            .rpc_client
            .get_account_with_config(pubkey, self.account_info_config())
            .await?;
        Ok((response.context.slot, response.value))
    }

    async fn get_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
    ) -> CoreResult<(Slot, Vec<Option<Account>>)> {
        if pubkeys.len() > MAX_MULTIPLE_ACCOUNTS {
            return Err(CoreError::TooManyAccountsRequested {
                requested: pubkeys.len(),
                max: MAX_MULTIPLE_ACCOUNTS,
            });
        }
        let response = self
            .rpc_client
            .get_multiple_accounts_with_config(
                pubkeys,
                self.account_info_config(),
            )
            .await?;
        Ok((response.context.slot, response.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refuses_more_accounts_than_rpc_accepts() {
        // Refused before anything is sent so no validator needs to run
        let provider = RpcAccountProvider::localhost();
        let pubkeys = (0..=MAX_MULTIPLE_ACCOUNTS)
            .map(|_| Pubkey::new_unique())
            .collect::<Vec<_>>();

        let res = provider.get_multiple_accounts(&pubkeys).await;
        assert!(matches!(
            res,
            Err(CoreError::TooManyAccountsRequested {
                requested: 101,
                max: MAX_MULTIPLE_ACCOUNTS,
            })
        ));
    }
}
