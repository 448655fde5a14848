use std::time::Duration;

use log::*;
use reqwest::StatusCode;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    native_token::LAMPORTS_PER_SOL,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use solana_transaction_status::UiTransactionEncoding;
use tokio::time::{sleep, Instant};

use crate::errors::{ValidatorError, ValidatorResult};

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const FEE_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Resolves once the validator answers a plain GET with
/// `405 Method Not Allowed` which is how its JSON RPC endpoint responds
/// when it is up.
/// If `verify_fees` is set it additionally waits until the validator
/// charges fees for transactions which it does not do at times right after
/// it started.
/// Fails if all of that takes longer than `timeout`.
pub async fn ensure_validator_up(
    json_rpc_url: &str,
    verify_fees: bool,
    timeout: Duration,
) -> ValidatorResult<()> {
    let deadline = Instant::now() + timeout;
    debug!("Waiting for validator to come up ...");
    wait_for_status(json_rpc_url, StatusCode::METHOD_NOT_ALLOWED, deadline)
        .await?;
    if verify_fees {
        debug!("Ensuring validator charges fees ...");
        let rpc_client = RpcClient::new_with_commitment(
            json_rpc_url.to_string(),
            CommitmentConfig::confirmed(),
        );
        let payer = Keypair::new();
        airdrop(&rpc_client, &payer, 200 * LAMPORTS_PER_SOL, deadline).await?;
        ensure_fees(&rpc_client, &payer, deadline).await?;
    }
    debug!("Validator is up");
    Ok(())
}

async fn wait_for_status(
    url: &str,
    expected: StatusCode,
    deadline: Instant,
) -> ValidatorResult<()> {
    let client = reqwest::Client::new();
    loop {
        match client.get(url).timeout(POLL_INTERVAL).send().await {
            Ok(res) if res.status() == expected => return Ok(()),
            Ok(res) => trace!("Validator responded with {}", res.status()),
            Err(err) => trace!("Validator not reachable yet: {}", err),
        }
        if Instant::now() >= deadline {
            return Err(ValidatorError::ValidatorNotUp(url.to_string()));
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn airdrop(
    rpc_client: &RpcClient,
    payer: &Keypair,
    lamports: u64,
    deadline: Instant,
) -> ValidatorResult<()> {
    let signature = rpc_client
        .request_airdrop(&payer.pubkey(), lamports)
        .await?;
    confirm(rpc_client, &signature, deadline).await
}

async fn confirm(
    rpc_client: &RpcClient,
    signature: &Signature,
    deadline: Instant,
) -> ValidatorResult<()> {
    while !rpc_client.confirm_transaction(signature).await? {
        if Instant::now() >= deadline {
            return Err(ValidatorError::TransactionNotFound(
                signature.to_string(),
            ));
        }
        sleep(Duration::from_millis(200)).await;
    }
    Ok(())
}

async fn ensure_fees(
    rpc_client: &RpcClient,
    payer: &Keypair,
    deadline: Instant,
) -> ValidatorResult<()> {
    loop {
        let receiver = Keypair::new();
        let ix = system_instruction::transfer(
            &payer.pubkey(),
            &receiver.pubkey(),
            1000,
        );
        let blockhash = rpc_client.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&payer.pubkey()),
            &[payer],
            blockhash,
        );
        let signature = rpc_client.send_and_confirm_transaction(&tx).await?;
        let confirmed = rpc_client
            .get_transaction_with_config(
                &signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Json),
                    commitment: Some(CommitmentConfig::confirmed()),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await?;
        if charged_fees(confirmed.transaction.meta.map(|meta| meta.fee)) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ValidatorError::NoFeesCharged);
        }
        debug!("Transaction completed without charging fees, trying again ...");
        sleep(FEE_RETRY_INTERVAL).await;
    }
}

/// Transactions without meta cannot tell, they count as charged
fn charged_fees(fee: Option<u64>) -> bool {
    fee.map_or(true, |fee| fee > 0)
}
