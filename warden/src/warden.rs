use std::{sync::Arc, time::Duration};

use log::*;
use warden_accounts::account_changed_channel;
use warden_addresses::consts::{KILL_EXIT_CODE, RELAY_HOST};
use warden_decoders::AccountDecoderRegistry;
use warden_providers::{
    rpc_account_provider::RpcAccountProvider,
    rpc_logs_subscriber::RpcLogsSubscriber,
    rpc_provider_config::RpcProviderConfig,
    rpc_transaction_provider::RpcTransactionProvider, RpcCluster,
};
use warden_relay::{RelayHandler, RelayHandlerConfig, RelayProviders};
use warden_relay_pubsub::start_pubsub_server;
use warden_relay_rest::start_rest_server;
use warden_validator::{
    config::ValidatorConfig, kill_processes_on_port, SolanaValidator,
    ValidatorController,
};

use crate::{config::WardenConfig, errors::WardenResult};

const KILL_EXIT_DELAY: Duration = Duration::from_millis(500);

fn rpc_provider_config(config: &ValidatorConfig) -> RpcProviderConfig {
    RpcProviderConfig::new(
        RpcCluster::Custom(
            config.json_rpc_url.clone(),
            config.websocket_url.clone(),
        ),
        Some(config.commitment),
    )
}

/// Starts the validator and the relay and runs until a relay client
/// requests the warden to exit or the process is interrupted.
/// Resolves to the exit code of the process.
pub async fn run(config: WardenConfig) -> WardenResult<i32> {
    let provider_config = rpc_provider_config(&config.validator);
    let account_provider =
        Arc::new(RpcAccountProvider::new(provider_config.clone()));
    let validator = Arc::new(SolanaValidator::new(
        config.validator.clone(),
        config.snapshot.clone(),
        config.accounts_folder(),
        account_provider.clone(),
    ));

    let restored = validator.start().await?;
    info!(
        "Validator is up at {} with pid {:?}",
        config.validator.json_rpc_url,
        validator.pid().await
    );

    if !config.relay.enabled {
        info!("Relay is disabled");
        return shutdown_on_interrupt(validator.as_ref()).await;
    }

    if config.relay.kill_running_relay {
        for port in [config.relay.port, config.relay.pubsub_port] {
            if let Err(err) = kill_processes_on_port(port).await {
                warn!("Failed to free relay port {}: {}", port, err);
            }
        }
    }

    let handler = Arc::new(
        RelayHandler::with_providers(
            RelayHandlerConfig {
                accounts_folder: config.accounts_folder(),
                snapshot_folder: config.snapshot.snapshot_folder.clone(),
            },
            RelayProviders {
                account_provider,
                transaction_provider: Arc::new(RpcTransactionProvider::new(
                    provider_config.clone(),
                )),
                logs_provider: Some(Arc::new(RpcLogsSubscriber::new(
                    provider_config,
                ))),
            },
            Arc::new(AccountDecoderRegistry::default()),
            validator.clone(),
            account_changed_channel(),
            restored,
        )
        .await,
    );

    let rest_url = format!("{}:{}", RELAY_HOST, config.relay.port);
    let (rest_addr, rest_handle) =
        start_rest_server(handler.clone(), Some(&rest_url)).await?;
    let pubsub_url = format!("{}:{}", RELAY_HOST, config.relay.pubsub_port);
    let (pubsub_addr, pubsub_handle) =
        start_pubsub_server(handler.clone(), Some(&pubsub_url)).await?;
    info!("Relay REST server running on: {}", rest_addr);
    info!("Relay pubsub server running on: {}", pubsub_addr);

    let mut kill_signal = handler.kill_signal();
    let exit_code = tokio::select! {
        res = async { kill_signal.wait_for(|killed| *killed).await.map(|_| ()) } => {
            if res.is_err() {
                warn!("Kill signal dropped, exiting");
            }
            info!("Kill requested by relay client, exiting");
            // Lets the reply reach the client before the process exits
            tokio::time::sleep(KILL_EXIT_DELAY).await;
            KILL_EXIT_CODE
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                error!("Failed to listen for interrupt: {}", err);
            }
            kill_validator(validator.as_ref()).await;
            0
        }
    };

    rest_handle.abort();
    pubsub_handle.abort();
    Ok(exit_code)
}

async fn shutdown_on_interrupt<V: ValidatorController>(
    validator: &V,
) -> WardenResult<i32> {
    tokio::signal::ctrl_c().await?;
    kill_validator(validator).await;
    Ok(0)
}

async fn kill_validator<V: ValidatorController>(validator: &V) {
    info!("Shutting down validator");
    if let Err(err) = validator.kill().await {
        error!("Failed to kill validator: {}", err);
    }
}
