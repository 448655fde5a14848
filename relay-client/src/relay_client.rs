use std::{path::PathBuf, time::Duration};

use log::*;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use solana_sdk::{clock::Slot, pubkey::Pubkey, signature::Keypair};
use warden_accounts::RelayAccountState;
use warden_core::AddressLabels;
use warden_persist::PersistedAccountInfo;
use warden_relay::{
    AccountSaveResult, AccountStatesResult, LoadKeypairResult, RelayMethod, RelayReply,
    RelayRequest, RelayRoutes, RelayVersion,
};

use crate::errors::{RelayClientError, RelayClientResult};

pub const RELAY_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);

/// Talks to the REST transport of a running relay
pub struct RelayClient {
    client: reqwest::Client,
    routes: RelayRoutes,
}

impl Default for RelayClient {
    fn default() -> Self {
        Self::with_routes(RelayRoutes::default())
    }
}

impl RelayClient {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self::with_routes(RelayRoutes::new(root_url))
    }

    fn with_routes(routes: RelayRoutes) -> Self {
        Self {
            client: reqwest::Client::new(),
            routes,
        }
    }

    // -----------------
    // Requests
    // -----------------
    async fn request<R: DeserializeOwned>(
        &self,
        request: RelayRequest,
        args: Vec<Value>,
    ) -> RelayClientResult<R> {
        let route = self.routes.route(request);
        trace!("{} {}", route.method, route.url);
        let builder = match route.method {
            RelayMethod::Get if args.is_empty() => self.client.get(&route.url),
            RelayMethod::Get => self.client.get(&route.url).json(&args),
            RelayMethod::Post => self.client.post(&route.url).json(&args),
        };
        let res = builder
            .timeout(RELAY_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| map_request_error(err, &route.url))?;

        let status = res.status();
        let body = res
            .json::<Value>()
            .await
            .map_err(|err| map_request_error(err, &route.url))?;
        if !status.is_success() {
            debug!("{} responded with {}: {}", route.url, status, body);
        }
        reply_result(body)
    }

    pub async fn relay_version(&self) -> RelayClientResult<RelayVersion> {
        self.request(RelayRequest::RelayVersion, vec![]).await
    }

    pub async fn validator_pid(&self) -> RelayClientResult<u32> {
        self.request(RelayRequest::ValidatorPid, vec![]).await
    }

    pub async fn known_address_labels(
        &self,
    ) -> RelayClientResult<AddressLabels> {
        self.request(RelayRequest::GetKnownAddressLabels, vec![])
            .await
    }

    pub async fn update_address_labels(
        &self,
        labels: &AddressLabels,
    ) -> RelayClientResult<()> {
        self.request(RelayRequest::UpdateAddressLabels, vec![json!(labels)])
            .await
    }

    pub async fn account_states(
        &self,
        address: &Pubkey,
    ) -> RelayClientResult<Vec<RelayAccountState>> {
        let (_, states): AccountStatesResult = self
            .request(
                RelayRequest::AccountStates,
                vec![json!(address.to_string())],
            )
            .await?;
        Ok(states)
    }

    /// Saves the account into the accounts folder of the relay, at the
    /// given `slot` if provided, and returns the path it was written to
    pub async fn account_save(
        &self,
        address: &Pubkey,
        slot: Option<Slot>,
    ) -> RelayClientResult<PathBuf> {
        let (_, res): (String, AccountSaveResult) = self
            .request(
                RelayRequest::AccountSave,
                vec![json!(address.to_string()), json!(slot)],
            )
            .await?;
        match res {
            AccountSaveResult::Saved { account_path } => Ok(account_path),
            AccountSaveResult::Err { err } => Err(RelayClientError::Relay(err)),
        }
    }

    pub async fn snapshot_save(&self, label: &str) -> RelayClientResult<PathBuf> {
        self.request(RelayRequest::SnapshotSave, vec![json!(label)])
            .await
    }

    pub async fn load_snapshot(&self, label: &str) -> RelayClientResult<()> {
        self.request(RelayRequest::LoadSnapshot, vec![json!(label)])
            .await
    }

    pub async fn store_keypair(
        &self,
        id: &str,
        keypair: &Keypair,
    ) -> RelayClientResult<()> {
        self.request(
            RelayRequest::StoreKeypair,
            vec![json!(id), json!(keypair.to_bytes().to_vec())],
        )
        .await
    }

    pub async fn load_keypair(
        &self,
        id: &str,
    ) -> RelayClientResult<Option<Keypair>> {
        let (_, secret_key): LoadKeypairResult = self
            .request(RelayRequest::LoadKeypair, vec![json!(id)])
            .await?;
        secret_key
            .map(|bytes| {
                Keypair::from_bytes(&bytes)
                    .map_err(|err| RelayClientError::Relay(err.to_string()))
            })
            .transpose()
    }

    pub async fn set_account(
        &self,
        account: &PersistedAccountInfo,
    ) -> RelayClientResult<()> {
        self.request(RelayRequest::SetAccount, vec![json!(account)])
            .await
    }

    pub async fn restart_validator(&self) -> RelayClientResult<()> {
        self.request(RelayRequest::RestartValidator, vec![]).await
    }

    pub async fn kill_warden(&self) -> RelayClientResult<()> {
        self.request(RelayRequest::Kill, vec![]).await
    }
}

fn map_request_error(err: reqwest::Error, url: &str) -> RelayClientError {
    if err.is_timeout() {
        RelayClientError::Timeout(url.to_string())
    } else {
        RelayClientError::Request(err)
    }
}

/// Unwraps the `{ result }` of a reply, `{ err }` replies become
/// [RelayClientError::Relay]
fn reply_result<R: DeserializeOwned>(body: Value) -> RelayClientResult<R> {
    serde_json::from_value::<RelayReply<R>>(body)?
        .into_result()
        .map_err(RelayClientError::Relay)
}
