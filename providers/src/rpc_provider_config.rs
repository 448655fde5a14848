use solana_sdk::commitment_config::CommitmentLevel;
use warden_addresses::cluster::RpcCluster;

#[derive(Clone, Debug)]
pub struct RpcProviderConfig {
    cluster: RpcCluster,
    commitment: Option<CommitmentLevel>,
}

impl Default for RpcProviderConfig {
    fn default() -> Self {
        Self::localhost()
    }
}

impl RpcProviderConfig {
    pub fn new(
        cluster: RpcCluster,
        commitment: Option<CommitmentLevel>,
    ) -> Self {
        Self {
            cluster,
            commitment,
        }
    }

    /// The local validator at `confirmed` commitment which is what account
    /// states are tracked at
    pub fn localhost() -> Self {
        Self::new(RpcCluster::Localhost, Some(CommitmentLevel::Confirmed))
    }

    pub fn cluster(&self) -> &RpcCluster {
        &self.cluster
    }

    pub fn url(&self) -> &str {
        self.cluster.url()
    }

    pub fn ws_url(&self) -> &str {
        self.cluster.ws_url()
    }

    pub fn commitment(&self) -> Option<CommitmentLevel> {
        self.commitment
    }
}
