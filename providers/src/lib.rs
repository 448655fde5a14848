pub mod errors;
pub mod rpc_account_provider;
pub mod rpc_logs_subscriber;
pub mod rpc_provider_config;
pub mod rpc_transaction_provider;

pub use warden_addresses::cluster::RpcCluster;
