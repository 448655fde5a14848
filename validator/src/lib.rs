mod args;
pub mod config;
mod controller;
mod ensure_validator_up;
pub mod errors;
mod process;
mod solana_config;
mod solana_validator;

pub use args::*;
pub use controller::*;
pub use ensure_validator_up::*;
pub use process::*;
pub use solana_config::*;
pub use solana_validator::*;
