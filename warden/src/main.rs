use std::path::PathBuf;

use log::*;

mod config;
mod errors;
mod warden;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match config::load_config(config_path.as_deref()).await {
        Ok(config) => config,
        Err(err) => {
            error!("Failed to load config {:?}: {}", config_path, err);
            std::process::exit(1);
        }
    };

    match warden::run(config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            error!("Error: {:?}", err);
            std::process::exit(1);
        }
    }
}
