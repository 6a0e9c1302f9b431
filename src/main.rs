pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod view;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::AppError;

fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::load()?;
    init_tracing(&config);

    tracing::info!("Starting user admin screen...");

    api::server::start_server(&config).await
}
