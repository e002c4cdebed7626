#![cfg(not(tarpaulin_include))]

use script_board::app;
use script_board::config::Config;
use std::env;

/// Main entry point for the script board web server
///
/// Loads `.env` if present, reads `SCRIPT_BOARD_*` settings, and lets the
/// positional arguments `[host] [port]` override them.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::load(|key| env::var(key).ok(), &args)?;

    log::info!(
        "Starting script board on {}:{} (session TTL {}s)",
        config.host,
        config.port,
        config.session_ttl.as_secs()
    );
    app::run(config).await
}
