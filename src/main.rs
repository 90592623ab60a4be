//! echo-frame-server: a framed TCP echo server
//!
//! Serves one client connection at a time, decoding messages with one of
//! three framing schemes and echoing each message back:
//! - Length-prefixed: `<digits><payload>` inside one receive
//! - Delimiter, chunked: receives ending in `#` are echoed whole
//! - Delimiter, bytewise: bytes accumulate until `#`
//!
//! A client sending `quit` stops the server. Configuration via CLI
//! arguments or TOML file.

mod config;
mod protocols;
mod server;
mod session;
mod transport;

use config::Config;
use server::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        framing = ?config.framing,
        message_size = config.message_size,
        delimiter = %(config.delimiter as char),
        "Starting echo-frame-server"
    );

    // Sessions are served strictly one after another
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::bind(&config)?;

    if let Err(e) = server.run().await {
        error!(error = %e, "Server terminated");
        return Err(e.into());
    }

    Ok(())
}
