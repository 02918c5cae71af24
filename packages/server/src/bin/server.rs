//! Presence-aware chat relay server.
//!
//! Relays broadcast and private messages between registered clients and announces
//! presence changes to everyone.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-server
//! cargo run --bin tsudoi-server -- --host 0.0.0.0 --port 3000 --idle-timeout-secs 60
//! ```

use std::time::Duration;

use clap::Parser;
use tsudoi_server::{
    config::{
        DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_FRAME_BYTES, DEFAULT_MAX_SESSIONS,
        DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PORT, PresenceSettings, RelayConfig,
    },
    ui::Server,
};
use tsudoi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsudoi-server")]
#[command(about = "Presence-aware WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum number of concurrently registered users
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,

    /// Seconds of silence after which a user is marked INACTIVE
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
    idle_timeout_secs: u64,

    /// Seconds between presence checks
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval_secs: u64,

    /// Maximum size of a single WebSocket frame in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    max_frame_bytes: usize,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_sessions: args.max_sessions,
            presence: PresenceSettings {
                idle_threshold: Duration::from_secs(args.idle_timeout_secs),
                poll_interval: Duration::from_secs(args.poll_interval_secs),
            },
            max_frame_bytes: args.max_frame_bytes,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = RelayConfig::from(args);
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    tracing::info!(
        "Max sessions: {}, idle timeout: {:?}, poll interval: {:?}",
        config.max_sessions,
        config.presence.idle_threshold,
        config.presence.poll_interval
    );

    let server = Server::from_config(&config);
    if let Err(e) = server.run(config.bind_addr()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
