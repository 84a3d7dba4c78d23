use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig};
use shared::{BROADCAST_INTERVAL_MS, DEFAULT_PORT, TICK_INTERVAL_MS};
use tokio::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, binds the listener and serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[clap(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Milliseconds between simulation ticks
        #[clap(long, default_value_t = TICK_INTERVAL_MS)]
        tick_ms: u64,
        /// Milliseconds between state broadcasts
        #[clap(long, default_value_t = BROADCAST_INTERVAL_MS)]
        broadcast_ms: u64,
        /// Maximum number of simultaneous connections
        #[clap(short, long, default_value = "8")]
        max_clients: usize,
    }

    env_logger::init();
    let args = Args::parse();

    let config = ServerConfig {
        tick_interval: Duration::from_millis(args.tick_ms.max(1)),
        broadcast_interval: Duration::from_millis(args.broadcast_ms.max(1)),
        max_clients: args.max_clients,
    };

    let address = format!("{}:{}", args.host, args.port);
    let server = match Server::bind(&address, config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", address, e);
            return Err(e);
        }
    };

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
