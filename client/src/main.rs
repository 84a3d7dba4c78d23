use clap::Parser;
use client::game::play;
use client::network::Connection;
use client::rendering::ConsoleFrontend;
use log::{error, info};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5555")]
    server: String,

    /// Frames per second of the local loop
    #[arg(short = 'f', long, default_value = "60")]
    fps: u32,

    /// Aim at the nearest enemy and fire automatically
    #[arg(short = 'b', long)]
    bot: bool,

    /// Frames between bot shots
    #[arg(long, default_value = "30")]
    fire_every: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let connection = match Connection::connect(args.server.as_str()).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(args.fps.max(1)));
    let mut frontend = ConsoleFrontend::new(args.bot, args.fire_every);

    tokio::select! {
        game = play(connection, &mut frontend, frame_interval) => {
            info!("Final clock: {:.1}s", game.world.time_remaining());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, leaving the arena");
        }
    }

    Ok(())
}
