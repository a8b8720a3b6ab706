use clap::Parser;
use client::coins::CoinAuthority;
use client::game::ClientConfig;
use client::network::Client;
use client::rendering::ConsoleRenderer;
use log::info;
use shared::MapData;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name; a random one is generated when omitted
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Who credits collected coins
    #[arg(long, value_enum, default_value_t = CoinAuthority::Client)]
    coin_authority: CoinAuthority,

    /// Keepalive interval in milliseconds
    #[arg(long, default_value = "1000")]
    heartbeat_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    if args.coin_authority == CoinAuthority::External {
        info!("Coin pickups will not be credited locally");
    }

    let map = MapData::sample();
    let config = ClientConfig {
        name: args.name,
        coin_authority: args.coin_authority,
        ..ClientConfig::default()
    };

    let mut client = Client::new(
        &args.server,
        map.clone(),
        config,
        Duration::from_millis(args.heartbeat_ms.max(1)),
        ConsoleRenderer::new(map),
    )
    .await?;

    let session = client.run().await?;
    if let Some(player) = session.local_player() {
        info!("Left with {} coins", player.coins);
    }

    Ok(())
}
