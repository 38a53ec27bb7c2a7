use std::net::SocketAddr;

use clap::Parser;
use game_server::{routes, GameStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "game-server")]
#[command(about = "In-memory game server for local Fugitive games")]
struct Args {
    #[arg(short, long, default_value = "3001")]
    port: u16,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let addr: SocketAddr = match format!("{}:{}", args.host, args.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid listen address {}:{}: {}", args.host, args.port, e);
            std::process::exit(2);
        }
    };

    info!("🚀 Game server running on http://{}", addr);
    warp::serve(routes(GameStore::new())).run(addr).await;
}
