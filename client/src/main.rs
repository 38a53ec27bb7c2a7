use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fugitive_client::config::ConnectionArgs;
use fugitive_client::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fugitive",
    about = "Terminal client for the Fugitive pursuit game server"
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List open games, newest first
    List,
    /// Create a game and join it as host
    Create {
        /// Name shown in the lobby list
        #[arg(long)]
        name: String,
        /// Your player name
        #[arg(long)]
        host: String,
        /// short or long
        #[arg(long, default_value = "short")]
        length: GameLength,
        #[arg(long, default_value_t = DEFAULT_MAP_ID)]
        map_id: u32,
    },
    /// Join an existing game
    Join { game_id: GameId, name: String },
    /// Wait in the lobby until the host starts the game
    Lobby { game_id: GameId, player_id: PlayerId },
    /// Start the game (host only), then follow it into play
    Start { game_id: GameId, player_id: PlayerId },
    /// Leave a game
    Leave { game_id: GameId, player_id: PlayerId },
    /// Show a player's details
    Player { player_id: PlayerId },
    /// Show a player's move history
    Moves { player_id: PlayerId },
    /// Submit a move
    Move {
        game_id: GameId,
        player_id: PlayerId,
        destination: Location,
        /// Ticket to spend (Taxi, Bus, Underground, ...)
        ticket: String,
    },
    /// Follow a running game until it ends
    Watch { game_id: GameId },
}

fn print_route(route: Route) {
    println!("➡️  {route}");
}

fn print_lobby(view: &LobbyView) {
    match &view.phase {
        LobbyPhase::Loading => println!("Loading lobby..."),
        LobbyPhase::Error(message) => println!("⚠️  {message}"),
        LobbyPhase::Ended => println!("🏁 This game has already ended."),
        LobbyPhase::Active | LobbyPhase::Transitioning => {
            if let Some(game) = &view.game {
                let names: Vec<&str> =
                    game.players.iter().map(|p| p.player_name.as_str()).collect();
                println!(
                    "🏠 {} [{}] players: {}{}",
                    game.display_name(),
                    game.state,
                    if names.is_empty() {
                        "none".to_string()
                    } else {
                        names.join(", ")
                    },
                    if view.is_host == Some(true) { " (you are host)" } else { "" },
                );
            }
        }
    }
}

async fn follow_lobby(lobby: Lobby) -> Result<()> {
    let mut updates = lobby.subscribe();
    let watch_updates = async {
        while updates.changed().await.is_ok() {
            print_lobby(&updates.borrow_and_update());
        }
    };

    tokio::select! {
        _ = watch_updates => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, leaving lobby view");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = ClientConfig::from(cli.connection);
    let api = Arc::new(ApiClient::new(&config).context("building HTTP client")?);
    info!("🎮 Using game server at {}", api.base_url());

    match cli.command {
        Commands::List => {
            let games = fetch_games(api.as_ref()).await?;
            for game in &games {
                println!(
                    "{:>6}  {:<24} map: {:<16} players: {}  [{}]",
                    game.game_id,
                    game.display_name(),
                    game.map_name.as_deref().unwrap_or("-"),
                    game.players.len(),
                    game.state,
                );
            }
            if games.is_empty() {
                println!("{}", FlowError::NoGamesAvailable);
            }
        }
        Commands::Create {
            name,
            host,
            length,
            map_id,
        } => {
            let flow = CreateGameFlow::new();
            let new_game = NewGame {
                game_name: name,
                host_name: host,
                length,
                map_id,
            };
            let mut navigator = print_route;
            if let CreateOutcome::Created { game_id, player_id } =
                flow.create_and_join(api.as_ref(), &mut navigator, &new_game).await?
            {
                println!("gameId={game_id} playerId={player_id}");
            }
        }
        Commands::Join { game_id, name } => {
            let mut navigator = print_route;
            let player_id = join_game(api.as_ref(), &mut navigator, game_id, &name).await?;
            println!("playerId={player_id}");
        }
        Commands::Lobby { game_id, player_id } => {
            let lobby =
                Lobby::open(api.clone(), game_id, player_id, config.poll_interval, print_route);
            follow_lobby(lobby).await?;
        }
        Commands::Start { game_id, player_id } => {
            let lobby =
                Lobby::open(api.clone(), game_id, player_id, config.poll_interval, print_route);
            // the host check needs a roster; failed fetches are retried meanwhile
            let view = tokio::select! {
                view = lobby.ready() => view.context("lobby closed before the game loaded")?,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted before the game loaded");
                    return Ok(());
                }
            };
            if view.phase != LobbyPhase::Active {
                print_lobby(&view);
                return Ok(());
            }
            lobby.start_game(api.as_ref()).await?;
            follow_lobby(lobby).await?;
        }
        Commands::Leave { game_id, player_id } => {
            let mut navigator = print_route;
            leave_game(api.as_ref(), &mut navigator, game_id, player_id).await?;
            println!("You have left the game.");
        }
        Commands::Player { player_id } => {
            let player = api.player(player_id).await?;
            println!("{}", serde_json::to_string_pretty(&player)?);
        }
        Commands::Moves { player_id } => {
            let history = api.moves(player_id).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Commands::Move {
            game_id,
            player_id,
            destination,
            ticket,
        } => {
            let mut screen = MoveSubmitter::load(api.clone(), game_id, player_id).await?;
            let outcome = screen.submit(destination, &ticket).await?;
            println!(
                "📍 Your current location: {}",
                screen
                    .current_location()
                    .map_or_else(|| "unknown".to_string(), |l| l.to_string())
            );
            for line in screen.move_log() {
                println!("   {line}");
            }
            if let Some(notice) = outcome.game_over {
                println!("🏁 GAME OVER! {}", notice.message);
            }
        }
        Commands::Watch { game_id } => {
            let watch = GameWatch::open(api.clone(), game_id, config.poll_interval, print_route);
            let printer = |game: &Game| println!("🎲 {} [{}]", game.display_name(), game.state);
            tokio::select! {
                notice = watch.follow(printer) => {
                    if let Some(notice) = notice {
                        println!("🏁 GAME OVER! {}", notice.message);
                    }
                }
                _ = tokio::signal::ctrl_c() => warn!("Interrupted"),
            }
        }
    }

    Ok(())
}
