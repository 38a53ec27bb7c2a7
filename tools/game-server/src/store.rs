//! In-memory game records for the stand-in server.
//!
//! Only lobby bookkeeping lives here: roster, host, roles and the recorded
//! moves. Whose turn it is and who has won are not decided by this store;
//! callers drive those through [`GameStore::set_state`] and
//! [`GameStore::finish`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::prelude::*;
use tracing::info;
use warp::http::StatusCode;

pub const MAX_PLAYERS: usize = 6;
pub const MIN_PLAYERS: usize = 2;

static FUGITIVE_STARTS: [Location; 13] = [
    35, 45, 51, 71, 78, 104, 106, 127, 132, 146, 166, 170, 172,
];
static DETECTIVE_STARTS: [Location; 16] = [
    13, 26, 29, 34, 50, 53, 91, 94, 103, 112, 117, 123, 138, 141, 155, 174,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub status: StatusCode,
    pub message: String,
}

impl StoreError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
struct GameRecord {
    game: Game,
    histories: HashMap<PlayerId, MoveHistory>,
}

impl GameRecord {
    // host plays the fugitive, everyone else a detective
    fn deal_roles(&mut self, rng: &mut StdRng) {
        let fugitive_start = *FUGITIVE_STARTS.choose(rng).unwrap_or(&FUGITIVE_STARTS[0]);
        let mut detective_starts = DETECTIVE_STARTS
            .choose_multiple(rng, MAX_PLAYERS - 1)
            .copied();
        let host = self.game.host();

        for player in self.game.players.iter_mut() {
            let (role, start) = if Some(player.player_id) == host {
                (Role::Fugitive, fugitive_start)
            } else {
                (Role::Detective, detective_starts.next().unwrap_or(DETECTIVE_STARTS[0]))
            };
            player.role = Some(role);
            player.location = Some(start);
            self.histories.insert(
                player.player_id,
                MoveHistory {
                    start_location: Some(start),
                    moves: Vec::new(),
                },
            );
        }
    }
}

#[derive(Debug)]
struct Store {
    games: BTreeMap<GameId, GameRecord>,
    player_games: HashMap<PlayerId, GameId>,
    next_game_id: u64,
    next_player_id: u64,
    rng: StdRng,
}

impl Store {
    fn record_mut(&mut self, game_id: GameId) -> StoreResult<&mut GameRecord> {
        self.games
            .get_mut(&game_id)
            .ok_or_else(|| StoreError::not_found("Game not found"))
    }
}

/// Shared handle to every game the server knows about.
#[derive(Debug, Clone)]
pub struct GameStore {
    inner: Arc<RwLock<Store>>,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with reproducible start locations.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Store {
                games: BTreeMap::new(),
                player_games: HashMap::new(),
                next_game_id: 0,
                next_player_id: 0,
                rng,
            })),
        }
    }

    pub fn list(&self) -> Vec<Game> {
        self.inner
            .read()
            .games
            .values()
            .map(|r| r.game.clone())
            .collect()
    }

    pub fn create(&self, request: CreateGameRequest) -> StoreResult<GameId> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::bad_request("Game name is required"));
        }

        let mut store = self.inner.write();
        store.next_game_id += 1;
        let game_id = GameId(store.next_game_id);
        let game = Game {
            game_id,
            game_name: Some(name.to_string()),
            map_id: Some(request.map_id),
            map_name: Some(format!("Map {}", request.map_id)),
            game_length: Some(request.game_length),
            ..Game::default()
        };
        store.games.insert(
            game_id,
            GameRecord {
                game,
                histories: HashMap::new(),
            },
        );
        info!("🏠 Created game {} '{}'", game_id, name);
        Ok(game_id)
    }

    pub fn game(&self, game_id: GameId) -> StoreResult<Game> {
        self.inner
            .read()
            .games
            .get(&game_id)
            .map(|r| r.game.clone())
            .ok_or_else(|| StoreError::not_found("Game not found"))
    }

    pub fn join(&self, game_id: GameId, player_name: &str) -> StoreResult<PlayerId> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(StoreError::bad_request("Player name is required"));
        }

        let mut store = self.inner.write();
        let store = &mut *store;
        let record = store
            .games
            .get_mut(&game_id)
            .ok_or_else(|| StoreError::not_found("Game not found"))?;
        if record.game.state != GameState::Waiting {
            return Err(StoreError::conflict("Game has already started"));
        }
        if record.game.players.len() >= MAX_PLAYERS {
            return Err(StoreError::conflict("Game is full"));
        }

        store.next_player_id += 1;
        let player_id = PlayerId(store.next_player_id);
        record.game.players.push(Player {
            player_id,
            player_name: player_name.to_string(),
            game_id: Some(game_id),
            ..Player::default()
        });
        if record.game.host_id.is_none() {
            record.game.host_id = Some(player_id);
        }
        store.player_games.insert(player_id, game_id);
        info!("🎮 Player '{}' ({}) joined game {}", player_name, player_id, game_id);
        Ok(player_id)
    }

    /// Host only. Deals roles and hands the first turn to the fugitive.
    pub fn start(&self, game_id: GameId, player_id: PlayerId) -> StoreResult<()> {
        let mut store = self.inner.write();
        let store = &mut *store;
        let record = store
            .games
            .get_mut(&game_id)
            .ok_or_else(|| StoreError::not_found("Game not found"))?;

        if record.game.host() != Some(player_id) {
            return Err(StoreError {
                status: StatusCode::FORBIDDEN,
                message: "Only the host can start the game".into(),
            });
        }
        if record.game.state != GameState::Waiting {
            return Err(StoreError::conflict("Game has already started"));
        }
        if record.game.players.len() < MIN_PLAYERS {
            return Err(StoreError::conflict("Not enough players to start"));
        }

        record.deal_roles(&mut store.rng);
        record.game.state = GameState::Fugitive;
        info!("🚀 Game {} started with {} players", game_id, record.game.players.len());
        Ok(())
    }

    pub fn player(&self, player_id: PlayerId) -> StoreResult<Player> {
        let store = self.inner.read();
        store
            .player_games
            .get(&player_id)
            .and_then(|game_id| store.games.get(game_id))
            .and_then(|r| r.game.player(player_id).cloned())
            .ok_or_else(|| StoreError::not_found("Player not found"))
    }

    pub fn moves(&self, player_id: PlayerId) -> StoreResult<MoveHistory> {
        let store = self.inner.read();
        let game_id = store
            .player_games
            .get(&player_id)
            .ok_or_else(|| StoreError::not_found("Player not found"))?;
        Ok(store
            .games
            .get(game_id)
            .and_then(|r| r.histories.get(&player_id).cloned())
            .unwrap_or_default())
    }

    /// Records a move for a player in a running game. The move is not judged:
    /// no turn, map or capture checks.
    pub fn submit_move(&self, player_id: PlayerId, request: MoveRequest) -> StoreResult<()> {
        let mut store = self.inner.write();
        let game_id = *store
            .player_games
            .get(&player_id)
            .ok_or_else(|| StoreError::not_found("Player not found"))?;
        if game_id != request.game_id {
            return Err(StoreError::bad_request("Player is not in this game"));
        }
        let record = store.record_mut(game_id)?;
        if !record.game.state.is_playing() {
            return Err(StoreError::conflict("Game is not in play"));
        }

        if let Some(player) = record.game.players.iter_mut().find(|p| p.player_id == player_id) {
            player.location = Some(request.destination);
        }
        let history = record.histories.entry(player_id).or_default();
        let round = history.moves.len() as u32 + 1;
        history.moves.push(MoveRecord {
            round: Some(round),
            ticket: Some(request.ticket.clone()),
            destination: Some(request.destination),
        });
        info!(
            "🚶 Player {} moved to {} by {}",
            player_id, request.destination, request.ticket
        );
        Ok(())
    }

    /// Removes a player. A waiting game left empty is dropped.
    pub fn leave(&self, player_id: PlayerId) -> StoreResult<()> {
        let mut store = self.inner.write();
        let game_id = store
            .player_games
            .remove(&player_id)
            .ok_or_else(|| StoreError::not_found("Player not found"))?;
        let Ok(record) = store.record_mut(game_id) else {
            return Ok(());
        };

        record.game.players.retain(|p| p.player_id != player_id);
        if record.game.host_id == Some(player_id) {
            record.game.host_id = record.game.players.first().map(|p| p.player_id);
        }
        info!("👋 Player {} left game {}", player_id, game_id);

        if record.game.state == GameState::Waiting && record.game.players.is_empty() {
            store.games.remove(&game_id);
            info!("🗑️ Removed empty game {}", game_id);
        }
        Ok(())
    }

    /// Forces a game's lifecycle state, e.g. to pass the turn. Forcing a
    /// waiting game into play deals roles as `start` would.
    pub fn set_state(&self, game_id: GameId, state: GameState) -> StoreResult<()> {
        let mut store = self.inner.write();
        let store = &mut *store;
        let record = store
            .games
            .get_mut(&game_id)
            .ok_or_else(|| StoreError::not_found("Game not found"))?;
        info!("🔧 Game {} forced to {}", game_id, state);
        if record.game.state == GameState::Waiting && state.is_playing() {
            record.deal_roles(&mut store.rng);
        }
        record.game.state = state;
        Ok(())
    }

    /// Ends a game with the given winner.
    pub fn finish(&self, game_id: GameId, winner: Option<Role>) -> StoreResult<()> {
        let mut store = self.inner.write();
        let record = store.record_mut(game_id)?;
        record.game.state = GameState::Over;
        record.game.winner = winner;
        info!("🏁 Game {} over, winner: {:?}", game_id, winner);
        Ok(())
    }
}
