// In-memory GameApi for unit tests
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::prelude::*;
use tokio::sync::Notify;

use crate::api::GameApi;
use crate::error::{ApiError, ApiResult};
use crate::route::Route;

#[derive(Default)]
struct FakeState {
    games: BTreeMap<GameId, Game>,
    histories: HashMap<PlayerId, MoveHistory>,
    next_game: u64,
    next_player: u64,
    failures: HashMap<&'static str, String>,
    calls: Vec<&'static str>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
    create_gate: Option<Arc<Notify>>,
}

pub fn rejected(message: &str) -> ApiError {
    ApiError::Server {
        status: StatusCode::BAD_REQUEST,
        message: message.to_string(),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// `create_game` parks until the returned notifier fires.
    pub fn with_create_gate() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let api = Self {
            create_gate: Some(gate.clone()),
            ..Self::default()
        };
        (api, gate)
    }

    pub fn insert_game(&self, game: Game) {
        let mut state = self.state.lock().unwrap();
        state.games.insert(game.game_id, game);
    }

    pub fn set_history(&self, player_id: PlayerId, history: MoveHistory) {
        self.state.lock().unwrap().histories.insert(player_id, history);
    }

    pub fn set_state(&self, game_id: GameId, new_state: GameState) {
        let mut state = self.state.lock().unwrap();
        if let Some(game) = state.games.get_mut(&game_id) {
            game.state = new_state;
        }
    }

    pub fn edit_game(&self, game_id: GameId, edit: impl FnOnce(&mut Game)) {
        let mut state = self.state.lock().unwrap();
        if let Some(game) = state.games.get_mut(&game_id) {
            edit(game);
        }
    }

    /// Every later call to `endpoint` fails with `message`.
    pub fn fail(&self, endpoint: &'static str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(endpoint, message.to_string());
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.state.lock().unwrap().failures.remove(endpoint);
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    fn enter(&self, endpoint: &'static str) -> ApiResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(endpoint);
        match state.failures.get(endpoint) {
            Some(message) => Err(rejected(message)),
            None => Ok(state),
        }
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Server {
        status: StatusCode::NOT_FOUND,
        message: format!("{what} not found"),
    }
}

#[async_trait]
impl GameApi for FakeApi {
    async fn list_games(&self) -> ApiResult<Vec<Game>> {
        let state = self.enter("list_games")?;
        Ok(state.games.values().cloned().collect())
    }

    async fn create_game(&self, request: &CreateGameRequest) -> ApiResult<GameId> {
        drop(self.enter("create_game")?);
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        let mut state = self.state.lock().unwrap();
        state.next_game += 1;
        let game_id = GameId(state.next_game);
        state.games.insert(
            game_id,
            Game {
                game_id,
                game_name: Some(request.name.clone()),
                map_id: Some(request.map_id),
                game_length: Some(request.game_length),
                ..Game::default()
            },
        );
        Ok(game_id)
    }

    async fn game(&self, game_id: GameId) -> ApiResult<Game> {
        let state = self.enter("game")?;
        state
            .games
            .get(&game_id)
            .cloned()
            .ok_or_else(|| not_found("Game"))
    }

    async fn join_game(&self, game_id: GameId, player_name: &str) -> ApiResult<PlayerId> {
        let mut state = self.enter("join_game")?;
        state.next_player += 1;
        let player_id = PlayerId(100 + state.next_player);
        let game = state.games.get_mut(&game_id).ok_or_else(|| not_found("Game"))?;
        game.players.push(Player {
            player_id,
            player_name: player_name.to_string(),
            game_id: Some(game_id),
            ..Player::default()
        });
        Ok(player_id)
    }

    async fn start_game(&self, game_id: GameId, _player_id: PlayerId) -> ApiResult<()> {
        let mut state = self.enter("start_game")?;
        let game = state.games.get_mut(&game_id).ok_or_else(|| not_found("Game"))?;
        game.state = GameState::Fugitive;
        Ok(())
    }

    async fn player(&self, player_id: PlayerId) -> ApiResult<Player> {
        let state = self.enter("player")?;
        state
            .games
            .values()
            .find_map(|g| g.player(player_id).cloned())
            .ok_or_else(|| not_found("Player"))
    }

    async fn moves(&self, player_id: PlayerId) -> ApiResult<MoveHistory> {
        let state = self.enter("moves")?;
        Ok(state.histories.get(&player_id).cloned().unwrap_or_default())
    }

    async fn submit_move(&self, player_id: PlayerId, request: &MoveRequest) -> ApiResult<()> {
        let mut state = self.enter("submit_move")?;
        let game = state
            .games
            .get_mut(&request.game_id)
            .ok_or_else(|| not_found("Game"))?;
        let player = game
            .players
            .iter_mut()
            .find(|p| p.player_id == player_id)
            .ok_or_else(|| not_found("Player"))?;
        player.location = Some(request.destination);
        Ok(())
    }

    async fn leave_game(&self, player_id: PlayerId) -> ApiResult<()> {
        let mut state = self.enter("leave_game")?;
        for game in state.games.values_mut() {
            game.players.retain(|p| p.player_id != player_id);
        }
        Ok(())
    }
}

/// Navigator that records every route it is sent to.
pub fn recording_navigator() -> (impl FnMut(Route) + Send + 'static, Arc<Mutex<Vec<Route>>>) {
    let routes = Arc::new(Mutex::new(Vec::new()));
    let sink = routes.clone();
    (move |route| sink.lock().unwrap().push(route), routes)
}

pub fn player(id: u64, name: &str, role: Option<Role>, location: Option<Location>) -> Player {
    Player {
        player_id: PlayerId(id),
        player_name: name.to_string(),
        role,
        location,
        game_id: None,
    }
}
