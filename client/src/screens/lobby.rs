//! Lobby screen: wait for the host to start, then move into the game.
//!
//! The lobby refetches the game on a fixed period. While the game is still
//! waiting the view is simply replaced. The first fetch that shows a turn
//! state stops the poll and navigates to the role's game screen, once. A game
//! that is already over sends the player home instead.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared::prelude::*;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::GameApi;
use crate::error::{ApiResult, FlowError, FlowResult};
use crate::poll::{self, Poll, PollHandle};
use crate::route::{Navigator, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyPhase {
    Loading,
    Active,
    Error(String),
    Transitioning,
    /// The game finished before it could be entered.
    Ended,
}

/// What a single fetch means for the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyEvent {
    Waiting,
    Started,
    Ended,
}

// 🏠 What the lobby screen renders
#[derive(Debug, Clone, PartialEq)]
pub struct LobbyView {
    pub phase: LobbyPhase,
    pub game: Option<Game>,
    /// Decided from the first fetch that lists players, then kept.
    pub is_host: Option<bool>,
}

impl Default for LobbyView {
    fn default() -> Self {
        Self {
            phase: LobbyPhase::Loading,
            game: None,
            is_host: None,
        }
    }
}

/// Lobby state machine, free of timers and I/O.
#[derive(Debug, Clone)]
pub struct LobbyState {
    game_id: GameId,
    player_id: PlayerId,
    view: LobbyView,
}

impl LobbyState {
    pub fn new(game_id: GameId, player_id: PlayerId) -> Self {
        Self {
            game_id,
            player_id,
            view: LobbyView::default(),
        }
    }

    pub fn view(&self) -> &LobbyView {
        &self.view
    }

    /// Applies one fetch result. `Started` and `Ended` are each reported at
    /// most once; after either, further results are ignored.
    pub fn observe(&mut self, fetched: ApiResult<Game>) -> LobbyEvent {
        if matches!(self.view.phase, LobbyPhase::Transitioning | LobbyPhase::Ended) {
            return LobbyEvent::Waiting;
        }

        let game = match fetched {
            Ok(game) => game,
            Err(e) => {
                warn!("Error fetching game details: {}", e);
                self.view.phase = LobbyPhase::Error(e.to_string());
                return LobbyEvent::Waiting;
            }
        };

        if self.view.is_host.is_none() {
            if let Some(host) = game.host() {
                self.view.is_host = Some(host == self.player_id);
                debug!("Host of game {} is player {}", self.game_id, host);
            }
        }

        let (phase, event) = if game.state.is_playing() {
            (LobbyPhase::Transitioning, LobbyEvent::Started)
        } else if game.state.is_over() {
            (LobbyPhase::Ended, LobbyEvent::Ended)
        } else {
            (LobbyPhase::Active, LobbyEvent::Waiting)
        };
        self.view.phase = phase;
        self.view.game = Some(game);
        event
    }
}

struct LobbyPoller<A: ?Sized, N> {
    api: Arc<A>,
    state: LobbyState,
    navigator: N,
    updates: watch::Sender<LobbyView>,
}

// Role from the fetched roster when listed, otherwise from the player endpoint
async fn resolve_role<A: GameApi + ?Sized>(api: &A, state: &LobbyState) -> Option<Role> {
    let listed = state
        .view
        .game
        .as_ref()
        .and_then(|g| g.player(state.player_id))
        .and_then(|p| p.role);
    if listed.is_some() {
        return listed;
    }

    match api.player(state.player_id).await {
        Ok(player) => player.role,
        Err(e) => {
            warn!("Could not resolve role for player {}: {}", state.player_id, e);
            None
        }
    }
}

#[async_trait]
impl<A, N> Poll for LobbyPoller<A, N>
where
    A: GameApi + ?Sized + 'static,
    N: Navigator + 'static,
{
    async fn tick(&mut self) -> ControlFlow<()> {
        let fetched = self.api.game(self.state.game_id).await;
        let event = self.state.observe(fetched);
        self.updates.send_replace(self.state.view.clone());
        match event {
            LobbyEvent::Waiting => return ControlFlow::Continue(()),
            LobbyEvent::Ended => {
                warn!("Game {} is already over, leaving lobby", self.state.game_id);
                self.navigator.navigate(Route::Home);
                return ControlFlow::Break(());
            }
            LobbyEvent::Started => {}
        }

        let role = resolve_role(self.api.as_ref(), &self.state).await;
        let route = Route::Game {
            game_id: self.state.game_id,
            player_id: self.state.player_id,
            role,
        };
        info!("🚀 Game {} started, moving to {}", self.state.game_id, route);
        self.navigator.navigate(route);
        ControlFlow::Break(())
    }
}

/// A mounted lobby screen. Dropping it stops the poll.
#[derive(Debug)]
pub struct Lobby {
    game_id: GameId,
    player_id: PlayerId,
    poll: PollHandle,
    view: watch::Receiver<LobbyView>,
}

impl Lobby {
    pub fn open<A, N>(
        api: Arc<A>,
        game_id: GameId,
        player_id: PlayerId,
        period: Duration,
        navigator: N,
    ) -> Self
    where
        A: GameApi + ?Sized + 'static,
        N: Navigator + 'static,
    {
        info!("🏠 Entering lobby for game {} as player {}", game_id, player_id);
        let (updates, view) = watch::channel(LobbyView::default());
        let poller = LobbyPoller {
            api,
            state: LobbyState::new(game_id, player_id),
            navigator,
            updates,
        };
        Self {
            game_id,
            player_id,
            poll: poll::spawn(period, poller),
            view,
        }
    }

    pub fn view(&self) -> LobbyView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LobbyView> {
        self.view.clone()
    }

    pub fn is_polling(&self) -> bool {
        !self.poll.is_finished()
    }

    /// Waits for the first successful fetch. Failed fetches are retried by
    /// the poll in the meantime. `None` if the poll stops without one.
    pub async fn ready(&self) -> Option<LobbyView> {
        let mut updates = self.view.clone();
        loop {
            {
                let view = updates.borrow_and_update();
                if !matches!(view.phase, LobbyPhase::Loading | LobbyPhase::Error(_)) {
                    return Some(view.clone());
                }
            }
            updates.changed().await.ok()?;
        }
    }

    /// Resolves once the lobby has handed over to the game screen.
    pub async fn closed(self) {
        self.poll.join().await;
    }

    /// Host-only: asks the server to start the game. The next poll picks up
    /// the new state and navigates.
    pub async fn start_game<A: GameApi + ?Sized>(&self, api: &A) -> FlowResult<()> {
        if self.view().is_host != Some(true) {
            return Err(FlowError::NotHost);
        }
        api.start_game(self.game_id, self.player_id).await?;
        info!("🚀 Game {} started by host", self.game_id);
        Ok(())
    }

    /// Removes the player from the game and returns to the join screen.
    pub async fn leave<A, N>(self, api: &A, navigator: &mut N) -> FlowResult<()>
    where
        A: GameApi + ?Sized,
        N: Navigator + ?Sized,
    {
        leave_game(api, navigator, self.game_id, self.player_id).await
    }
}

pub async fn leave_game<A, N>(
    api: &A,
    navigator: &mut N,
    game_id: GameId,
    player_id: PlayerId,
) -> FlowResult<()>
where
    A: GameApi + ?Sized,
    N: Navigator + ?Sized,
{
    info!("👋 Removing player {} from game {}", player_id, game_id);
    api.leave_game(player_id).await?;
    navigator.navigate(Route::JoinGame);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{player, recording_navigator, rejected, FakeApi};

    const PERIOD: Duration = Duration::from_secs(3);
    const GAME: GameId = GameId(1);
    const ALICE: PlayerId = PlayerId(10);
    const BOB: PlayerId = PlayerId(11);

    fn lobby_api() -> Arc<FakeApi> {
        let api = FakeApi::new();
        api.insert_game(Game {
            game_id: GAME,
            game_name: Some("Test".into()),
            players: vec![player(10, "Alice", None, None), player(11, "Bob", None, None)],
            ..Game::default()
        });
        Arc::new(api)
    }

    // lets the immediate first poll run, then `n` more periods
    async fn polls(n: u32) {
        tokio::time::sleep(PERIOD * n + Duration::from_millis(100)).await;
    }

    #[test]
    fn failure_then_success_recovers() {
        let mut state = LobbyState::new(GAME, ALICE);
        assert_eq!(state.observe(Err(rejected("boom"))), LobbyEvent::Waiting);
        assert_eq!(state.view().phase, LobbyPhase::Error("boom".into()));

        let waiting = Game {
            game_id: GAME,
            ..Game::default()
        };
        assert_eq!(state.observe(Ok(waiting)), LobbyEvent::Waiting);
        assert_eq!(state.view().phase, LobbyPhase::Active);
    }

    #[test]
    fn playing_edge_fires_once() {
        let mut state = LobbyState::new(GAME, ALICE);
        let playing = Game {
            game_id: GAME,
            state: GameState::Fugitive,
            ..Game::default()
        };
        assert_eq!(state.observe(Ok(playing.clone())), LobbyEvent::Started);
        assert_eq!(state.observe(Ok(playing)), LobbyEvent::Waiting);
        assert_eq!(state.view().phase, LobbyPhase::Transitioning);
    }

    #[test]
    fn finished_game_is_terminal() {
        let mut state = LobbyState::new(GAME, ALICE);
        let over = Game {
            game_id: GAME,
            state: GameState::Over,
            ..Game::default()
        };
        assert_eq!(state.observe(Ok(over.clone())), LobbyEvent::Ended);
        assert_eq!(state.observe(Ok(over)), LobbyEvent::Waiting);
        assert_eq!(state.view().phase, LobbyPhase::Ended);
    }

    #[test]
    fn host_is_decided_once() {
        let mut state = LobbyState::new(GAME, ALICE);
        let mut game = Game {
            game_id: GAME,
            players: vec![player(10, "Alice", None, None), player(11, "Bob", None, None)],
            ..Game::default()
        };
        state.observe(Ok(game.clone()));
        assert_eq!(state.view().is_host, Some(true));

        game.players.reverse();
        state.observe(Ok(game));
        assert_eq!(state.view().is_host, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_game_only_refreshes() {
        let api = lobby_api();
        let (nav, routes) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, BOB, PERIOD, nav);

        polls(3).await;

        assert_eq!(api.calls("game"), 4);
        assert!(routes.lock().unwrap().is_empty());
        let view = lobby.view();
        assert_eq!(view.phase, LobbyPhase::Active);
        assert_eq!(view.is_host, Some(false));
        assert!(lobby.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn start_navigates_exactly_once_and_stops_polling() {
        let api = lobby_api();
        let (nav, routes) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, BOB, PERIOD, nav);

        polls(1).await;
        api.edit_game(GAME, |g| {
            g.state = GameState::from("DETECTIVE".to_string());
            g.players[1].role = Some(Role::Detective);
        });
        polls(1).await;

        assert_eq!(
            *routes.lock().unwrap(),
            vec![Route::Game {
                game_id: GAME,
                player_id: BOB,
                role: Some(Role::Detective),
            }]
        );
        let calls = api.calls("game");
        assert_eq!(lobby.view().phase, LobbyPhase::Transitioning);
        assert!(!lobby.is_polling());

        polls(5).await;
        assert_eq!(api.calls("game"), calls);
        assert_eq!(routes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn role_falls_back_to_player_endpoint() {
        let api = lobby_api();
        api.set_state(GAME, GameState::Fugitive);
        let (nav, routes) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, ALICE, PERIOD, nav);

        lobby.closed().await;

        assert_eq!(api.calls("player"), 1);
        // no role anywhere: generic game screen
        assert_eq!(
            *routes.lock().unwrap(),
            vec![Route::Game {
                game_id: GAME,
                player_id: ALICE,
                role: None,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failing_fetch_keeps_polling() {
        let api = lobby_api();
        api.fail("game", "Error fetching game details.");
        let (nav, _) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, ALICE, PERIOD, nav);

        polls(0).await;
        assert_eq!(
            lobby.view().phase,
            LobbyPhase::Error("Error fetching game details.".into())
        );

        api.recover("game");
        polls(1).await;
        assert_eq!(lobby.view().phase, LobbyPhase::Active);
        assert_eq!(api.calls("game"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn lobby_on_finished_game_goes_home() {
        let api = lobby_api();
        api.set_state(GAME, GameState::Over);
        let (nav, routes) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, ALICE, PERIOD, nav);

        polls(3).await;

        assert_eq!(*routes.lock().unwrap(), vec![Route::Home]);
        assert_eq!(lobby.view().phase, LobbyPhase::Ended);
        assert!(!lobby.is_polling());
        assert_eq!(api.calls("game"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_waits_out_failed_fetches() {
        let api = lobby_api();
        api.fail("game", "Error fetching game details.");
        let (nav, _) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, ALICE, PERIOD, nav);

        let recover = async {
            polls(1).await;
            api.recover("game");
        };
        let (view, ()) = tokio::join!(lobby.ready(), recover);

        let view = view.unwrap();
        assert_eq!(view.phase, LobbyPhase::Active);
        assert_eq!(view.is_host, Some(true));
        assert_eq!(api.calls("game"), 3);
        lobby.start_game(api.as_ref()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_lobby_still_loads() {
        let api = lobby_api();
        let (nav, _) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, ALICE, Duration::ZERO, nav);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(lobby.view().phase, LobbyPhase::Active);
        assert!(lobby.is_polling());
        assert!(api.calls("game") > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_lobby_stops_polls() {
        let api = lobby_api();
        let (nav, _) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, ALICE, PERIOD, nav);

        polls(1).await;
        drop(lobby);
        let calls = api.calls("game");
        polls(4).await;
        assert_eq!(api.calls("game"), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn only_host_may_start() {
        let api = lobby_api();
        let (nav, _) = recording_navigator();
        let guest = Lobby::open(api.clone(), GAME, BOB, PERIOD, nav);
        polls(0).await;

        let err = guest.start_game(api.as_ref()).await.unwrap_err();
        assert!(matches!(err, FlowError::NotHost));
        assert_eq!(api.calls("start_game"), 0);

        let (nav, routes) = recording_navigator();
        let host = Lobby::open(api.clone(), GAME, ALICE, PERIOD, nav);
        polls(0).await;
        host.start_game(api.as_ref()).await.unwrap();
        assert_eq!(api.calls("start_game"), 1);

        polls(1).await;
        assert_eq!(routes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_returns_to_join_screen() {
        let api = lobby_api();
        let (nav, _) = recording_navigator();
        let lobby = Lobby::open(api.clone(), GAME, BOB, PERIOD, nav);
        polls(0).await;

        let (mut back, routes) = recording_navigator();
        lobby.leave(api.as_ref(), &mut back).await.unwrap();

        assert_eq!(*routes.lock().unwrap(), vec![Route::JoinGame]);
        let game = api.game(GAME).await.unwrap();
        assert!(game.player(BOB).is_none());
    }
}
