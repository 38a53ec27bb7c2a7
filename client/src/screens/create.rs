//! Create-game screen: create a game, then join it as host.

use std::sync::atomic::{AtomicBool, Ordering};

use shared::prelude::*;
use tracing::{info, warn};

use crate::api::GameApi;
use crate::error::{FlowError, FlowResult};
use crate::route::{Navigator, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    pub game_name: String,
    pub host_name: String,
    pub length: GameLength,
    pub map_id: u32,
}

impl NewGame {
    pub fn new(
        game_name: impl Into<String>,
        host_name: impl Into<String>,
        length: GameLength,
    ) -> Self {
        Self {
            game_name: game_name.into(),
            host_name: host_name.into(),
            length,
            map_id: DEFAULT_MAP_ID,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created { game_id: GameId, player_id: PlayerId },
    /// Another submission was already running or had already navigated.
    Skipped,
}

/// Duplicate-submission guard around the create+join sequence.
///
/// One instance lives as long as the create screen. Only the first
/// successful submission navigates; later ones are skipped.
#[derive(Debug, Default)]
pub struct CreateGameFlow {
    in_flight: AtomicBool,
    navigated: AtomicBool,
}

// clears `in_flight` even if the submission future is dropped mid-request
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CreateGameFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn has_navigated(&self) -> bool {
        self.navigated.load(Ordering::Acquire)
    }

    pub async fn create_and_join<A, N>(
        &self,
        api: &A,
        navigator: &mut N,
        new_game: &NewGame,
    ) -> FlowResult<CreateOutcome>
    where
        A: GameApi + ?Sized,
        N: Navigator + ?Sized,
    {
        if new_game.host_name.trim().is_empty() || new_game.game_name.trim().is_empty() {
            return Err(FlowError::Validation(
                "Please fill in both your player name and game name.",
            ));
        }

        if self.has_navigated() || self.in_flight.swap(true, Ordering::AcqRel) {
            info!("Blocked duplicate submission");
            return Ok(CreateOutcome::Skipped);
        }
        let _in_flight = InFlight(&self.in_flight);

        let request = CreateGameRequest {
            name: new_game.game_name.clone(),
            game_length: new_game.length,
            map_id: new_game.map_id,
        };
        let game_id = api.create_game(&request).await?;
        info!("🏠 Game created successfully: {}", game_id);

        let player_id = api
            .join_game(game_id, &new_game.host_name)
            .await
            .inspect_err(|e| {
                warn!(
                    "❌ Host could not join game {} ({}); the game is left without players",
                    game_id, e
                );
            })?;
        info!("🎮 Joined game successfully as host: Player ID {}", player_id);

        self.navigated.store(true, Ordering::Release);
        navigator.navigate(Route::Lobby { game_id, player_id });

        Ok(CreateOutcome::Created { game_id, player_id })
    }
}
