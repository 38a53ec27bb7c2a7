//! Join-game screen.

use shared::prelude::*;
use tracing::{info, warn};

use crate::api::GameApi;
use crate::error::{FlowError, FlowResult};
use crate::route::{Navigator, Route};

/// Joins `game_id` as `player_name` and sends the player to the lobby.
///
/// A blank name is rejected before any request is made.
pub async fn join_game<A, N>(
    api: &A,
    navigator: &mut N,
    game_id: GameId,
    player_name: &str,
) -> FlowResult<PlayerId>
where
    A: GameApi + ?Sized,
    N: Navigator + ?Sized,
{
    if player_name.trim().is_empty() {
        return Err(FlowError::Validation(
            "Please enter a player name before joining.",
        ));
    }

    info!("🔌 Joining game: {} as {}", game_id, player_name);
    let player_id = api
        .join_game(game_id, player_name)
        .await
        .inspect_err(|e| warn!("API error: {}", e))?;

    info!("🎮 Joined game successfully: Player ID {}", player_id);
    navigator.navigate(Route::Lobby { game_id, player_id });
    Ok(player_id)
}
