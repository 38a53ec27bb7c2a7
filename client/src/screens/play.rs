//! In-game screen: current position, move log and move submission.

use std::sync::Arc;

use shared::prelude::*;
use tracing::{info, warn};

use super::game_over::GameOverNotice;
use crate::api::GameApi;
use crate::error::{FlowError, FlowResult};

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Set when the refreshed positions already show a capture. The
    /// server's own `Over` state still arrives through polling.
    pub game_over: Option<GameOverNotice>,
}

/// Client-side view of one player in a running game.
pub struct MoveSubmitter<A: ?Sized> {
    api: Arc<A>,
    game_id: GameId,
    player_id: PlayerId,
    role: Role,
    current_location: Option<Location>,
    game: Option<Game>,
    move_log: Vec<String>,
}

impl<A: GameApi + ?Sized> MoveSubmitter<A> {
    pub fn new(api: Arc<A>, game_id: GameId, player_id: PlayerId, role: Role) -> Self {
        Self {
            api,
            game_id,
            player_id,
            role,
            current_location: None,
            game: None,
            move_log: Vec::new(),
        }
    }

    /// Fetches game, player and move history together.
    ///
    /// The move history is optional; without it the starting location comes
    /// from the player record.
    pub async fn load(api: Arc<A>, game_id: GameId, player_id: PlayerId) -> FlowResult<Self> {
        let (game, player, history) = futures::join!(
            api.game(game_id),
            api.player(player_id),
            api.moves(player_id)
        );
        let game = game?;
        let player = player?;
        let role = player
            .role
            .or_else(|| game.player(player_id).and_then(|p| p.role))
            .ok_or(FlowError::Validation("No role has been assigned yet."))?;

        let start = match history {
            Ok(history) => history.start_location,
            Err(e) => {
                warn!("Error fetching move history: {}", e);
                None
            }
        };
        info!("🎮 Playing game {} as {} ({})", game_id, player.player_name, role);

        let mut submitter = Self::new(api, game_id, player_id, role);
        submitter.current_location = start.or(player.location);
        submitter.update_game(game);
        Ok(submitter)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn current_location(&self) -> Option<Location> {
        self.current_location
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn move_log(&self) -> &[String] {
        &self.move_log
    }

    pub fn is_my_turn(&self) -> bool {
        self.game
            .as_ref()
            .and_then(|g| g.state.turn())
            .is_some_and(|turn| turn == self.role)
    }

    /// Replaces the cached game, e.g. with one delivered by a poll.
    pub fn update_game(&mut self, game: Game) {
        self.move_log = game
            .players
            .iter()
            .filter_map(|p| {
                p.location
                    .map(|location| format!("{} moved to {}", p.player_name, location))
            })
            .collect();
        self.game = Some(game);
    }

    pub async fn refresh(&mut self) -> FlowResult<()> {
        let game = self.api.game(self.game_id).await?;
        self.update_game(game);
        Ok(())
    }

    /// Submits a move when it is this player's turn.
    ///
    /// A rejected move leaves the current location untouched.
    pub async fn submit(&mut self, destination: Location, ticket: &str) -> FlowResult<MoveOutcome> {
        let ticket = Ticket::new(ticket)
            .ok_or(FlowError::Validation("Please choose a transport ticket."))?;
        if !self.is_my_turn() {
            return Err(FlowError::NotYourTurn);
        }

        let request = MoveRequest {
            game_id: self.game_id,
            ticket,
            destination,
        };
        self.api
            .submit_move(self.player_id, &request)
            .await
            .inspect_err(|e| warn!("❌ Move Failed: {}", e))?;
        info!("🚶 Moved to {} by {}", destination, request.ticket);
        self.current_location = Some(destination);

        // the move stands even if this refresh fails; the next poll catches up
        if let Err(e) = self.refresh().await {
            warn!("Could not refresh game after move: {}", e);
            return Ok(MoveOutcome { game_over: None });
        }

        let game_over = self
            .game
            .as_ref()
            .filter(|game| captured_at(game, self.role, destination))
            .map(|_| GameOverNotice::for_winner(Some(Role::Detective)));
        if let Some(notice) = &game_over {
            info!("🏁 GAME OVER! {}", notice.message);
        }
        Ok(MoveOutcome { game_over })
    }
}

/// Whether moving to `destination` as `mover` ends in a capture, judged only
/// from the positions the server reports.
pub fn captured_at(game: &Game, mover: Role, destination: Location) -> bool {
    match mover {
        Role::Detective => game
            .fugitive()
            .is_some_and(|f| f.location == Some(destination)),
        Role::Fugitive => game
            .detectives()
            .any(|d| d.location == Some(destination)),
    }
}
