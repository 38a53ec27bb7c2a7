use std::fmt;

use shared::prelude::*;

// 🧭 Screens a flow can send the user to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    JoinGame,
    Lobby {
        game_id: GameId,
        player_id: PlayerId,
    },
    /// In-game screen. `role` is `None` when it could not be resolved, which
    /// selects the generic game screen.
    Game {
        game_id: GameId,
        player_id: PlayerId,
        role: Option<Role>,
    },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::JoinGame => f.write_str("/join-game"),
            Route::Lobby { game_id, player_id } => {
                write!(f, "/lobby/{game_id}?playerId={player_id}")
            }
            Route::Game {
                game_id,
                player_id,
                role,
            } => {
                let screen = match role {
                    Some(Role::Fugitive) => "fugitive",
                    Some(Role::Detective) => "detective",
                    None => "game",
                };
                write!(f, "/{screen}/{game_id}?playerId={player_id}")
            }
        }
    }
}

/// Receives navigation requests from flows and pollers.
pub trait Navigator: Send {
    fn navigate(&mut self, route: Route);
}

impl<F> Navigator for F
where
    F: FnMut(Route) + Send,
{
    fn navigate(&mut self, route: Route) {
        self(route)
    }
}
