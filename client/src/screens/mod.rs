mod create;
mod game_over;
mod games;
mod join;
mod lobby;
mod play;

pub use create::{CreateGameFlow, CreateOutcome, NewGame};
pub use game_over::{GameOverNotice, GameWatch};
pub use games::{fetch_games, joinable_games, sort_newest_first};
pub use join::join_game;
pub use lobby::{leave_game, Lobby, LobbyEvent, LobbyPhase, LobbyState, LobbyView};
pub use play::{captured_at, MoveOutcome, MoveSubmitter};
