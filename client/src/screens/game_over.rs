//! End-of-game detection while a game is in play.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared::prelude::*;
use tokio::sync::watch;
use tracing::{error, info};

use crate::api::GameApi;
use crate::poll::{self, Poll, PollHandle};
use crate::route::{Navigator, Route};

pub const CAUGHT: &str = "The fugitive has been caught!";
pub const ESCAPED: &str = "The fugitive has escaped!";
pub const ENDED: &str = "The game has ended!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverNotice {
    pub winner: Option<Role>,
    pub message: &'static str,
}

impl GameOverNotice {
    pub fn for_winner(winner: Option<Role>) -> Self {
        let message = match winner {
            Some(Role::Detective) => CAUGHT,
            Some(Role::Fugitive) => ESCAPED,
            None => ENDED,
        };
        Self { winner, message }
    }

    /// Notice for a game the server has declared over.
    pub fn from_game(game: &Game) -> Option<Self> {
        game.state
            .is_over()
            .then(|| Self::for_winner(game.winner))
    }
}

struct GameOverPoller<A: ?Sized, N> {
    api: Arc<A>,
    game_id: GameId,
    navigator: N,
    game: watch::Sender<Option<Game>>,
    notice: watch::Sender<Option<GameOverNotice>>,
}

#[async_trait]
impl<A, N> Poll for GameOverPoller<A, N>
where
    A: GameApi + ?Sized + 'static,
    N: Navigator + 'static,
{
    async fn tick(&mut self) -> ControlFlow<()> {
        let game = match self.api.game(self.game_id).await {
            Ok(game) => game,
            Err(e) => {
                error!("Error polling game state: {}", e);
                return ControlFlow::Continue(());
            }
        };

        let notice = GameOverNotice::from_game(&game);
        self.game.send_replace(Some(game));
        match notice {
            None => ControlFlow::Continue(()),
            Some(notice) => {
                info!("🏁 GAME OVER! {}", notice.message);
                self.notice.send_replace(Some(notice));
                self.navigator.navigate(Route::Home);
                ControlFlow::Break(())
            }
        }
    }
}

/// Polls a running game until the server reports it over. Dropping the
/// watch stops the poll.
#[derive(Debug)]
pub struct GameWatch {
    poll: PollHandle,
    game: watch::Receiver<Option<Game>>,
    notice: watch::Receiver<Option<GameOverNotice>>,
}

impl GameWatch {
    pub fn open<A, N>(api: Arc<A>, game_id: GameId, period: Duration, navigator: N) -> Self
    where
        A: GameApi + ?Sized + 'static,
        N: Navigator + 'static,
    {
        let (game_tx, game) = watch::channel(None);
        let (notice_tx, notice) = watch::channel(None);
        let poller = GameOverPoller {
            api,
            game_id,
            navigator,
            game: game_tx,
            notice: notice_tx,
        };
        Self {
            poll: poll::spawn(period, poller),
            game,
            notice,
        }
    }

    pub fn latest_game(&self) -> Option<Game> {
        self.game.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Game>> {
        self.game.clone()
    }

    pub fn notice(&self) -> Option<GameOverNotice> {
        self.notice.borrow().clone()
    }

    pub fn is_polling(&self) -> bool {
        !self.poll.is_finished()
    }

    /// Waits for the end of the game and returns its notice.
    pub async fn finished(self) -> Option<GameOverNotice> {
        let notice = self.notice.clone();
        self.poll.join().await;
        let last = notice.borrow().clone();
        last
    }

    /// Hands every fetched game to `on_update` until the game ends, then
    /// returns its notice. The notice wins over a final update.
    pub async fn follow(self, mut on_update: impl FnMut(&Game)) -> Option<GameOverNotice> {
        let mut updates = self.game.clone();
        let finished = self.finished();
        tokio::pin!(finished);

        loop {
            tokio::select! {
                biased;
                notice = &mut finished => return notice,
                changed = updates.changed() => {
                    if changed.is_err() {
                        return finished.await;
                    }
                    if let Some(game) = updates.borrow_and_update().as_ref() {
                        on_update(game);
                    }
                }
            }
        }
    }
}
