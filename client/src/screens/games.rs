//! Open-game listing for the home and join screens.

use shared::prelude::*;
use tracing::{error, info};

use crate::api::GameApi;
use crate::error::{ApiResult, FlowError, FlowResult};

/// Newest first. The server sends no creation time, so the identifier stands
/// in for recency.
pub fn sort_newest_first(games: &mut [Game]) {
    games.sort_by(|a, b| b.game_id.cmp(&a.game_id));
}

pub async fn fetch_games<A: GameApi + ?Sized>(api: &A) -> ApiResult<Vec<Game>> {
    let mut games = api.list_games().await.inspect_err(|e| {
        error!("Error fetching games: {}", e);
    })?;
    sort_newest_first(&mut games);
    info!("📋 Fetched {} games", games.len());
    Ok(games)
}

/// Games a player can be sent to join; an empty list is reported as an error
/// so the caller stays on the current screen.
pub async fn joinable_games<A: GameApi + ?Sized>(api: &A) -> FlowResult<Vec<Game>> {
    let games = fetch_games(api).await?;
    if games.is_empty() {
        return Err(FlowError::NoGamesAvailable);
    }
    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;

    fn game(id: u64) -> Game {
        Game {
            game_id: GameId(id),
            ..Game::default()
        }
    }

    #[test]
    fn sorting_puts_highest_id_first() {
        let orders: [&[u64]; 4] = [&[1, 2, 3], &[3, 2, 1], &[2, 9, 2, 5], &[]];
        for order in orders {
            let mut games: Vec<Game> = order.iter().copied().map(game).collect();
            sort_newest_first(&mut games);
            assert!(
                games.windows(2).all(|w| w[0].game_id >= w[1].game_id),
                "{order:?}"
            );
            assert_eq!(games.len(), order.len());
        }
    }

    #[tokio::test]
    async fn fetch_returns_newest_first() {
        let api = FakeApi::new();
        for id in [4, 11, 7] {
            api.insert_game(game(id));
        }
        let ids: Vec<u64> = fetch_games(&api)
            .await
            .unwrap()
            .iter()
            .map(|g| g.game_id.0)
            .collect();
        assert_eq!(ids, vec![11, 7, 4]);
    }

    #[tokio::test]
    async fn empty_lobby_list_is_reported() {
        let api = FakeApi::new();
        let err = joinable_games(&api).await.unwrap_err();
        assert!(matches!(err, FlowError::NoGamesAvailable));
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_message() {
        let api = FakeApi::new();
        api.fail("list_games", "Service unavailable");
        let err = joinable_games(&api).await.unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable");
    }
}
