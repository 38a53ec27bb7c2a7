//! HTTP access to the game server.
//!
//! [`ApiClient`] is the only type that touches the network. Screens depend on
//! the [`GameApi`] trait so they can run against an in-memory server in tests.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;
use shared::prelude::*;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, FALLBACK_MESSAGE};

/// Every endpoint the client calls.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// `GET /games`, in whatever order the server returns them.
    async fn list_games(&self) -> ApiResult<Vec<Game>>;

    async fn create_game(&self, request: &CreateGameRequest) -> ApiResult<GameId>;

    async fn game(&self, game_id: GameId) -> ApiResult<Game>;

    async fn join_game(&self, game_id: GameId, player_name: &str) -> ApiResult<PlayerId>;

    async fn start_game(&self, game_id: GameId, player_id: PlayerId) -> ApiResult<()>;

    async fn player(&self, player_id: PlayerId) -> ApiResult<Player>;

    async fn moves(&self, player_id: PlayerId) -> ApiResult<MoveHistory>;

    async fn submit_move(&self, player_id: PlayerId, request: &MoveRequest) -> ApiResult<()>;

    async fn leave_game(&self, player_id: PlayerId) -> ApiResult<()>;
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| ApiError::Transport {
            path: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request and decodes the JSON reply.
    ///
    /// A body, when present, is sent as JSON with the matching content type.
    /// No retries: the first transport failure or non-2xx status is returned.
    pub async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("➡️ {} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let transport = |source: reqwest::Error| {
            error!("Request failed for {}: {}", path, source);
            ApiError::Transport {
                path: path.to_string(),
                source,
            }
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;

        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => value,
                // error pages are often HTML; fall through to the generic message
                Err(_) if !status.is_success() => Value::Null,
                Err(source) => {
                    error!("Request failed for {}: {}", path, source);
                    return Err(ApiError::Decode {
                        path: path.to_string(),
                        source,
                    });
                }
            }
        };

        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(FALLBACK_MESSAGE)
                .to_string();
            warn!("API Error: {} - {}", status.as_u16(), message);
            return Err(ApiError::Server { status, message });
        }

        serde_json::from_value(payload).map_err(|source| {
            error!("Unexpected payload from {}: {}", path, source);
            ApiError::Decode {
                path: path.to_string(),
                source,
            }
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, path, None).await
    }
}

#[async_trait]
impl GameApi for ApiClient {
    async fn list_games(&self) -> ApiResult<Vec<Game>> {
        let list: GameList = self.get("/games").await?;
        Ok(list.games)
    }

    async fn create_game(&self, request: &CreateGameRequest) -> ApiResult<GameId> {
        let created: CreateGameResponse = self
            .request(Method::POST, "/games", Some(request))
            .await?;
        Ok(created.game_id)
    }

    async fn game(&self, game_id: GameId) -> ApiResult<Game> {
        self.get(&format!("/games/{game_id}")).await
    }

    async fn join_game(&self, game_id: GameId, player_name: &str) -> ApiResult<PlayerId> {
        let body = JoinGameRequest {
            player_name: player_name.to_string(),
        };
        let joined: JoinGameResponse = self
            .request(Method::POST, &format!("/games/{game_id}/players"), Some(&body))
            .await?;
        Ok(joined.player_id)
    }

    async fn start_game(&self, game_id: GameId, player_id: PlayerId) -> ApiResult<()> {
        let _: IgnoredAny = self
            .request::<(), _>(
                Method::PATCH,
                &format!("/games/{game_id}/start/{player_id}"),
                None,
            )
            .await?;
        Ok(())
    }

    async fn player(&self, player_id: PlayerId) -> ApiResult<Player> {
        self.get(&format!("/players/{player_id}")).await
    }

    async fn moves(&self, player_id: PlayerId) -> ApiResult<MoveHistory> {
        self.get(&format!("/players/{player_id}/moves")).await
    }

    async fn submit_move(&self, player_id: PlayerId, request: &MoveRequest) -> ApiResult<()> {
        let _: IgnoredAny = self
            .request(
                Method::POST,
                &format!("/players/{player_id}/moves"),
                Some(request),
            )
            .await?;
        Ok(())
    }

    async fn leave_game(&self, player_id: PlayerId) -> ApiResult<()> {
        let _: IgnoredAny = self
            .request::<(), _>(Method::DELETE, &format!("/players/{player_id}"), None)
            .await?;
        Ok(())
    }
}
