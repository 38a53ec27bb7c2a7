use reqwest::StatusCode;
use thiserror::Error;

/// Shown when the server rejects a request without saying why.
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

/// Failure of a single request to the game server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response. `message` is the server's own text when it sent one.
    #[error("{message}")]
    Server { status: StatusCode, message: String },

    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure of a user-level action (create, join, move, ...).
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Please wait for your turn")]
    NotYourTurn,

    #[error("Only the host can start the game")]
    NotHost,

    #[error("There are no open lobbies to join at the moment.")]
    NoGamesAvailable,
}

pub type ApiResult<T> = Result<T, ApiError>;
pub type FlowResult<T> = Result<T, FlowError>;
