//! Client for the Fugitive pursuit game server.
//!
//! The server owns every rule of the game. This crate wraps its REST API and
//! drives the client-side flows: listing and creating games, waiting in a
//! lobby until the host starts, and submitting moves.

pub mod api;
pub mod config;
pub mod error;
pub mod poll;
pub mod route;
pub mod screens;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::api::{ApiClient, GameApi};
    pub use crate::config::ClientConfig;
    pub use crate::error::{ApiError, FlowError};
    pub use crate::route::{Navigator, Route};
    pub use crate::screens::*;
    pub use shared::prelude::*;
}
