//! Stand-in game server for local play and client tests.
//!
//! Serves the same HTTP API as the hosted server from an in-memory store.

pub mod routes;
pub mod store;

pub use routes::routes;
pub use store::{GameStore, StoreError};
