//! Wire types shared by the client and the stand-in game server.

pub mod protocol;

pub mod prelude {
    pub use crate::protocol::*;
}

pub use protocol::*;
