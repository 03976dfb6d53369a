//! Minecraft skin and cape server
//!
//! Serves player textures from an operator override directory, a local cache
//! that is wiped on a timer, or Mojang's profile services, falling back to a
//! default texture whenever none of those can provide one.

pub mod config;
pub mod error;
pub mod resolver;
pub mod server;
pub mod types;
pub mod wipe;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{ResolveError, Result, ServerError};
pub use resolver::Resolver;
pub use server::{create_router, start_server, ServerState, SharedState};
pub use types::*;
pub use wipe::{WipeScheduler, WipeState};
