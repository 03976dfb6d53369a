//! Mojang Profile Client
//!
//! Resolves player names to profile UUIDs, decodes the texture URLs embedded
//! in session profiles and downloads texture bytes. Successful name lookups
//! are cached using a moka async cache; nothing is retried.

mod client;
mod error;
mod service;
mod types;

pub use client::MojangClient;
pub use error::{Result, UpstreamError};
pub use service::ProfileService;
pub use types::TextureProfile;
