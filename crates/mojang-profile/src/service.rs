use async_trait::async_trait;

use crate::error::Result;
use crate::types::TextureProfile;

/// The three upstream steps needed to fetch a player's texture.
///
/// Each step fails independently; callers decide whether and when to retry.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Resolve a player name to its profile UUID
    async fn lookup_identity(&self, name: &str) -> Result<String>;

    /// Fetch the texture URLs of a profile
    async fn fetch_profile(&self, id: &str) -> Result<TextureProfile>;

    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
