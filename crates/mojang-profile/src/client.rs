use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::{Result, UpstreamError};
use crate::service::ProfileService;
use crate::types::{ProfileLookupEntry, SessionProfileResponse, TextureProfile, TexturesPayload};

const DEFAULT_API_URL: &str = "https://api.mojang.com";
const DEFAULT_SESSION_URL: &str = "https://sessionserver.mojang.com";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const IDENTITY_CACHE_TTL_SECS: u64 = 300; // 5 minutes
const TEXTURES_PROPERTY: &str = "textures";

/// Mojang profiles API and session server client
pub struct MojangClient {
    client: Client,
    api_url: String,
    session_url: String,
    /// Lowercased name -> profile UUID, successful lookups only
    identity_cache: Cache<String, String>,
}

impl MojangClient {
    /// Create a client for the public Mojang endpoints
    pub fn new() -> Result<Self> {
        Self::with_urls(
            DEFAULT_API_URL,
            DEFAULT_SESSION_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client with custom endpoints and a per-request timeout
    pub fn with_urls(api_url: &str, session_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mojang-profile/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let identity_cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(IDENTITY_CACHE_TTL_SECS))
            .build();

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            session_url: session_url.trim_end_matches('/').to_string(),
            identity_cache,
        })
    }
}

#[async_trait]
impl ProfileService for MojangClient {
    async fn lookup_identity(&self, name: &str) -> Result<String> {
        let cache_key = name.to_ascii_lowercase();
        if let Some(cached) = self.identity_cache.get(&cache_key).await {
            return Ok(cached);
        }

        let url = format!("{}/profiles/minecraft", self.api_url);
        let response = self.client.post(&url).json(&[name]).send().await?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST
        ) {
            debug!(player = name, status = %status, "Profile lookup returned no profile");
            return Err(UpstreamError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let id = parse_lookup_response(name, &body)?;

        self.identity_cache.insert(cache_key, id.clone()).await;
        debug!(player = name, id = %id, "Resolved profile");

        Ok(id)
    }

    async fn fetch_profile(&self, id: &str) -> Result<TextureProfile> {
        let url = format!("{}/session/minecraft/profile/{}", self.session_url, id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(UpstreamError::EmptyBody);
        }

        let profile = decode_session_profile(&body)?;
        debug!(
            id,
            has_cape = profile.cape_url.is_some(),
            "Fetched session profile"
        );
        Ok(profile)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let data = response.bytes().await?.to_vec();
        if data.is_empty() {
            return Err(UpstreamError::EmptyBody);
        }

        debug!(url, size = data.len(), "Downloaded texture");
        Ok(data)
    }
}

/// Pick the UUID for `name` out of a profiles lookup response.
///
/// Anything other than an array containing `name` (ignoring case) means the
/// name is unknown.
fn parse_lookup_response(name: &str, body: &[u8]) -> Result<String> {
    let entries: Vec<ProfileLookupEntry> = serde_json::from_slice(body)
        .map_err(|_| UpstreamError::NotFound(name.to_string()))?;

    entries
        .into_iter()
        .find(|e| e.name.eq_ignore_ascii_case(name))
        .map(|e| e.id)
        .ok_or_else(|| UpstreamError::NotFound(name.to_string()))
}

/// Decode the texture URLs embedded in a session profile
fn decode_session_profile(body: &[u8]) -> Result<TextureProfile> {
    let profile: SessionProfileResponse =
        serde_json::from_slice(body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

    let encoded = profile
        .properties
        .iter()
        .find(|p| p.name == TEXTURES_PROPERTY)
        .map(|p| p.value.as_str())
        .ok_or_else(|| UpstreamError::Decode("profile has no textures property".to_string()))?;

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| UpstreamError::Decode(format!("textures property: {e}")))?;

    let payload: TexturesPayload =
        serde_json::from_slice(&decoded).map_err(|e| UpstreamError::Decode(e.to_string()))?;

    let skin = payload.textures.skin.ok_or(UpstreamError::MissingSkin)?;

    Ok(TextureProfile {
        id: profile.id,
        skin_url: skin.url,
        cape_url: payload.textures.cape.map(|c| c.url),
    })
}
