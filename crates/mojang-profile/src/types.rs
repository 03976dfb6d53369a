use serde::{Deserialize, Serialize};

/// Texture URLs advertised by a player's session profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureProfile {
    pub id: String,
    pub skin_url: String,
    /// `None` when the player has no cape
    pub cape_url: Option<String>,
}

/// Mojang API response types
#[derive(Debug, Deserialize)]
pub(crate) struct ProfileLookupEntry {
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionProfileResponse {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) properties: Vec<ProfileProperty>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileProperty {
    pub(crate) name: String,
    pub(crate) value: String,
}

/// Decoded contents of the `textures` property
#[derive(Debug, Deserialize)]
pub(crate) struct TexturesPayload {
    #[serde(default)]
    pub(crate) textures: Textures,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Textures {
    #[serde(rename = "SKIN")]
    pub(crate) skin: Option<TextureRef>,
    #[serde(rename = "CAPE")]
    pub(crate) cape: Option<TextureRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextureRef {
    pub(crate) url: String,
}
