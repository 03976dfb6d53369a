use serde::{Deserialize, Serialize};
use std::fmt;

/// The two texture categories a player can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Every profile has one
    Skin,
    /// Optional; a profile without one is not an error
    Cape,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Skin, AssetKind::Cape];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Skin => "skin",
            AssetKind::Cape => "cape",
        }
    }

    /// Whether upstream profiles are required to carry this kind
    pub fn is_primary(self) -> bool {
        matches!(self, AssetKind::Skin)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per [`AssetKind`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerKind<T> {
    pub skin: T,
    pub cape: T,
}

impl<T> PerKind<T> {
    pub fn new(skin: T, cape: T) -> Self {
        Self { skin, cape }
    }

    pub fn get(&self, kind: AssetKind) -> &T {
        match kind {
            AssetKind::Skin => &self.skin,
            AssetKind::Cape => &self.cape,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerKind<U> {
        PerKind {
            skin: f(self.skin),
            cape: f(self.cape),
        }
    }
}
