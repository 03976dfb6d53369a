//! Core types for the skin server

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where a resolved texture lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    Override(PathBuf),
    Cached(PathBuf),
    /// Written to the cache by this resolution
    Fetched(PathBuf),
    Default(PathBuf),
}

impl AssetLocation {
    pub fn path(&self) -> &Path {
        match self {
            AssetLocation::Override(path)
            | AssetLocation::Cached(path)
            | AssetLocation::Fetched(path)
            | AssetLocation::Default(path) => path,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            AssetLocation::Override(_) => "override",
            AssetLocation::Cached(_) => "cache",
            AssetLocation::Fetched(_) => "upstream",
            AssetLocation::Default(_) => "default",
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, AssetLocation::Default(_))
    }
}

/// Number of entries per store for one kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCount {
    pub cached: usize,
    pub overridden: usize,
}

/// Statistics for one kind; timestamps are epoch milliseconds
#[derive(Debug, Serialize)]
pub struct TextureStats {
    pub cached: usize,
    pub overridden: usize,
    pub cache_wipe_time: i64,
    pub previous_cache_wipe_time: i64,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}
