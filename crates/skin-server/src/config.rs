use std::env;
use std::path::PathBuf;
use std::time::Duration;

use texture_store::{AssetKind, PerKind};

use crate::error::{Result, ServerError};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SKIN_CACHE_HOURS: u64 = 24;
// Capes change less often than skins
const DEFAULT_CAPE_CACHE_HOURS: u64 = 48;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MOJANG_API_URL: &str = "https://api.mojang.com";
const DEFAULT_MOJANG_SESSION_URL: &str = "https://sessionserver.mojang.com";

/// Server configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_dirs: PerKind<PathBuf>,
    pub override_dirs: PerKind<PathBuf>,
    pub default_files: PerKind<PathBuf>,
    /// Time between full wipes of each cache
    pub wipe_intervals: PerKind<Duration>,
    /// Deadline for the whole upstream fetch, and for each request within it
    pub upstream_timeout: Duration,
    pub mojang_api_url: String,
    pub mojang_session_url: String,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let path = |name: &str, default: &str| {
            var(name)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(default))
        };

        let positive = |name: &str, default: u64| {
            var(name)
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };

        let hours = |name: &str, default: u64| {
            Duration::from_secs(positive(name, default).saturating_mul(3600))
        };

        let port = var("PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            cache_dirs: PerKind::new(path("SKIN_CACHE_DIR", "s_cache"), path("CAPE_CACHE_DIR", "c_cache")),
            override_dirs: PerKind::new(
                path("SKIN_OVERRIDE_DIR", "s_override"),
                path("CAPE_OVERRIDE_DIR", "c_override"),
            ),
            default_files: PerKind::new(
                path("DEFAULT_SKIN_FILE", "defaults/default_skin.png"),
                path("DEFAULT_CAPE_FILE", "defaults/default_cape.png"),
            ),
            wipe_intervals: PerKind::new(
                hours("SKIN_CACHE_HOURS", DEFAULT_SKIN_CACHE_HOURS),
                hours("CAPE_CACHE_HOURS", DEFAULT_CAPE_CACHE_HOURS),
            ),
            upstream_timeout: Duration::from_secs(positive(
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )),
            mojang_api_url: var("MOJANG_API_URL")
                .unwrap_or_else(|| DEFAULT_MOJANG_API_URL.to_string()),
            mojang_session_url: var("MOJANG_SESSION_URL")
                .unwrap_or_else(|| DEFAULT_MOJANG_SESSION_URL.to_string()),
        }
    }

    /// Every failed resolution serves a default texture, so both must exist
    pub fn validate(&self) -> Result<()> {
        for kind in AssetKind::ALL {
            let file = self.default_files.get(kind);
            if !file.is_file() {
                return Err(ServerError::Config(format!(
                    "default {} texture not found at {}",
                    kind,
                    file.display()
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_dirs.skin, PathBuf::from("./s_cache"));
        assert_eq!(config.override_dirs.cape, PathBuf::from("./c_override"));
        assert_eq!(
            config.default_files.skin,
            PathBuf::from("./defaults/default_skin.png")
        );
        assert_eq!(config.wipe_intervals.skin, Duration::from_secs(24 * 3600));
        assert_eq!(config.wipe_intervals.cape, Duration::from_secs(48 * 3600));
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.mojang_api_url, "https://api.mojang.com");
    }

    #[test]
    fn test_data_dir_and_explicit_paths() {
        let config = config_with(&[
            ("DATA_DIR", "/srv/skins"),
            ("CAPE_CACHE_DIR", "/tmp/capes"),
        ]);
        assert_eq!(config.cache_dirs.skin, PathBuf::from("/srv/skins/s_cache"));
        assert_eq!(config.cache_dirs.cape, PathBuf::from("/tmp/capes"));
        assert_eq!(
            config.default_files.cape,
            PathBuf::from("/srv/skins/defaults/default_cape.png")
        );
    }

    #[test]
    fn test_numeric_overrides_and_fallbacks() {
        let config = config_with(&[
            ("PORT", "80"),
            ("SKIN_CACHE_HOURS", "6"),
            ("CAPE_CACHE_HOURS", "0"),
            ("UPSTREAM_TIMEOUT_SECS", "soon"),
        ]);
        assert_eq!(config.port, 80);
        assert_eq!(config.wipe_intervals.skin, Duration::from_secs(6 * 3600));
        // Zero would wipe continuously
        assert_eq!(config.wipe_intervals.cape, Duration::from_secs(48 * 3600));
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_requires_default_textures() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        let config = config_with(&[("DATA_DIR", dir_str)]);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default skin texture not found"));

        std::fs::create_dir(dir.path().join("defaults")).unwrap();
        std::fs::write(dir.path().join("defaults/default_skin.png"), b"skin").unwrap();
        std::fs::write(dir.path().join("defaults/default_cape.png"), b"cape").unwrap();
        assert!(config.validate().is_ok());
    }
}
