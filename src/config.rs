use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

/// Environment variable consulted before the config file for the catalog
/// API token, so the token can stay out of dotfiles.
pub const CATALOG_TOKEN_ENV: &str = "CLEANSWEEP_CATALOG_TOKEN";

/// Default recordings endpoint.
const DEFAULT_BASE_URL: &str = "https://isrc-api.soundexchange.com/api/ext/recordings";

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Directories to scan for music files (used when `scan` has no CLI args).
    pub music_dirs: Vec<PathBuf>,
    /// Custom database path (overrides XDG default).
    pub db_path: Option<PathBuf>,
    /// Recording catalog API settings.
    pub catalog: CatalogConfig,
}

/// Recording catalog API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Recordings endpoint URL.
    pub base_url: String,
    /// API token sent as the Authorization header. The
    /// CLEANSWEEP_CATALOG_TOKEN environment variable takes precedence.
    pub auth_token: Option<String>,
    /// Minimum gap between consecutive catalog calls in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            rate_limit_ms: 0,
            timeout_secs: 10,
        }
    }
}

impl CatalogConfig {
    /// Resolve the API token: environment variable first, then config file.
    pub fn resolve_auth_token(&self) -> Option<String> {
        std::env::var(CATALOG_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.auth_token.clone())
    }
}

impl AppConfig {
    /// Load config from `~/.config/cleansweep/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => {
                        match toml::from_str::<AppConfig>(&contents) {
                            Ok(config) => {
                                log::info!("Loaded config from {}", path.display());
                                config
                            }
                            Err(e) => {
                                log::warn!(
                                    "Failed to parse {}: {}. Using defaults.",
                                    path.display(),
                                    e
                                );
                                Self::default()
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!(
                            "Failed to read {}: {}. Using defaults.",
                            path.display(),
                            e
                        );
                        Self::default()
                    }
                }
            }
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default database path using XDG data directory.
pub fn default_db_path() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).ok();
        data_dir.join("cleansweep.db")
    } else {
        // Fallback: current directory
        PathBuf::from("cleansweep.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.music_dirs.is_empty());
        assert!(config.db_path.is_none());
        assert_eq!(config.catalog.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.catalog.rate_limit_ms, 0);
        assert_eq!(config.catalog.timeout_secs, 10);
    }

    #[test]
    fn test_partial_catalog_section() {
        let config: AppConfig = toml::from_str(
            "[catalog]\nrate_limit_ms = 1000\n",
        )
        .unwrap();
        assert_eq!(config.catalog.rate_limit_ms, 1000);
        assert_eq!(config.catalog.base_url, DEFAULT_BASE_URL);
    }
}
