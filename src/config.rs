use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::services::gemini;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://calorie_tracker.db";
pub const DEFAULT_IMAGES_DIR: &str = "data/images";
pub const DEFAULT_API_BIND: &str = "0.0.0.0:8080";

/// Settings read from the environment (and `.env`, loaded in `main`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub database_url: String,
    pub images_dir: PathBuf,
    pub api_token: Option<String>,
    pub api_bind: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            images_dir: lookup("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
            api_token: lookup("API_TOKEN"),
            api_bind: lookup("API_BIND").unwrap_or_else(|| DEFAULT_API_BIND.to_string()),
        }
    }

    /// Token the HTTP API expects in `?token=`
    pub fn api_token(&self) -> String {
        self.api_token.clone().unwrap_or_else(|| {
            log::warn!("⚠️ API_TOKEN not set, using default 'admin123' (INSECURE!)");
            "admin123".to_string()
        })
    }

    /// The Gemini key, required by commands that talk to the AI service
    pub fn require_gemini_api_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY must be set in .env file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None);

        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.images_dir, PathBuf::from("data/images"));
        assert_eq!(config.api_token(), "admin123");
        assert_eq!(config.api_bind, "0.0.0.0:8080");
        assert!(config.require_gemini_api_key().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("IMAGES_DIR", "/var/lib/meals"),
            ("API_TOKEN", "t0ken"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.require_gemini_api_key().unwrap(), "secret");
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.images_dir, PathBuf::from("/var/lib/meals"));
        assert_eq!(config.api_token(), "t0ken");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = AppConfig::from_lookup(|key| (key == "GEMINI_API_KEY").then(|| "  ".to_string()));
        assert!(config.gemini_api_key.is_none());
    }
}
