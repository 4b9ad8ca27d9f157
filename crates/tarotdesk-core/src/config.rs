//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which holds the backend project URL, its public anon key, and the admin
//! email last used to sign in.
//!
//! Configuration is stored at `~/.config/tarotdesk/config.json`. Environment
//! variables override the file; the admin password is only ever read from the
//! environment or the keychain.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tarotdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BACKEND_URL: &str = "TAROTDESK_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "TAROTDESK_ANON_KEY";
pub const ENV_EMAIL: &str = "TAROTDESK_EMAIL";
pub const ENV_PASSWORD: &str = "TAROTDESK_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub admin_email: Option<String>,
    #[serde(skip)]
    pub admin_password: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay values from an environment lookup. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend_url = Some(url);
        }
        if let Some(key) = get(ENV_ANON_KEY) {
            self.anon_key = Some(key);
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.admin_email = Some(email);
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.admin_password = Some(password);
        }
    }

    /// Backend URL and anon key, when both are set
    pub fn backend(&self) -> Option<(&str, &str)> {
        match (&self.backend_url, &self.anon_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Session and snapshot directory for the configured backend project
    pub fn project_dir(&self) -> Result<PathBuf> {
        Ok(project_dir_in(&self.cache_dir()?, self.backend_url.as_deref()))
    }
}

/// Host part of a project URL, e.g. `abcd.supabase.co`. Anything that is not
/// a URL is reduced to a file-name-safe string.
pub fn project_key(url: &str) -> String {
    let trimmed = url.trim();
    url::Url::parse(trimmed)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| {
            trimmed
                .trim_end_matches('/')
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
                .collect()
        })
}

/// `base/<project host>`, or `base` itself when no backend is configured
pub fn project_dir_in(base: &Path, backend_url: Option<&str>) -> PathBuf {
    match backend_url.map(project_key).filter(|k| !k.is_empty()) {
        Some(key) => base.join(key),
        None => base.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            backend_url: Some("https://old.example.co".to_string()),
            anon_key: Some("old".to_string()),
            admin_email: None,
            admin_password: None,
        };
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "https://new.example.co"),
            (ENV_ANON_KEY, "  "),
            (ENV_PASSWORD, "moon"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.backend(), Some(("https://new.example.co", "old")));
        assert_eq!(config.admin_password.as_deref(), Some("moon"));
        assert_eq!(config.admin_email, None);
    }

    #[test]
    fn test_project_dir_per_backend_host() {
        let base = Path::new("/tmp/tarotdesk");
        assert_eq!(
            project_dir_in(base, Some("https://ABCD.supabase.co/")),
            base.join("abcd.supabase.co")
        );
        assert_eq!(project_dir_in(base, Some("not a url/")), base.join("not_a_url"));
        assert_eq!(project_dir_in(base, None), base.to_path_buf());
        assert_ne!(
            project_dir_in(base, Some("https://a.supabase.co")),
            project_dir_in(base, Some("https://b.supabase.co"))
        );
    }

    #[test]
    fn test_password_not_serialized() {
        let config = Config {
            admin_password: Some("secret".to_string()),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_backend_requires_both_values() {
        let config = Config {
            backend_url: Some("https://x.example.co".to_string()),
            ..Config::default()
        };
        assert_eq!(config.backend(), None);
    }
}
