use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AuthTokens;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub is_anonymous: bool,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn from_tokens(tokens: AuthTokens) -> Self {
        let expires_at = Utc::now() + Duration::seconds(tokens.expires_in);
        let (user_id, email, is_anonymous) = match tokens.user {
            Some(user) => (user.id, user.email, user.is_anonymous),
            None => (String::new(), None, true),
        };
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user_id,
            email,
            is_anonymous,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        Utc::now() > self.expires_at - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES)
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }

    /// Who the session belongs to, for the status bar
    pub fn display_name(&self) -> String {
        match (&self.email, self.is_anonymous) {
            (Some(email), false) => email.clone(),
            _ => "anonymous".to_string(),
        }
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. Expired sessions are ignored.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if session is valid
    pub fn token(&self) -> Option<&str> {
        self.data
            .as_ref()
            .filter(|d| !d.is_expired())
            .map(|d| d.access_token.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthUser;
    use crate::config::project_dir_in;

    fn tokens(expires_in: i64) -> AuthTokens {
        AuthTokens {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in,
            user: Some(AuthUser {
                id: "u1".to_string(),
                email: Some("admin@example.com".to_string()),
                is_anonymous: false,
            }),
        }
    }

    #[test]
    fn test_expiry_and_refresh_window() {
        let fresh = SessionData::from_tokens(tokens(3600));
        assert!(!fresh.is_expired());
        assert!(!fresh.needs_refresh());
        assert!(fresh.minutes_until_expiry() >= 59);

        let closing = SessionData::from_tokens(tokens(120));
        assert!(!closing.is_expired());
        assert!(closing.needs_refresh());

        let gone = SessionData::from_tokens(tokens(-10));
        assert!(gone.is_expired());
        assert_eq!(gone.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(SessionData::from_tokens(tokens(3600)));
        session.save().unwrap();

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.token(), Some("access"));
        assert_eq!(reloaded.data.as_ref().unwrap().display_name(), "admin@example.com");

        reloaded.clear().unwrap();
        let mut empty = Session::new(dir.path().to_path_buf());
        assert!(!empty.load().unwrap());
    }

    #[test]
    fn test_sessions_scoped_per_backend() {
        let base = tempfile::tempdir().unwrap();
        let project_a = project_dir_in(base.path(), Some("https://a.supabase.co"));
        let project_b = project_dir_in(base.path(), Some("https://b.supabase.co"));

        let mut session = Session::new(project_a.clone());
        session.update(SessionData::from_tokens(tokens(3600)));
        session.save().unwrap();

        assert!(!Session::new(project_b).load().unwrap());
        assert!(Session::new(project_a).load().unwrap());
    }

    #[test]
    fn test_load_ignores_expired() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(SessionData::from_tokens(tokens(-60)));
        session.save().unwrap();

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(!reloaded.load().unwrap());
        assert!(!reloaded.is_valid());
    }
}
