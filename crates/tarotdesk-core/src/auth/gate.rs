use std::sync::Arc;

use tracing::{info, warn};

use super::{Session, SessionData};
use crate::api::Backend;

/// Outcome of establishing a session before any admin screen loads.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Authenticated(SessionData),
    /// No session could be established; the message is shown to the user.
    Required(String),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Establishes the backend session used by every table request.
///
/// Order of attempts:
/// 1. a stored session that is still valid
/// 2. refreshing a stored session close to expiry
///
/// Steps 1 and 2 are skipped when admin credentials are configured and the
/// stored session is anonymous or belongs to another email.
/// 3. signing in with configured credentials
/// 4. anonymous sign-in
pub struct AuthGate {
    backend: Arc<dyn Backend>,
    session: Session,
    credentials: Option<(String, String)>,
}

impl AuthGate {
    pub fn new(backend: Arc<dyn Backend>, session: Session) -> Self {
        Self {
            backend,
            session,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, email: &str, password: &str) -> Self {
        self.credentials = Some((email.to_string(), password.to_string()));
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn ensure_session(&mut self) -> AuthState {
        if let Err(e) = self.session.load() {
            warn!(error = %e, "Ignoring unreadable session file");
        }

        if let Some(data) = self.session.data.clone().filter(|d| self.is_reusable(d)) {
            if !data.needs_refresh() {
                return self.accept(data);
            }
            match self.backend.refresh_session(&data.refresh_token).await {
                Ok(tokens) => return self.accept(SessionData::from_tokens(tokens)),
                Err(e) => warn!(error = %e, "Session refresh failed"),
            }
        }

        let mut last_error = None;
        if let Some((email, password)) = self.credentials.clone() {
            match self.backend.sign_in_with_password(&email, &password).await {
                Ok(tokens) => return self.accept(SessionData::from_tokens(tokens)),
                Err(e) => {
                    warn!(error = %e, "Password sign-in failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        match self.backend.sign_in_anonymously().await {
            Ok(tokens) => self.accept(SessionData::from_tokens(tokens)),
            Err(e) => {
                warn!(error = %e, "Anonymous sign-in failed");
                self.backend.set_access_token(None);
                let cause = last_error.unwrap_or_else(|| e.to_string());
                AuthState::Required(format!(
                    "Unable to establish session. Please verify anonymous sign-in is enabled on the backend. ({})",
                    cause
                ))
            }
        }
    }

    /// A stored session stands in for configured credentials only when it
    /// is the same admin.
    fn is_reusable(&self, data: &SessionData) -> bool {
        match &self.credentials {
            None => true,
            Some((email, _)) => {
                !data.is_anonymous
                    && data
                        .email
                        .as_deref()
                        .is_some_and(|e| e.trim().eq_ignore_ascii_case(email.trim()))
            }
        }
    }

    /// Drop the stored session; the next `ensure_session` starts over.
    pub fn sign_out(&mut self) -> anyhow::Result<()> {
        self.backend.set_access_token(None);
        self.session.clear()
    }

    fn accept(&mut self, data: SessionData) -> AuthState {
        info!(user = %data.display_name(), "Session established");
        self.backend.set_access_token(Some(data.access_token.clone()));
        self.session.update(data.clone());
        if let Err(e) = self.session.save() {
            warn!(error = %e, "Failed to save session");
        }
        AuthState::Authenticated(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;

    fn gate(backend: Arc<MemoryBackend>, dir: &tempfile::TempDir) -> AuthGate {
        AuthGate::new(backend, Session::new(dir.path().to_path_buf()))
    }

    #[tokio::test]
    async fn test_password_sign_in_sets_token() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new().with_user("admin@example.com", "moon"));
        let mut gate = gate(backend.clone(), &dir).with_credentials("admin@example.com", "moon");

        match gate.ensure_session().await {
            AuthState::Authenticated(data) => {
                assert!(!data.is_anonymous);
                assert_eq!(backend.access_token(), Some(data.access_token));
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert!(gate.session().is_valid());
    }

    #[tokio::test]
    async fn test_falls_back_to_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let mut gate = gate(backend, &dir).with_credentials("admin@example.com", "wrong");

        match gate.ensure_session().await {
            AuthState::Authenticated(data) => assert!(data.is_anonymous),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_required_when_nothing_works() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new().without_anonymous_sign_in());
        let mut gate = gate(backend.clone(), &dir);

        match gate.ensure_session().await {
            AuthState::Required(msg) => assert!(msg.starts_with("Unable to establish session")),
            other => panic!("unexpected state: {:?}", other),
        }
        assert_eq!(backend.access_token(), None);
    }

    #[tokio::test]
    async fn test_reuses_stored_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let first = match gate(backend.clone(), &dir).ensure_session().await {
            AuthState::Authenticated(data) => data,
            other => panic!("unexpected state: {:?}", other),
        };

        // A fresh gate picks up the saved session without signing in again
        let closed = Arc::new(MemoryBackend::new().without_anonymous_sign_in());
        let state = gate(closed, &dir).ensure_session().await;
        assert_eq!(state, AuthState::Authenticated(first));
    }

    #[tokio::test]
    async fn test_credentials_replace_stored_anonymous_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new().with_user("admin@example.com", "moon"));

        // First run has no admin configured and signs in anonymously
        match gate(backend.clone(), &dir).ensure_session().await {
            AuthState::Authenticated(data) => assert!(data.is_anonymous),
            other => panic!("unexpected state: {:?}", other),
        }

        let mut admin = gate(backend.clone(), &dir).with_credentials("admin@example.com", "moon");
        match admin.ensure_session().await {
            AuthState::Authenticated(data) => {
                assert!(!data.is_anonymous);
                assert_eq!(data.email.as_deref(), Some("admin@example.com"));
                assert_eq!(backend.access_token(), Some(data.access_token));
            }
            other => panic!("unexpected state: {:?}", other),
        }

        // The admin session is saved and reused on the next run
        let mut again = gate(backend, &dir).with_credentials("ADMIN@example.com", "moon");
        match again.ensure_session().await {
            AuthState::Authenticated(data) => assert!(!data.is_anonymous),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stored_session_for_other_admin_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(
            MemoryBackend::new()
                .with_user("old@example.com", "sun")
                .with_user("new@example.com", "moon"),
        );
        assert!(gate(backend.clone(), &dir)
            .with_credentials("old@example.com", "sun")
            .ensure_session()
            .await
            .is_authenticated());

        let mut gate = gate(backend, &dir).with_credentials("new@example.com", "moon");
        match gate.ensure_session().await {
            AuthState::Authenticated(data) => assert_eq!(data.email.as_deref(), Some("new@example.com")),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let mut gate = gate(backend.clone(), &dir);
        assert!(gate.ensure_session().await.is_authenticated());

        gate.sign_out().unwrap();
        assert!(!gate.session().is_valid());
        assert_eq!(backend.access_token(), None);
    }
}
