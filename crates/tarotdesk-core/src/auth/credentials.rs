use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::project_key;

const SERVICE_NAME: &str = "tarotdesk";

/// Admin sign-in passwords kept in the OS keychain.
///
/// Entries are keyed by admin email and backend project, so the same email
/// can hold different passwords for a staging and a live project.
pub struct CredentialStore {
    project: String,
}

impl CredentialStore {
    /// Store for the backend at `backend_url`; `None` shares one default slot.
    pub fn for_backend(backend_url: Option<&str>) -> Self {
        Self {
            project: backend_url.map(project_key).unwrap_or_default(),
        }
    }

    fn entry(&self, email: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account(email))
            .with_context(|| format!("Failed to open keychain entry for {}", email))
    }

    fn account(&self, email: &str) -> String {
        let email = email.trim().to_lowercase();
        if self.project.is_empty() {
            email
        } else {
            format!("{}@{}", email, self.project)
        }
    }

    pub fn store(&self, email: &str, password: &str) -> Result<()> {
        self.entry(email)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    pub fn get_password(&self, email: &str) -> Result<String> {
        self.entry(email)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    pub fn delete(&self, email: &str) -> Result<()> {
        self.entry(email)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_includes_project_host() {
        let store = CredentialStore::for_backend(Some("https://abcd.supabase.co/"));
        assert_eq!(store.account(" Admin@Example.com "), "admin@example.com@abcd.supabase.co");
    }

    #[test]
    fn test_account_without_backend() {
        let store = CredentialStore::for_backend(None);
        assert_eq!(store.account("admin@example.com"), "admin@example.com");
    }
}
