use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiError, Query};

/// Tokens issued by the backend's auth API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Table and auth operations of the hosted backend.
///
/// Rows travel as JSON objects; services convert them to typed models.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch rows matching the query.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, ApiError>;

    /// Insert one row and return it as stored (with id and timestamps).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, ApiError>;

    /// Number of rows matching the query's filters, without fetching them.
    async fn count(&self, table: &str, query: &Query) -> Result<usize, ApiError>;

    /// Patch every row matching the query and return the updated rows.
    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, ApiError>;

    /// Delete rows matching the query and return how many were removed.
    async fn delete(&self, table: &str, query: &Query) -> Result<u64, ApiError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError>;

    async fn sign_in_anonymously(&self) -> Result<AuthTokens, ApiError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, ApiError>;

    /// Use this access token for subsequent table requests.
    fn set_access_token(&self, token: Option<String>);

    /// Short name for logging.
    fn backend_name(&self) -> &'static str;
}
