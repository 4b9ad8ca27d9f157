//! In-process backend.
//!
//! Stores rows as JSON objects per table and behaves like the hosted table
//! API closely enough for the services: ids and timestamps are issued on
//! insert, `updated_at` is bumped on update, and unique column sets are
//! enforced with the same error the hosted backend returns.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{ApiError, AuthTokens, AuthUser, Backend, Query};

/// Lifetime of tokens issued by the in-memory auth, in seconds.
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct UniqueConstraint {
    name: String,
    columns: Vec<String>,
}

pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    unique: HashMap<String, Vec<UniqueConstraint>>,
    users: HashMap<String, (String, String)>,
    allow_anonymous: bool,
    token: RwLock<Option<String>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Empty backend with no constraints and anonymous sign-in enabled.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            unique: HashMap::new(),
            users: HashMap::new(),
            allow_anonymous: true,
            token: RwLock::new(None),
        }
    }

    /// Backend with the unique constraints of the hosted schema.
    pub fn with_schema() -> Self {
        Self::new()
            .with_unique("course_modules", &["module_number"])
            .with_unique("digital_readings", &["category", "card_number"])
    }

    /// Reject inserts and updates that would duplicate these columns.
    pub fn with_unique(mut self, table: &str, columns: &[&str]) -> Self {
        let constraint = UniqueConstraint {
            name: format!("{}_{}_key", table, columns.join("_")),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        };
        self.unique.entry(table.to_string()).or_default().push(constraint);
        self
    }

    /// Register an account for password sign-in.
    pub fn with_user(mut self, email: &str, password: &str) -> Self {
        self.users.insert(
            email.to_lowercase(),
            (Uuid::new_v4().to_string(), password.to_string()),
        );
        self
    }

    pub fn without_anonymous_sign_in(mut self) -> Self {
        self.allow_anonymous = false;
        self
    }

    /// Current access token, as set by the auth gate.
    pub fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map(Vec::len).unwrap_or(0)
    }

    fn check_unique(&self, table: &str, rows: &[Value], candidate: &Value, skip_id: Option<&str>) -> Result<(), ApiError> {
        let Some(constraints) = self.unique.get(table) else {
            return Ok(());
        };

        for constraint in constraints {
            let clash = rows.iter().any(|row| {
                if skip_id.is_some() && row.get("id").and_then(Value::as_str) == skip_id {
                    return false;
                }
                constraint
                    .columns
                    .iter()
                    .all(|c| row.get(c).is_some() && row.get(c) == candidate.get(c))
            });
            if clash {
                return Err(ApiError::unique_violation(&constraint.name));
            }
        }
        Ok(())
    }

    fn issue_tokens(user_id: &str, email: Option<String>, is_anonymous: bool) -> AuthTokens {
        AuthTokens {
            access_token: format!("memory-access-{}", Uuid::new_v4()),
            refresh_token: format!("memory-refresh-{}", user_id),
            expires_in: TOKEN_LIFETIME_SECS,
            user: Some(AuthUser {
                id: user_id.to_string(),
                email,
                is_anonymous,
            }),
        }
    }
}

fn as_object(value: Value, table: &str) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::BadRequest(format!(
            "Expected a JSON object for {}, got {}",
            table, other
        ))),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, ApiError> {
        let tables = self.tables.lock();
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(query.apply(rows))
    }

    async fn count(&self, table: &str, query: &Query) -> Result<usize, ApiError> {
        let tables = self.tables.lock();
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(rows.iter().filter(|row| query.matches(row)).count())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, ApiError> {
        let mut row = as_object(row, table)?;
        let now = Value::String(Utc::now().to_rfc3339());
        row.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at").or_insert_with(|| now.clone());
        row.entry("updated_at").or_insert(now);
        let row = Value::Object(row);

        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_string()).or_default();
        self.check_unique(table, rows, &row, None)?;
        rows.push(row.clone());
        debug!(table = table, "memory insert");
        Ok(row)
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, ApiError> {
        let patch = as_object(patch, table)?;
        let now = Value::String(Utc::now().to_rfc3339());

        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_string()).or_default();

        // Build every patched row first so a constraint failure leaves the table untouched
        let mut patched = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            if !query.matches(row) {
                continue;
            }
            let mut updated = row.clone();
            if let Value::Object(ref mut map) = updated {
                for (k, v) in &patch {
                    map.insert(k.clone(), v.clone());
                }
                map.insert("updated_at".to_string(), now.clone());
            }
            let id = row.get("id").and_then(Value::as_str);
            self.check_unique(table, rows, &updated, id)?;
            patched.push((idx, updated));
        }

        for (idx, updated) in &patched {
            rows[*idx] = updated.clone();
        }
        Ok(patched.into_iter().map(|(_, row)| row).collect())
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<u64, ApiError> {
        let mut tables = self.tables.lock();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !query.matches(row));
        Ok((before - rows.len()) as u64)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        match self.users.get(&email.to_lowercase()) {
            Some((id, stored)) if stored == password => {
                Ok(Self::issue_tokens(id, Some(email.to_string()), false))
            }
            _ => Err(ApiError::BadRequest("Invalid login credentials".to_string())),
        }
    }

    async fn sign_in_anonymously(&self) -> Result<AuthTokens, ApiError> {
        if !self.allow_anonymous {
            return Err(ApiError::BadRequest("Anonymous sign-ins are disabled".to_string()));
        }
        Ok(Self::issue_tokens(&Uuid::new_v4().to_string(), None, true))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        let user_id = refresh_token
            .strip_prefix("memory-refresh-")
            .ok_or_else(|| ApiError::BadRequest("Invalid Refresh Token".to_string()))?;

        let email = self
            .users
            .iter()
            .find(|(_, (id, _))| id == user_id)
            .map(|(email, _)| email.clone());
        let is_anonymous = email.is_none();
        Ok(Self::issue_tokens(user_id, email, is_anonymous))
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_issues_id_and_timestamps() {
        let backend = MemoryBackend::new();
        let row = backend.insert("members", json!({"full_name": "Ada"})).await.unwrap();
        assert!(row["id"].as_str().is_some());
        assert!(row["created_at"].as_str().is_some());
        assert_eq!(backend.row_count("members"), 1);
    }

    #[tokio::test]
    async fn test_unique_violation() {
        let backend = MemoryBackend::with_schema();
        backend.insert("course_modules", json!({"module_number": 1})).await.unwrap();
        let err = backend
            .insert("course_modules", json!({"module_number": 1}))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("duplicate key"));
    }

    #[tokio::test]
    async fn test_update_respects_unique_and_is_atomic() {
        let backend = MemoryBackend::with_schema();
        backend.insert("course_modules", json!({"module_number": 1, "title": "A"})).await.unwrap();
        let second = backend
            .insert("course_modules", json!({"module_number": 2, "title": "B"}))
            .await
            .unwrap();
        let id = second["id"].as_str().unwrap();

        let err = backend
            .update("course_modules", &Query::by_id(id), json!({"module_number": 1}))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        let rows = backend.select("course_modules", &Query::by_id(id)).await.unwrap();
        assert_eq!(rows[0]["module_number"], 2);

        // Re-saving a row with its own value is not a clash
        let updated = backend
            .update("course_modules", &Query::by_id(id), json!({"module_number": 2, "title": "B2"}))
            .await
            .unwrap();
        assert_eq!(updated[0]["title"], "B2");
    }

    #[tokio::test]
    async fn test_count_applies_filters_not_limit() {
        let backend = MemoryBackend::new();
        backend.insert("members", json!({"is_active": true})).await.unwrap();
        backend.insert("members", json!({"is_active": false})).await.unwrap();
        backend.insert("members", json!({"is_active": true})).await.unwrap();

        assert_eq!(backend.count("members", &Query::new().limit(1)).await.unwrap(), 3);
        assert_eq!(backend.count("members", &Query::new().eq("is_active", true)).await.unwrap(), 2);
        assert_eq!(backend.count("nothing_here", &Query::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_counts_rows() {
        let backend = MemoryBackend::new();
        backend.insert("course_lessons", json!({"module_id": "m1"})).await.unwrap();
        backend.insert("course_lessons", json!({"module_id": "m1"})).await.unwrap();
        backend.insert("course_lessons", json!({"module_id": "m2"})).await.unwrap();
        let removed = backend
            .delete("course_lessons", &Query::new().eq("module_id", "m1"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(backend.row_count("course_lessons"), 1);
    }

    #[tokio::test]
    async fn test_auth() {
        let backend = MemoryBackend::new().with_user("admin@example.com", "moon");
        assert!(backend.sign_in_with_password("admin@example.com", "sun").await.is_err());

        let tokens = backend.sign_in_with_password("Admin@example.com", "moon").await.unwrap();
        let refreshed = backend.refresh_session(&tokens.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.as_ref().map(|u| u.is_anonymous), Some(false));

        let anon = backend.sign_in_anonymously().await.unwrap();
        assert!(anon.user.unwrap().is_anonymous);

        let closed = MemoryBackend::new().without_anonymous_sign_in();
        assert!(closed.sign_in_anonymously().await.is_err());
    }
}
