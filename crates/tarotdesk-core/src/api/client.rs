//! REST client for the hosted backend.
//!
//! Tables are served at `{base}/rest/v1/{table}` and auth at `{base}/auth/v1`.
//! Every request carries the project's anon key in the `apikey` header and a
//! bearer token: the signed-in user's access token when there is one, else
//! the anon key itself.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ApiError, AuthTokens, Backend, Query};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Client for the backend's table and auth APIs.
pub struct RestClient {
    client: Client,
    base_url: String,
    anon_key: String,
    token: RwLock<Option<String>>,
}

impl RestClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid backend URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            token: RwLock::new(None),
        })
    }

    fn table_url(&self, table: &str, query: &Query, select: bool) -> String {
        let qs = query.to_query_string(select);
        if qs.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, qs)
        }
    }

    /// `select=id` plus the query's filters; order and limit do not affect a count
    fn count_url(&self, table: &str, query: &Query) -> String {
        let filters = Query {
            filters: query.filters.clone(),
            ..Query::default()
        }
        .to_query_string(false);
        if filters.is_empty() {
            format!("{}/rest/v1/{}?select=id", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?select=id&{}", self.base_url, table, filters)
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let bearer = self
            .token
            .read()
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());

        headers.insert("apikey", header_value(&self.anon_key)?);
        headers.insert(header::AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);
        headers.insert("Prefer", header::HeaderValue::from_static("return=representation"));
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn execute<F>(&self, method: &Method, url: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let request = self
                .client
                .request(method.clone(), url)
                .headers(self.auth_headers()?);
            let response = build(request).send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e)))
    }

    async fn auth_request(&self, path: &str, body: Value) -> Result<AuthTokens, ApiError> {
        let url = self.auth_url(path);
        let response = self.execute(&Method::POST, &url, |r| r.json(&body)).await?;
        Self::json_body(response, &url).await
    }
}

/// Total from a PostgREST `Content-Range` header: `0-24/3573` or `*/0`
fn content_range_total(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn header_value(s: &str) -> Result<header::HeaderValue, ApiError> {
    header::HeaderValue::from_str(s)
        .map_err(|e| ApiError::InvalidResponse(format!("Invalid header value: {}", e)))
}

#[async_trait]
impl Backend for RestClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, ApiError> {
        let url = self.table_url(table, query, true);
        debug!(table = table, "select");
        let response = self.execute(&Method::GET, &url, |r| r).await?;
        Self::json_body(response, &url).await
    }

    async fn count(&self, table: &str, query: &Query) -> Result<usize, ApiError> {
        let url = self.count_url(table, query);
        debug!(table = table, "count");
        let response = self
            .execute(&Method::HEAD, &url, |r| r.header("Prefer", "count=exact"))
            .await?;
        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total)
            .ok_or_else(|| ApiError::InvalidResponse(format!("No row count in response from {}", url)))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, ApiError> {
        let url = self.table_url(table, &Query::new(), false);
        debug!(table = table, "insert");
        let response = self.execute(&Method::POST, &url, |r| r.json(&row)).await?;
        let mut rows: Vec<Value> = Self::json_body(response, &url).await?;
        if rows.is_empty() {
            return Err(ApiError::InvalidResponse(format!("Insert into {} returned no row", table)));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, ApiError> {
        // An unfiltered PATCH would touch every row
        if !query.has_filters() {
            return Err(ApiError::BadRequest(format!("Refusing unfiltered update on {}", table)));
        }
        let url = self.table_url(table, query, false);
        debug!(table = table, "update");
        let response = self.execute(&Method::PATCH, &url, |r| r.json(&patch)).await?;
        Self::json_body(response, &url).await
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<u64, ApiError> {
        if !query.has_filters() {
            return Err(ApiError::BadRequest(format!("Refusing unfiltered delete on {}", table)));
        }
        let url = self.table_url(table, query, false);
        debug!(table = table, "delete");
        let response = self.execute(&Method::DELETE, &url, |r| r).await?;
        let rows: Vec<Value> = Self::json_body(response, &url).await?;
        Ok(rows.len() as u64)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        self.auth_request(
            "token?grant_type=password",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_in_anonymously(&self) -> Result<AuthTokens, ApiError> {
        self.auth_request("signup", json!({})).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        self.auth_request(
            "token?grant_type=refresh_token",
            json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = RestClient::new("https://abc.example.co/", "anon").unwrap();
        assert_eq!(
            client.table_url("members", &Query::new().desc("created_at"), true),
            "https://abc.example.co/rest/v1/members?select=*&order=created_at.desc"
        );
        assert_eq!(
            client.table_url("members", &Query::new(), false),
            "https://abc.example.co/rest/v1/members"
        );
        assert_eq!(
            client.auth_url("signup"),
            "https://abc.example.co/auth/v1/signup"
        );
    }

    #[test]
    fn test_count_url_keeps_filters_only() {
        let client = RestClient::new("https://abc.example.co", "anon").unwrap();
        let query = Query::new().eq("is_active", true).desc("created_at").limit(5);
        assert_eq!(
            client.count_url("members", &query),
            "https://abc.example.co/rest/v1/members?select=id&is_active=eq.true"
        );
        assert_eq!(
            client.count_url("members", &Query::new()),
            "https://abc.example.co/rest/v1/members?select=id"
        );
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(content_range_total("0-24/3573"), Some(3573));
        assert_eq!(content_range_total("*/0"), Some(0));
        assert_eq!(content_range_total("0-24/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let client = RestClient::new("https://abc.example.co", "anon-key").unwrap();
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer anon-key");
        assert_eq!(headers["apikey"], "anon-key");

        client.set_access_token(Some("user-token".to_string()));
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer user-token");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(RestClient::new("not a url", "anon").is_err());
    }

    #[tokio::test]
    async fn test_unfiltered_delete_rejected() {
        let client = RestClient::new("https://abc.example.co", "anon").unwrap();
        let err = client.delete("members", &Query::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
