use serde::Deserialize;
use thiserror::Error;

/// Postgres error code for a unique constraint violation.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Constraint violation reported by the backend. Displays the backend's
    /// message unchanged.
    #[error("{message}")]
    Conflict { message: String, code: Option<String> },

    /// Any other rejected request. Displays the backend's message unchanged.
    #[error("{0}")]
    BadRequest(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shapes returned by the table API (`message`, `code`, ...) and
/// the auth API (`msg` or `error_description`).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
    }

    fn code(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => self.error_code.clone().or(Some(n.to_string())),
            _ => self.error_code.clone(),
        }
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed = ErrorBody::parse(body);
        let code = parsed.code();
        let message = parsed
            .message()
            .unwrap_or_else(|| Self::truncate_body(body));

        if let Some(ref details) = parsed.details {
            tracing::debug!(details = %details, hint = ?parsed.hint, "Backend error details");
        }

        if code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
            return ApiError::Conflict { message, code };
        }

        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict { message, code },
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::BadRequest(message),
        }
    }

    /// Build the error the backend reports for a duplicate key.
    pub fn unique_violation(constraint: &str) -> Self {
        ApiError::Conflict {
            message: format!(
                "duplicate key value violates unique constraint \"{}\"",
                constraint
            ),
            code: Some(UNIQUE_VIOLATION_CODE.to_string()),
        }
    }

    /// True when the backend rejected a write because of a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            ApiError::Conflict { message, code } => {
                code.as_deref() == Some(UNIQUE_VIOLATION_CODE) || message.contains("duplicate key")
            }
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_unique_violation_from_body() {
        let body = r#"{"code":"23505","details":"Key (module_number)=(3) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"course_modules_module_number_key\""}"#;
        let err = ApiError::from_status(StatusCode::CONFLICT, body);
        assert!(err.is_unique_violation());
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint \"course_modules_module_number_key\""
        );
    }

    #[test]
    fn test_message_surfaces_unchanged() {
        let body = r#"{"code":"22P02","message":"invalid input syntax for type uuid: \"x\""}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.to_string(), "invalid input syntax for type uuid: \"x\"");
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_auth_error_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.to_string(), "Invalid login credentials");

        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"msg":"JWT expired"}"#);
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_plain_body_is_truncated() {
        let body = "x".repeat(600);
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, &body);
        match err {
            ApiError::ServerError(msg) => assert!(msg.contains("truncated, 600 total bytes")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rate_limited() {
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
    }
}
