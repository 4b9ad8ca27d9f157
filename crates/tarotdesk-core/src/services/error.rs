use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input rejected before reaching the backend.
    #[error("{0}")]
    Validation(String),

    /// The write would duplicate an existing record.
    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] ApiError),

    #[error("Invalid {table} row: {source}")]
    Decode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

/// Reject blank required text with "<Field> is required".
pub(crate) fn require(value: &str, field: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        Err(ServiceError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ServiceError::NotFound("Lesson".into()).to_string(), "Lesson not found");
        assert_eq!(
            require("  ", "Title").unwrap_err().to_string(),
            "Title is required"
        );
        assert!(require("The Star", "Title").is_ok());
    }

    #[test]
    fn test_backend_message_passes_through() {
        let err: ServiceError = ApiError::BadRequest("new row violates row-level security policy".into()).into();
        assert_eq!(err.to_string(), "new row violates row-level security policy");
    }
}
