//! Error types for Kicklist
//!
//! Every failure a handler can produce belongs to one of five client-facing
//! families (validation, authentication, authorization, not-found, conflict)
//! or is an internal failure. Internal failures are logged with full detail
//! and reach the client only as a generic message.

use hyper::StatusCode;

use crate::db::StoreError;

/// Malformed or missing input, detected before any mutation (400)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid {field} '{value}'. Allowed values: {}", .allowed.join(", "))]
    InvalidEnum {
        field: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },

    #[error("Invalid {0} id")]
    InvalidId(&'static str),

    #[error("No updatable fields supplied")]
    NoFields,

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

/// Token and credential failures (401)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Authorization header must be in the form 'Bearer <token>'")]
    MalformedHeader,

    #[error("Invalid token")]
    Malformed,

    #[error("Token expired")]
    Expired,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Authenticated but not the required owner/author (403)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Only the owner of this kick can modify it")]
    NotOwner,

    #[error("Only the author of this comment can modify it")]
    NotAuthor,
}

/// Referenced entity absent (404)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("Kick not found")]
    Kick,

    #[error("Comment not found")]
    Comment,

    #[error("Account not found")]
    Account,

    #[error("Not found: {0}")]
    Route(String),
}

/// Uniqueness violations (409)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("An account with this handle already exists")]
    HandleTaken,

    #[error("An account with this email already exists")]
    EmailTaken,
}

/// Main error type for Kicklist operations
#[derive(Debug, thiserror::Error)]
pub enum KicklistError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KicklistError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the error is a server-side failure whose detail must stay in the logs
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Config(_) | Self::Internal(_))
    }

    /// Message safe to place in a response body
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        (self.status_code(), self.client_message())
    }
}

impl From<StoreError> for KicklistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { index } if index.contains("email") => {
                Self::Conflict(ConflictError::EmailTaken)
            }
            StoreError::Duplicate { .. } => Self::Conflict(ConflictError::HandleTaken),
            StoreError::Validation { field, reason } => {
                Self::Validation(ValidationError::InvalidField { field, reason })
            }
            StoreError::Backend(msg) => Self::Database(msg),
        }
    }
}

impl From<std::io::Error> for KicklistError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for KicklistError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(ValidationError::InvalidBody(err.to_string()))
    }
}

/// Result type alias for Kicklist operations
pub type Result<T> = std::result::Result<T, KicklistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            KicklistError::from(ValidationError::NoFields).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            KicklistError::from(AuthError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            KicklistError::from(AuthzError::NotAuthor).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            KicklistError::from(NotFoundError::Comment).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            KicklistError::from(ConflictError::HandleTaken).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            KicklistError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_never_reaches_client() {
        let err = KicklistError::Database("E1234 connection reset by 10.0.0.7".into());
        let (status, body) = err.into_status_code_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
    }

    #[test]
    fn test_missing_fields_message_names_each_field() {
        let err = ValidationError::MissingFields(vec!["handle", "email"]);
        assert_eq!(err.to_string(), "Missing required fields: handle, email");
    }

    #[test]
    fn test_store_errors_map_into_taxonomy() {
        let dup_handle: KicklistError = StoreError::Duplicate {
            index: "handle_unique".into(),
        }
        .into();
        assert!(matches!(
            dup_handle,
            KicklistError::Conflict(ConflictError::HandleTaken)
        ));

        let dup_email: KicklistError = StoreError::Duplicate {
            index: "email_unique".into(),
        }
        .into();
        assert!(matches!(
            dup_email,
            KicklistError::Conflict(ConflictError::EmailTaken)
        ));

        let invalid: KicklistError = StoreError::Validation {
            field: "title",
            reason: "must not be empty".into(),
        }
        .into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }
}
