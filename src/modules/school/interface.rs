use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse, Json};

use super::model::School;
use super::schema::ErrorResponse;

pub type Result<T> = std::result::Result<T, SchoolError>;

// =============================================================================
// REPOSITORY TRAIT
// =============================================================================

/// Data-store seam for the account lifecycle. Every mutation maps to an
/// atomic single-row statement in the backing store.
#[async_trait]
pub trait SchoolRepository: Send + Sync {
    /// Inserts a new account. The store's unique email constraint is the
    /// authority on duplicates; implementations map a unique-key violation
    /// to `SchoolError::DuplicateAccount`.
    async fn insert(&self, school: &School) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<School>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<School>>;

    async fn list(&self) -> Result<Vec<School>>;

    /// Flips `verified` false -> true. Returns false when the account was
    /// already verified (the flag never transitions back).
    async fn mark_verified(&self, id: &str) -> Result<bool>;

    /// Attaches the id of the latest recovery token, superseding any prior
    /// outstanding recovery request.
    async fn set_recovery_token(&self, id: &str, token_id: &str) -> Result<()>;

    /// Replaces the password hash and clears the recovery token in one
    /// atomic step, but only if `token_id` still matches the outstanding
    /// request. Returns false when the token was already consumed or
    /// superseded.
    async fn replace_password(
        &self,
        id: &str,
        token_id: &str,
        password_hash: &str,
    ) -> Result<bool>;

    /// Idempotent delete; absent rows are not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SchoolError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PolicyViolation(String),

    #[error("Email already registered")]
    DuplicateAccount,

    #[error("School not found")]
    NotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email not verified. A new verification link has been sent.")]
    NotVerified,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Upstream service failure")]
    Upstream(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl SchoolError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PolicyViolation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateAccount => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotVerified => StatusCode::FORBIDDEN,
            Self::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            Self::AlreadyVerified => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-checkable kind used in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::PolicyViolation(_) => "policy_violation",
            Self::DuplicateAccount => "duplicate_account",
            Self::NotFound => "not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::NotVerified => "not_verified",
            Self::InvalidOrExpiredToken => "invalid_or_expired_token",
            Self::AlreadyVerified => "already_verified",
            Self::Upstream(_) => "upstream_failure",
            Self::Database(_) => "database_error",
        }
    }
}

impl IntoResponse for SchoolError {
    fn into_response(self) -> axum::response::Response {
        // Upstream and store failures carry internals; log them server-side
        // and return a generic body.
        let message = match &self {
            Self::Upstream(detail) => {
                tracing::error!(detail = %detail, "upstream service failure");
                "Upstream service failure".to_string()
            }
            Self::Database(e) => {
                tracing::error!(error = %e, "database failure");
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status_code(),
            Json(ErrorResponse::with_message(self.kind(), message)),
        )
            .into_response()
    }
}
