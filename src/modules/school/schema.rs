use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::School;

// =============================================================================
// REGISTER
// =============================================================================

/// Registration input, assembled from the multipart form by the controller.
/// Profile fields are all required; the optional image arrives separately.
#[derive(Debug, Default, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub name: String,
    pub description: String,
    pub phone: String,
    pub address: String,
}

impl RegisterRequest {
    /// Reports the first required field that is absent or blank, in the
    /// order the form declares them.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("email", &self.email),
            ("password", &self.password),
            ("password_confirm", &self.password_confirm),
            ("name", &self.name),
            ("description", &self.description),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub school: SchoolResponse,
}

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub school: SchoolSummary,
    pub message: &'static str,
}

/// Minimal public fields returned at login.
#[derive(Debug, Serialize)]
pub struct SchoolSummary {
    pub id: String,
    pub email: String,
    pub name: String,
}

// =============================================================================
// EMAIL VERIFICATION
// =============================================================================

#[derive(Debug, Serialize)]
pub struct VerifyEmailResponse {
    pub message: &'static str,
}

// =============================================================================
// ACCOUNT RECOVERY
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RecoverRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RecoverResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: &'static str,
}

// =============================================================================
// READ / DELETE
// =============================================================================

/// Public account record. This is the only shape reads serialize, so the
/// password hash and recovery token are unreachable from any response.
#[derive(Debug, Serialize)]
pub struct SchoolResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub description: String,
    pub phone: String,
    pub address: String,
    pub image_url: Option<String>,
    pub role: Option<String>,
    pub verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&School> for SchoolResponse {
    fn from(school: &School) -> Self {
        Self {
            id: school.id.clone(),
            email: school.email.clone(),
            name: school.name.clone(),
            description: school.description.clone(),
            phone: school.phone.clone(),
            address: school.address.clone(),
            image_url: school.image_url.clone(),
            role: school.role.clone(),
            verified: school.verified,
            created_at: school.created_at,
            updated_at: school.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Stable error shape: `error` is a machine-checkable kind, `message` is for
/// humans.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}
