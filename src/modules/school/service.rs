use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;
use validator::Validate;

use crate::services::hashing;
use crate::services::jwt::{JwtService, PURPOSE_RECOVER, PURPOSE_VERIFY_EMAIL};
use crate::services::mailer::{recovery_email, verification_email, MailSender};
use crate::services::uploads::BlobStore;

use super::interface::{Result, SchoolError, SchoolRepository};
use super::model::School;
use super::schema::RegisterRequest;

const UPLOAD_FOLDER: &str = "school_images";

/// The account lifecycle manager. Owns the state transitions
/// unverified -> verified and active -> recovering -> active; everything
/// else (store, mail, uploads, signing) is an injected collaborator.
pub struct SchoolService<'a> {
    schools: &'a dyn SchoolRepository,
    mailer: &'a dyn MailSender,
    uploads: &'a dyn BlobStore,
    jwt: &'a JwtService,
    client_url: &'a str,
}

/// Passwords must start with an uppercase letter and contain at least one
/// non-alphanumeric character. Applied at registration and at reset.
fn password_meets_policy(password: &str) -> bool {
    static STARTS_UPPER: OnceLock<Regex> = OnceLock::new();
    static HAS_SPECIAL: OnceLock<Regex> = OnceLock::new();

    let starts_upper = STARTS_UPPER.get_or_init(|| Regex::new(r"^[A-Z]").unwrap());
    let has_special = HAS_SPECIAL.get_or_init(|| Regex::new(r"[\W_]").unwrap());

    starts_upper.is_match(password) && has_special.is_match(password)
}

/// Login keys are case-insensitive: e-mails are trimmed and lowercased at
/// every entry point, so the unique index works on the normalized form.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl<'a> SchoolService<'a> {
    pub fn new(
        schools: &'a dyn SchoolRepository,
        mailer: &'a dyn MailSender,
        uploads: &'a dyn BlobStore,
        jwt: &'a JwtService,
        client_url: &'a str,
    ) -> Self {
        Self {
            schools,
            mailer,
            uploads,
            jwt,
            client_url,
        }
    }

    pub async fn register(&self, req: RegisterRequest, image: Option<Vec<u8>>) -> Result<School> {
        if let Some(field) = req.first_missing_field() {
            return Err(SchoolError::Validation(format!("{field} is required!")));
        }

        if req.validate().is_err() {
            return Err(SchoolError::Validation("Invalid email format".to_string()));
        }

        if !password_meets_policy(&req.password) {
            return Err(SchoolError::PolicyViolation(
                "Password must start with a capital letter and contain at least one special character."
                    .to_string(),
            ));
        }

        if req.password != req.password_confirm {
            return Err(SchoolError::PolicyViolation(
                "Passwords do not match!".to_string(),
            ));
        }

        let email = normalize_email(&req.email);

        // The image is part of the requested record, so a failed upload
        // fails the whole registration.
        let image_url = match image {
            Some(bytes) => Some(
                self.uploads
                    .upload(bytes, "image", UPLOAD_FOLDER)
                    .await
                    .map_err(|e| SchoolError::Upstream(e.to_string()))?,
            ),
            None => None,
        };

        let password_hash = hashing::hash_password(&req.password)
            .map_err(|e| SchoolError::Upstream(e.to_string()))?;

        let now = Utc::now();
        let school = School {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name: req.name,
            description: req.description,
            phone: req.phone,
            address: req.address,
            image_url,
            role: None,
            verified: false,
            recovery_token: None,
            created_at: now,
            updated_at: now,
        };

        // Unique email index is the authority on duplicates; the insert
        // itself reports DuplicateAccount.
        self.schools.insert(&school).await?;

        // Persist first, then notify. A failed send never rolls back the
        // created account.
        self.send_verification_email(&school).await;

        Ok(school)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, School)> {
        let email = normalize_email(email);

        let school = self
            .schools
            .find_by_email(&email)
            .await?
            .ok_or(SchoolError::NotFound)?;

        let valid = hashing::verify_password(password, &school.password_hash)
            .map_err(|e| SchoolError::Upstream(e.to_string()))?;

        if !valid {
            return Err(SchoolError::InvalidCredentials);
        }

        if !school.verified {
            self.send_verification_email(&school).await;
            return Err(SchoolError::NotVerified);
        }

        let token = self
            .jwt
            .create_session_token(&school.id, &school.email, school.role.as_deref())
            .map_err(|e| SchoolError::Upstream(e.to_string()))?;

        Ok((token, school))
    }

    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let claims = self
            .jwt
            .verify_action_token(token, PURPOSE_VERIFY_EMAIL)
            .map_err(|_| SchoolError::InvalidOrExpiredToken)?;

        let school = self
            .schools
            .find_by_email(&claims.email)
            .await?
            .ok_or(SchoolError::NotFound)?;

        if school.verified {
            return Err(SchoolError::AlreadyVerified);
        }

        // Conditional update closes the race between two replayed requests.
        if !self.schools.mark_verified(&school.id).await? {
            return Err(SchoolError::AlreadyVerified);
        }

        Ok(())
    }

    /// Never reports whether the email exists; the controller returns the
    /// same body either way.
    pub async fn recover(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);

        let Some(school) = self.schools.find_by_email(&email).await? else {
            tracing::info!(email = %email, "recovery requested for unknown email");
            return Ok(());
        };

        let issued = self
            .jwt
            .create_recovery_token(&school.id, &school.email)
            .map_err(|e| SchoolError::Upstream(e.to_string()))?;

        // Persisting the jti supersedes any outstanding recovery request.
        self.schools
            .set_recovery_token(&school.id, &issued.jti)
            .await?;

        let link = format!("{}/recover/{}", self.client_url, issued.token);
        let (subject, body) = recovery_email(&school.name, &link);
        if let Err(e) = self.mailer.send(&school.email, &subject, &body).await {
            tracing::error!(error = %e, email = %school.email, "failed to send recovery email");
        }

        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        if new_password.len() < 6 {
            return Err(SchoolError::PolicyViolation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        if !password_meets_policy(new_password) {
            return Err(SchoolError::PolicyViolation(
                "Password must start with a capital letter and contain at least one special character."
                    .to_string(),
            ));
        }

        let claims = self
            .jwt
            .verify_action_token(token, PURPOSE_RECOVER)
            .map_err(|_| SchoolError::InvalidOrExpiredToken)?;

        let password_hash = hashing::hash_password(new_password)
            .map_err(|e| SchoolError::Upstream(e.to_string()))?;

        // Compare-and-clear on the stored jti makes the token one-shot: a
        // consumed or superseded token matches no row.
        let replaced = self
            .schools
            .replace_password(&claims.sub, &claims.jti, &password_hash)
            .await?;

        if !replaced {
            return Err(SchoolError::InvalidOrExpiredToken);
        }

        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<School> {
        self.schools
            .find_by_id(id)
            .await?
            .ok_or(SchoolError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<School>> {
        self.schools.list().await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.schools.delete(id).await
    }

    async fn send_verification_email(&self, school: &School) {
        let issued = match self.jwt.create_verification_token(&school.id, &school.email) {
            Ok(issued) => issued,
            Err(e) => {
                tracing::error!(error = %e, "failed to sign verification token");
                return;
            }
        };

        let link = format!("{}/verifyemail/{}", self.client_url, issued.token);
        let (subject, body) = verification_email(&school.name, &link);
        if let Err(e) = self.mailer.send(&school.email, &subject, &body).await {
            tracing::error!(error = %e, email = %school.email, "failed to send verification email");
        }
    }
}
