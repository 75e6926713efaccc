use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::multipart::MultipartForm;
use axum_test::TestServer;

use school_auth::modules::school::interface::{Result, SchoolError, SchoolRepository};
use school_auth::modules::school::model::School;
use school_auth::services::jwt::JwtService;
use school_auth::services::mailer::{MailError, MailSender};
use school_auth::services::uploads::{BlobStore, UploadError};
use school_auth::AppState;

#[allow(dead_code)]
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only";
pub const TEST_CLIENT_URL: &str = "http://localhost:3000";

// =============================================================================
// IN-MEMORY COLLABORATORS
// =============================================================================

/// In-memory stand-in for the MySQL repository, with the same atomic
/// conditional-update semantics.
#[derive(Default)]
pub struct MemorySchoolRepository {
    rows: Mutex<HashMap<String, School>>,
}

#[async_trait]
impl SchoolRepository for MemorySchoolRepository {
    async fn insert(&self, school: &School) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|s| s.email == school.email) {
            return Err(SchoolError::DuplicateAccount);
        }
        rows.insert(school.id.clone(), school.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<School>> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<School>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<School>> {
        let mut schools: Vec<School> = self.rows.lock().unwrap().values().cloned().collect();
        schools.sort_by_key(|s| s.created_at);
        Ok(schools)
    }

    async fn mark_verified(&self, id: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(id) {
            Some(school) if !school.verified => {
                school.verified = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_recovery_token(&self, id: &str, token_id: &str) -> Result<()> {
        if let Some(school) = self.rows.lock().unwrap().get_mut(id) {
            school.recovery_token = Some(token_id.to_string());
        }
        Ok(())
    }

    async fn replace_password(
        &self,
        id: &str,
        token_id: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(id) {
            Some(school) if school.recovery_token.as_deref() == Some(token_id) => {
                school.password_hash = password_hash.to_string();
                school.recovery_token = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rows.lock().unwrap().remove(id);
        Ok(())
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Records outgoing mail so tests can pull tokens out of the links.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<SentMail>>,
}

#[allow(dead_code)]
impl MemoryMailer {
    pub fn messages_to(&self, to: &str) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == to)
            .cloned()
            .collect()
    }

    /// Token embedded in the action link of the latest mail sent to `to`.
    pub fn last_token_for(&self, to: &str) -> Option<String> {
        let mail = self.messages_to(to).into_iter().last()?;
        let start = mail.html.find("href=\"")? + "href=\"".len();
        let rest = &mail.html[start..];
        let link = &rest[..rest.find('"')?];
        link.rsplit('/').next().map(str::to_string)
    }
}

#[async_trait]
impl MailSender for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> std::result::Result<(), MailError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html_body.to_string(),
        });
        Ok(())
    }
}

/// Blob store stub: either hands back a canned URL or fails every upload.
pub struct StubBlobStore {
    pub fail: bool,
}

#[async_trait]
impl BlobStore for StubBlobStore {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        _kind: &str,
        folder: &str,
    ) -> std::result::Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Rejected(500));
        }
        Ok(format!("https://cdn.test/{folder}/uploaded.png"))
    }
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub schools: Arc<MemorySchoolRepository>,
    pub outbox: Arc<MemoryMailer>,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        Self::build(false).await
    }

    pub async fn with_failing_uploads() -> Self {
        Self::build(true).await
    }

    async fn build(fail_uploads: bool) -> Self {
        let schools = Arc::new(MemorySchoolRepository::default());
        let outbox = Arc::new(MemoryMailer::default());

        let state = AppState {
            schools: schools.clone(),
            mailer: outbox.clone(),
            uploads: Arc::new(StubBlobStore { fail: fail_uploads }),
            jwt_service: JwtService::new(TEST_JWT_SECRET.to_string()),
            client_url: TEST_CLIENT_URL.to_string(),
        };

        let app = school_auth::create_app(state, Vec::new()).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            schools,
            outbox,
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}

#[allow(dead_code)]
pub fn register_form(email: &str, password: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("email", email.to_string())
        .add_text("password", password.to_string())
        .add_text("password_confirm", password.to_string())
        .add_text("name", "Test School")
        .add_text("description", "A school for testing")
        .add_text("phone", "+2348123456789")
        .add_text("address", "1 Test Street")
}

/// Registers an account and returns the verification token from the mail.
#[allow(dead_code)]
pub async fn register_school(ctx: &TestContext, email: &str, password: &str) -> String {
    let response = ctx
        .server
        .post("/register")
        .multipart(register_form(email, password))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    ctx.outbox
        .last_token_for(email)
        .expect("verification mail should have been sent")
}

/// Registers and verifies an account, leaving it ready to log in.
#[allow(dead_code)]
pub async fn register_verified_school(ctx: &TestContext, email: &str, password: &str) {
    let token = register_school(ctx, email, password).await;
    let response = ctx.server.get(&format!("/verifyemail/{token}")).await;
    response.assert_status(axum::http::StatusCode::OK);
}
