use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail provider rejected message: status {0}")]
    Rejected(u16),
}

/// Transactional email delivery abstraction. Production uses the HTTP API
/// sender; tests record messages in memory.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct MailAddress {
    email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailBody {
    sender: MailAddress,
    to: Vec<MailAddress>,
    subject: String,
    html_content: String,
}

/// Sends mail through a transactional mail provider's HTTP API.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String, from: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl MailSender for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        let body = SendMailBody {
            sender: MailAddress {
                email: self.from.clone(),
            },
            to: vec![MailAddress {
                email: to.to_string(),
            }],
            subject: subject.to_string(),
            html_content: html_body.to_string(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}

/// Local dev sender that logs the message instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl MailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), MailError> {
        tracing::info!(to, subject, "mail send stub");
        Ok(())
    }
}

/// Shared layout for outgoing mail, greeting the school by name.
fn mail_layout(name: &str, message: &str) -> String {
    format!(
        r#"<div style="max-width: 600px; margin: auto; font-family: Arial, sans-serif; line-height: 1.6;">
  <p>Hi <b>{name}</b>,</p>
  {message}
  <p style="font-size: 12px; color: #555;">If you did not request this, you can ignore this email.</p>
</div>"#
    )
}

pub fn verification_email(name: &str, link: &str) -> (String, String) {
    let message = format!(
        r#"<p>Welcome! Please confirm your email address to activate your account:</p>
  <a href="{link}">Verify Email</a>
  <p>This link expires in 10 minutes.</p>"#
    );
    (
        "Verify Your Email".to_string(),
        mail_layout(name, &message),
    )
}

pub fn recovery_email(name: &str, link: &str) -> (String, String) {
    let message = format!(
        r#"<p>Click here to reset your password:</p>
  <a href="{link}">Reset Password</a>
  <p>This link expires in 15 minutes.</p>"#
    );
    (
        "Recover Your Account".to_string(),
        mail_layout(name, &message),
    )
}
