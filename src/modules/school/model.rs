use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A registered school account. `password_hash` and `recovery_token` never
/// leave this struct; responses go through `SchoolResponse`.
#[derive(Debug, Clone, FromRow)]
pub struct School {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub description: String,
    pub phone: String,
    pub address: String,
    pub image_url: Option<String>,
    pub role: Option<String>,
    pub verified: bool,
    pub recovery_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
