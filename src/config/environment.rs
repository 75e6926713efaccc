use std::env;

/// Environment configuration
/// Loads and validates environment variables
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Frontend base URL used to build verification and reset links.
    pub client_url: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub upload_api_url: String,
    pub upload_api_key: String,
    /// Comma-separated allowed CORS origins. Empty means permissive.
    pub cors_allowed_origins: Vec<String>,
    pub session_ttl_days: i64,
    pub verification_ttl_minutes: i64,
    pub recovery_ttl_minutes: i64,
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let client_url =
            env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let mail_api_url = env::var("MAIL_API_URL").unwrap_or_default();
        let mail_api_key = env::var("MAIL_API_KEY").unwrap_or_default();
        let mail_from = env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string());

        let upload_api_url = env::var("UPLOAD_API_URL").unwrap_or_default();
        let upload_api_key = env::var("UPLOAD_API_KEY").unwrap_or_default();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let session_ttl_days = env_i64("SESSION_TTL_DAYS", 7);
        let verification_ttl_minutes = env_i64("VERIFICATION_TTL_MINUTES", 10);
        let recovery_ttl_minutes = env_i64("RECOVERY_TTL_MINUTES", 15);

        Ok(Self {
            database_url,
            jwt_secret,
            client_url,
            mail_api_url,
            mail_api_key,
            mail_from,
            upload_api_url,
            upload_api_key,
            cors_allowed_origins,
            session_ttl_days,
            verification_ttl_minutes,
            recovery_ttl_minutes,
        })
    }
}
