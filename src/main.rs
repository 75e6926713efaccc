use std::sync::Arc;

use school_auth::config::{init_db, Config};
use school_auth::modules::school::crud::SchoolCrud;
use school_auth::services::jwt::JwtService;
use school_auth::services::mailer::{HttpMailer, LogMailer, MailSender};
use school_auth::services::uploads::HttpBlobStore;
use school_auth::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url)
        .await
        .expect("Failed to connect to MySQL");
    tracing::info!("Connected to MySQL");

    let http_client = reqwest::Client::new();

    let mailer: Arc<dyn MailSender> = if config.mail_api_url.is_empty() {
        tracing::warn!("MAIL_API_URL not set, outgoing mail will only be logged");
        Arc::new(LogMailer)
    } else {
        Arc::new(HttpMailer::new(
            http_client.clone(),
            config.mail_api_url,
            config.mail_api_key,
            config.mail_from,
        ))
    };

    let state = AppState {
        schools: Arc::new(SchoolCrud::new(db)),
        mailer,
        uploads: Arc::new(HttpBlobStore::new(
            http_client,
            config.upload_api_url,
            config.upload_api_key,
        )),
        jwt_service: JwtService::with_ttls(
            config.jwt_secret,
            config.session_ttl_days,
            config.verification_ttl_minutes,
            config.recovery_ttl_minutes,
        ),
        client_url: config.client_url,
    };

    let app = school_auth::create_app(state, config.cors_allowed_origins).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind port 3000");
    tracing::info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.expect("Server error");
}
