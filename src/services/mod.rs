pub mod hashing;
pub mod jwt;
pub mod mailer;
pub mod security;
pub mod uploads;
