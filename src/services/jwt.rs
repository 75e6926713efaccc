use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PURPOSE_VERIFY_EMAIL: &str = "verify_email";
pub const PURPOSE_RECOVER: &str = "recover";

/// Claims for the session token issued at login.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // school id
    pub email: String,
    pub role: Option<String>,
    pub exp: i64, // expiration time
    pub iat: i64, // issued at
    pub jti: String, // unique token id
}

/// Claims for the short-lived action tokens (email verification, recovery).
/// `purpose` prevents a verification token from being replayed as a
/// recovery token and vice versa.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionClaims {
    pub sub: String, // school id
    pub email: String,
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// A freshly signed token together with its `jti`, for flows that persist
/// the token id (recovery supersede/one-shot semantics).
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
}

pub struct JwtService {
    secret: String,
    session_duration: Duration,
    verification_duration: Duration,
    recovery_duration: Duration,
}

impl JwtService {
    pub fn new(secret: String) -> Self {
        Self::with_ttls(secret, 7, 10, 15)
    }

    pub fn with_ttls(
        secret: String,
        session_days: i64,
        verification_minutes: i64,
        recovery_minutes: i64,
    ) -> Self {
        Self {
            secret,
            session_duration: Duration::days(session_days),
            verification_duration: Duration::minutes(verification_minutes),
            recovery_duration: Duration::minutes(recovery_minutes),
        }
    }

    pub fn create_session_token(
        &self,
        school_id: &str,
        email: &str,
        role: Option<&str>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + self.session_duration;

        let claims = SessionClaims {
            sub: school_id.to_string(),
            email: email.to_string(),
            role: role.map(str::to_string),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn create_verification_token(
        &self,
        school_id: &str,
        email: &str,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.create_action_token(school_id, email, PURPOSE_VERIFY_EMAIL, self.verification_duration)
    }

    pub fn create_recovery_token(
        &self,
        school_id: &str,
        email: &str,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.create_action_token(school_id, email, PURPOSE_RECOVER, self.recovery_duration)
    }

    fn create_action_token(
        &self,
        school_id: &str,
        email: &str,
        purpose: &str,
        duration: Duration,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + duration;
        let jti = Uuid::new_v4().to_string();

        let claims = ActionClaims {
            sub: school_id.to_string(),
            email: email.to_string(),
            purpose: purpose.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(IssuedToken { token, jti })
    }

    pub fn verify_session_token(
        &self,
        token: &str,
    ) -> Result<TokenData<SessionClaims>, jsonwebtoken::errors::Error> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
    }

    /// Decodes an action token and checks its `purpose` claim.
    pub fn verify_action_token(
        &self,
        token: &str,
        expected_purpose: &str,
    ) -> Result<ActionClaims, jsonwebtoken::errors::Error> {
        let data = decode::<ActionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        if data.claims.purpose != expected_purpose {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret".to_string())
    }

    #[test]
    fn session_token_round_trips() {
        let jwt = service();
        let token = jwt
            .create_session_token("school-1", "a@x.com", Some("admin"))
            .unwrap();

        let data = jwt.verify_session_token(&token).unwrap();
        assert_eq!(data.claims.sub, "school-1");
        assert_eq!(data.claims.email, "a@x.com");
        assert_eq!(data.claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn verification_token_carries_purpose() {
        let jwt = service();
        let issued = jwt.create_verification_token("school-1", "a@x.com").unwrap();

        let claims = jwt
            .verify_action_token(&issued.token, PURPOSE_VERIFY_EMAIL)
            .unwrap();
        assert_eq!(claims.purpose, PURPOSE_VERIFY_EMAIL);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn recovery_token_is_not_a_verification_token() {
        let jwt = service();
        let issued = jwt.create_recovery_token("school-1", "a@x.com").unwrap();

        assert!(jwt
            .verify_action_token(&issued.token, PURPOSE_VERIFY_EMAIL)
            .is_err());
        assert!(jwt.verify_action_token(&issued.token, PURPOSE_RECOVER).is_ok());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let jwt = service();
        let other = JwtService::new("other-secret".to_string());
        let issued = other.create_verification_token("school-1", "a@x.com").unwrap();

        assert!(jwt
            .verify_action_token(&issued.token, PURPOSE_VERIFY_EMAIL)
            .is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service();
        // Hand-rolled claims with exp well past the default 60s leeway.
        let now = Utc::now();
        let claims = ActionClaims {
            sub: "school-1".to_string(),
            email: "a@x.com".to_string(),
            purpose: PURPOSE_VERIFY_EMAIL.to_string(),
            exp: (now - Duration::minutes(30)).timestamp(),
            iat: (now - Duration::minutes(40)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();

        assert!(jwt.verify_action_token(&token, PURPOSE_VERIFY_EMAIL).is_err());
    }
}
