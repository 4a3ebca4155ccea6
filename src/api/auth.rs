//! Password hashing and bearer-token auth for the user-facing endpoints.

use crate::api::error::ApiError;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

/// How long an issued token stays valid.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Signing configuration shared with the actix app data.
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn issue_token(secret: &str, user_id: i64, email: &str) -> Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("token signing failed: {e}"))
}

/// Decode and validate a token; `None` for anything invalid or expired.
pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// Extractor for endpoints that require a logged-in user. Pulls the Bearer
/// token from the Authorization header and validates it against the
/// configured secret.
#[derive(Debug)]
pub struct AuthedUser {
    pub id: i64,
    pub email: String,
}

impl FromRequest for AuthedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let outcome = (|| {
            let settings = req
                .app_data::<web::Data<AuthSettings>>()
                .ok_or(ApiError::Unauthorized("authentication is not configured"))?;
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .ok_or(ApiError::Unauthorized("missing bearer token"))?;
            let claims = decode_token(&settings.jwt_secret, token)
                .ok_or(ApiError::Unauthorized("invalid or expired token"))?;
            Ok(AuthedUser {
                id: claims.sub,
                email: claims.email,
            })
        })();
        ready(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2!").unwrap();
        assert_ne!(hash, "hunter2!");
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
    }

    #[test]
    fn two_hashes_of_the_same_password_differ() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_stored_hash_never_verifies() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let token = issue_token("test-secret", 42, "a@b.c").unwrap();
        let claims = decode_token("test-secret", &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "a@b.c");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("secret-a", 1, "a@b.c").unwrap();
        assert!(decode_token("secret-b", &token).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: 1,
            email: "a@b.c".to_string(),
            exp: (Utc::now() - chrono::Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(decode_token("test-secret", &token).is_none());
    }
}
