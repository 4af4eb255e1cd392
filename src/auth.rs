// Password hashing and JWT session tokens, plus the extractor handlers use
// to identify the caller.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// JWT claims carried by every session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry_hours: config.jwt_expiry_hours,
        }
    }

    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("stored hash is invalid: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn issue_token(&self, user_id: i64, username: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))
    }

    pub fn decode_token(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        Ok(data.claims)
    }
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = authenticate_from_parts(parts, state);
        async move { result }
    }
}

// Optional variant for public endpoints that still personalize when a valid
// token is present. A missing header yields None; a bad token is still a 401.
impl axum::extract::OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Option<Self>, Self::Rejection>> + Send {
        let has_header = parts.headers.contains_key(axum::http::header::AUTHORIZATION);
        let result = if !has_header {
            Ok(None)
        } else {
            match authenticate_from_parts(parts, state) {
                Ok(user) => Ok(Some(user)),
                Err(e) => Err(e),
            }
        };

        async move { result }
    }
}

// Shared header-to-user path for both extractor impls.
fn authenticate_from_parts(parts: &Parts, state: &AppState) -> Result<AuthUser, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))?;

    let claims = state.auth.decode_token(token)?;
    let id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;

    Ok(AuthUser {
        id,
        username: claims.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 1,
        })
    }

    #[test]
    fn test_password_round_trip() {
        let auth = service();
        let hash = auth.hash_password("hunter22").unwrap();

        assert_ne!(hash, "hunter22");
        assert!(auth.verify_password("hunter22", &hash).unwrap());
        assert!(!auth.verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let auth = service();
        let token = auth.issue_token(42, "ana").unwrap();

        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "ana");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let auth = service();
        assert!(auth.decode_token("not-a-token").is_err());
    }

    #[test]
    fn test_token_not_valid_across_secrets() {
        let auth = service();
        let other = AuthService::new(&AuthConfig {
            jwt_secret: "different-secret".to_string(),
            jwt_expiry_hours: 1,
        });

        let token = auth.issue_token(7, "bo").unwrap();
        assert!(other.decode_token(&token).is_err());
    }
}
