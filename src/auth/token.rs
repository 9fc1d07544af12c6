use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::models::{AccessTokenClaims, RefreshTokenClaims, UserRole};
use crate::error::AppError;

const ACCESS_TOKEN_TTL_HOURS: i64 = 1;
const REFRESH_TOKEN_TTL_DAYS: i64 = 1;
const REMEMBER_ME_TTL_DAYS: i64 = 30;
const DISCORD_TOKEN_TTL_DAYS: i64 = 365;

/// Signs and verifies the HS256 tokens issued by the API.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
}

impl TokenService {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
        }
    }

    /// Short-lived token used as `Authorization: Bearer`.
    pub fn access_token(
        &self,
        id: &str,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.access_token_with_ttl(id, name, email, role, Duration::hours(ACCESS_TOKEN_TTL_HOURS))
    }

    /// Long-lived access token handed to the Discord bot after account linking.
    pub fn discord_access_token(
        &self,
        id: &str,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.access_token_with_ttl(id, name, email, role, Duration::days(DISCORD_TOKEN_TTL_DAYS))
    }

    fn access_token_with_ttl(
        &self,
        id: &str,
        name: &str,
        email: &str,
        role: UserRole,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        sign(&claims, &self.access_secret)
    }

    pub fn refresh_token(&self, id: &str, remember_me: bool) -> Result<String, AppError> {
        let ttl = if remember_me {
            Duration::days(REMEMBER_ME_TTL_DAYS)
        } else {
            Duration::days(REFRESH_TOKEN_TTL_DAYS)
        };
        let now = Utc::now();
        let claims = RefreshTokenClaims {
            id: id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        sign(&claims, &self.refresh_secret)
    }

    /// Verify an access token. With `allow_expired` the expiry check is skipped.
    pub fn verify_access(
        &self,
        token: &str,
        allow_expired: bool,
    ) -> Result<AccessTokenClaims, AppError> {
        verify(token, &self.access_secret, allow_expired)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshTokenClaims, AppError> {
        verify(token, &self.refresh_secret, false)
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str, allow_expired: bool) -> Result<T, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    if allow_expired {
        validation.validate_exp = false;
        validation.required_spec_claims.remove("exp");
    }

    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| AppError::Auth(e.to_string()))
}
