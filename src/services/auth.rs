//! Authentication service: password hashing and JWT handling
//!
//! Provides:
//! - Password hashing and verification with bcrypt
//! - Signed, time-bound access tokens (HS256)
//! - Token verification for the request middleware

use anyhow::{Result, anyhow};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::UserRecord;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID (subject)
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Token lifetime in seconds (default: 2 hours)
    pub token_lifetime: i64,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl From<&Config> for AuthConfig {
    fn from(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_lifetime: config.token_lifetime,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

// ============================================================================
// Auth Service
// ============================================================================

/// Credential verifier and token issuer
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Hash a password with bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.config.bcrypt_cost).map_err(|e| anyhow!("Failed to hash password: {}", e))
    }

    /// Verify a password against a stored hash.
    /// A malformed stored hash counts as a mismatch.
    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        match verify(password, password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be verified");
                false
            }
        }
    }

    /// Issue a signed token identifying `user`
    pub fn issue_token(&self, user: &UserRecord) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_lifetime);

        let claims = TokenClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| anyhow!("Failed to create token: {}", e))
    }

    /// Decode and validate a token (signature and expiry)
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
pub(crate) fn test_auth_service() -> AuthService {
    AuthService::new(AuthConfig {
        jwt_secret: "test-secret".to_string(),
        token_lifetime: 60,
        bcrypt_cost: 4,
    })
}
