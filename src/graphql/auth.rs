//! GraphQL authentication
//!
//! The HTTP handler verifies the bearer token and inserts an [`AuthUser`]
//! into the request data; resolvers read it through [`AuthExt`].

use async_graphql::{Context, ErrorExtensions, Result};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::error::AppError;
use crate::services::auth::{AuthService, TokenClaims};

/// Caller identity taken from a verified token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

impl From<TokenClaims> for AuthUser {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            email: claims.email,
        }
    }
}

/// Extract bearer token from Authorization header
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Identity for the request, if it carries a valid token.
/// Invalid tokens are ignored; the request proceeds unauthenticated.
pub fn authenticate(headers: &HeaderMap, auth: &AuthService) -> Option<AuthUser> {
    let token = extract_token(headers)?;
    match auth.verify_token(token) {
        Ok(claims) => {
            tracing::debug!(user_id = %claims.sub, "Request authenticated");
            Some(claims.into())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token verification failed");
            None
        }
    }
}

/// Extension trait to get authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or return an error if not authenticated
    fn auth_user(&self) -> Result<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>()
            .ok_or_else(|| AppError::authentication_required().extend())
    }
}
