//! Domain errors surfaced to GraphQL clients
//!
//! Resolvers convert an [`AppError`] with [`ErrorExtensions::extend`] so the
//! response carries a machine-readable `code` extension next to the message.

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Message returned for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed or conflicting input
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or missing identity
    #[error("{0}")]
    Authentication(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_credentials() -> Self {
        Self::Authentication(INVALID_CREDENTIALS.to_string())
    }

    pub fn authentication_required() -> Self {
        Self::Authentication("Authentication required".to_string())
    }

    /// Extension code following the Apollo error conventions
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "BAD_USER_INPUT",
            Self::Authentication(_) => "UNAUTHENTICATED",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let message = match self {
            Self::Validation(_) | Self::Authentication(_) => self.to_string(),
            Self::Database(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
        };
        let code = self.code();
        async_graphql::Error::new(message).extend_with(|_, e| e.set("code", code))
    }
}
