//! SQLite helper utilities for type conversion
//!
//! SQLite has no array or document column type; embedded collections are
//! stored as JSON text and timestamps as RFC 3339 text.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};

/// Get current UTC timestamp as ISO8601 string for SQLite
#[inline]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Serialize a slice to a JSON array string for SQLite storage
pub fn vec_to_json<T: Serialize>(v: &[T]) -> Result<String> {
    serde_json::to_string(v)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON encode error: {}", e)))
}

/// Deserialize a JSON array string from SQLite to a Vec.
/// Empty text reads as an empty list.
pub fn json_to_vec<T: DeserializeOwned>(s: &str) -> Result<Vec<T>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(s)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON parse error: {}", e)))
}

/// Whether a sqlx error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
