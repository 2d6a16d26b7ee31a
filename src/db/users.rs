//! Users repository
//!
//! A user row embeds its saved books as a JSON array in `saved_books`.
//! Changes to that array go through a compare-and-swap on the previous
//! document so concurrent writers never lose each other's updates.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::sqlite_helpers::{is_unique_violation, json_to_vec, now_iso8601, vec_to_json};
use crate::error::{AppError, Result};

/// Attempts made by [UsersRepository::update_saved_books] before giving up
const MAX_SAVED_BOOKS_ATTEMPTS: usize = 16;

// ============================================================================
// Records
// ============================================================================

/// A book embedded in a user's saved list. Equality is over every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedBook {
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub saved_books: Vec<SavedBook>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

type UserRow = (String, String, String, String, String, String, String);

const USER_COLUMNS: &str =
    "id, username, email, password_hash, saved_books, created_at, updated_at";

fn row_to_record(r: UserRow) -> Result<UserRecord> {
    Ok(UserRecord {
        id: r.0,
        username: r.1,
        email: r.2,
        password_hash: r.3,
        saved_books: json_to_vec(&r.4)?,
        created_at: r.5,
        updated_at: r.6,
    })
}

// ============================================================================
// Repository
// ============================================================================

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user with an empty saved list.
    /// A clash on username or email is a validation error naming the field.
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, saved_books, created_at, updated_at)
            VALUES (?, ?, ?, ?, '[]', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                let message = e.to_string();
                if message.contains("users.email") {
                    AppError::validation("Email is already registered")
                } else {
                    AppError::validation("Username is already taken")
                }
            } else {
                AppError::Database(e)
            }
        })?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        self.fetch_one_where("id = ?", &[id]).await
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.fetch_one_where("username = ?", &[username]).await
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.fetch_one_where("email = ?", &[email]).await
    }

    /// First user whose id OR username matches. Absent keys take no part
    /// in the match; with both absent nothing matches.
    pub async fn find_by_id_or_username(
        &self,
        id: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<UserRecord>> {
        match (id, username) {
            (Some(id), Some(username)) => {
                self.fetch_one_where("id = ? OR username = ?", &[id, username])
                    .await
            }
            (Some(id), None) => self.get_by_id(id).await,
            (None, Some(username)) => self.get_by_username(username).await,
            (None, None) => Ok(None),
        }
    }

    /// First user whose username OR email equals `identifier`
    pub async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<UserRecord>> {
        self.fetch_one_where("username = ? OR email = ?", &[identifier, identifier])
            .await
    }

    /// Add `book` unless an identical entry is already saved.
    /// Returns `None` when the user does not exist.
    pub async fn add_saved_book(&self, user_id: &str, book: &SavedBook) -> Result<Option<UserRecord>> {
        self.update_saved_books(user_id, |books| {
            if books.contains(book) {
                false
            } else {
                books.push(book.clone());
                true
            }
        })
        .await
    }

    /// Remove every saved entry with `book_id`.
    /// Returns `None` when the user does not exist.
    pub async fn remove_saved_books(&self, user_id: &str, book_id: &str) -> Result<Option<UserRecord>> {
        self.update_saved_books(user_id, |books| {
            let before = books.len();
            books.retain(|b| b.book_id != book_id);
            books.len() != before
        })
        .await
    }

    /// Apply `change` to the saved list and write it back if it reports a change.
    ///
    /// The write only lands when `saved_books` still holds the document the change
    /// was computed from; otherwise the row is re-read and the change re-applied.
    async fn update_saved_books<F>(&self, user_id: &str, change: F) -> Result<Option<UserRecord>>
    where
        F: Fn(&mut Vec<SavedBook>) -> bool,
    {
        for attempt in 1..=MAX_SAVED_BOOKS_ATTEMPTS {
            let current: Option<(String,)> =
                sqlx::query_as("SELECT saved_books FROM users WHERE id = ?")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;

            let Some((previous,)) = current else {
                return Ok(None);
            };

            let mut books: Vec<SavedBook> = json_to_vec(&previous)?;
            if !change(&mut books) {
                return self.get_by_id(user_id).await;
            }

            let result = sqlx::query(
                "UPDATE users SET saved_books = ?, updated_at = ? WHERE id = ? AND saved_books = ?",
            )
            .bind(vec_to_json(&books)?)
            .bind(now_iso8601())
            .bind(user_id)
            .bind(&previous)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() > 0 {
                return self.get_by_id(user_id).await;
            }

            tracing::debug!(user_id = %user_id, attempt, "Saved books changed concurrently, retrying");
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "Saved books for user {} kept changing; gave up after {} attempts",
            user_id,
            MAX_SAVED_BOOKS_ATTEMPTS
        )))
    }

    async fn fetch_one_where(&self, condition: &str, binds: &[&str]) -> Result<Option<UserRecord>> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} ORDER BY created_at LIMIT 1",
            USER_COLUMNS, condition
        );
        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.map(row_to_record).transpose()
    }
}
