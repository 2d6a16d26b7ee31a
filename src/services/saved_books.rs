//! Saved book list flows for the authenticated user

use crate::db::{Database, SavedBook, UserRecord};
use crate::error::{AppError, Result};
use crate::services::users::required;

/// Book as submitted by a client, before validation
#[derive(Debug, Clone, Default)]
pub struct BookInput {
    pub book_id: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

impl TryFrom<BookInput> for SavedBook {
    type Error = AppError;

    fn try_from(input: BookInput) -> Result<Self> {
        Ok(SavedBook {
            book_id: required(input.book_id, "bookId")?,
            title: required(input.title, "title")?,
            authors: input.authors.unwrap_or_default(),
            description: input.description,
            image: input.image,
            link: input.link,
        })
    }
}

#[derive(Clone)]
pub struct SavedBooksService {
    db: Database,
}

impl SavedBooksService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add a book to the user's list unless an identical entry exists.
    /// `None` when the user record is gone.
    pub async fn save_book(&self, user_id: &str, input: BookInput) -> Result<Option<UserRecord>> {
        let book = SavedBook::try_from(input)?;
        let user = self.db.users().add_saved_book(user_id, &book).await?;
        tracing::debug!(user_id = %user_id, book_id = %book.book_id, "Book saved");
        Ok(user)
    }

    /// Remove every entry with `book_id` from the user's list. Removing an
    /// absent id is a no-op.
    pub async fn delete_book(
        &self,
        user_id: &str,
        book_id: Option<String>,
    ) -> Result<Option<UserRecord>> {
        let book_id = required(book_id, "bookId")?;
        let user = self.db.users().remove_saved_books(user_id, &book_id).await?;
        tracing::debug!(user_id = %user_id, book_id = %book_id, "Book removed");
        Ok(user)
    }
}
