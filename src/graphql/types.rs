//! GraphQL object and input types
//!
//! Field names and nullability follow the published schema, so every
//! output field is nullable even when the stored value never is.

use async_graphql::{ID, InputObject, Object, SimpleObject};

use crate::db::{SavedBook, UserRecord};
use crate::services::saved_books::BookInput;
use crate::services::users::RegisterInput;

// ============================================================================
// Output Types
// ============================================================================

/// A user account. The password hash is never exposed.
pub struct User(pub UserRecord);

#[Object]
impl User {
    #[graphql(name = "_id")]
    async fn id(&self) -> Option<ID> {
        Some(ID(self.0.id.clone()))
    }

    async fn username(&self) -> Option<&str> {
        Some(&self.0.username)
    }

    async fn email(&self) -> Option<&str> {
        Some(&self.0.email)
    }

    /// Books saved by this user, in the order they were saved
    async fn saved_books(&self) -> Option<Vec<Option<Book>>> {
        Some(
            self.0
                .saved_books
                .iter()
                .cloned()
                .map(|b| Some(Book(b)))
                .collect(),
        )
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self(record)
    }
}

/// A book embedded in a user's saved list
pub struct Book(pub SavedBook);

#[Object]
impl Book {
    async fn book_id(&self) -> Option<&str> {
        Some(&self.0.book_id)
    }

    async fn title(&self) -> Option<&str> {
        Some(&self.0.title)
    }

    async fn authors(&self) -> Option<Vec<Option<&str>>> {
        Some(self.0.authors.iter().map(|a| Some(a.as_str())).collect())
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn image(&self) -> Option<&str> {
        self.0.image.as_deref()
    }

    async fn link(&self) -> Option<&str> {
        self.0.link.as_deref()
    }
}

/// Signed token and the user it identifies
#[derive(SimpleObject)]
pub struct AuthPayload {
    pub token: Option<String>,
    pub user: Option<User>,
}

// ============================================================================
// Input Types
// ============================================================================

#[derive(Debug, Default, InputObject)]
pub struct CreateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<CreateUserInput> for RegisterInput {
    fn from(input: CreateUserInput) -> Self {
        Self {
            username: input.username,
            email: input.email,
            password: input.password,
        }
    }
}

#[derive(Debug, Default, InputObject)]
pub struct SaveBookInput {
    pub book_id: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Vec<Option<String>>>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

impl From<SaveBookInput> for BookInput {
    fn from(input: SaveBookInput) -> Self {
        Self {
            book_id: input.book_id,
            title: input.title,
            // null entries carry no author
            authors: input.authors.map(|a| a.into_iter().flatten().collect()),
            description: input.description,
            image: input.image,
            link: input.link,
        }
    }
}
