use super::prelude::*;

#[derive(Default)]
pub struct BookMutations;

#[Object]
impl BookMutations {
    /// Add a book to the caller's saved list; saving an identical book again
    /// changes nothing
    ///
    /// Requires authentication.
    async fn save_book(
        &self,
        ctx: &Context<'_>,
        input: Option<SaveBookInput>,
    ) -> Result<Option<User>> {
        let user = ctx.auth_user()?;
        let books = ctx.data_unchecked::<SavedBooksService>();

        let updated = books
            .save_book(&user.user_id, input.unwrap_or_default().into())
            .await
            .map_err(|e| e.extend())?;
        Ok(updated.map(User::from))
    }

    /// Remove every book with `bookId` from the caller's saved list
    ///
    /// Requires authentication. Removing a book that is not saved is a no-op.
    async fn delete_book(
        &self,
        ctx: &Context<'_>,
        book_id: Option<String>,
    ) -> Result<Option<User>> {
        let user = ctx.auth_user()?;
        let books = ctx.data_unchecked::<SavedBooksService>();

        let updated = books
            .delete_book(&user.user_id, book_id)
            .await
            .map_err(|e| e.extend())?;
        Ok(updated.map(User::from))
    }
}
