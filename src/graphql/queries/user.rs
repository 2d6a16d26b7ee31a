use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// Find one user by id or username. Null when nothing matches or
    /// neither argument is given.
    async fn get_user(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        username: Option<String>,
    ) -> Result<Option<User>> {
        let users = ctx.data_unchecked::<UserService>();
        let found = users
            .get_user(id.as_ref().map(|i| i.as_str()), username.as_deref())
            .await
            .map_err(|e| e.extend())?;
        Ok(found.map(User::from))
    }
}
