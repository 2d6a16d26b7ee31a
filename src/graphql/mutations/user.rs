use super::prelude::*;

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Register a new account and return a token for it
    ///
    /// No authentication required.
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        input: Option<CreateUserInput>,
    ) -> Result<Option<AuthPayload>> {
        let users = ctx.data_unchecked::<UserService>();

        match users.create_user(input.unwrap_or_default().into()).await {
            Ok(session) => {
                tracing::info!(
                    user_id = %session.user.id,
                    username = %session.user.username,
                    "User created"
                );
                Ok(Some(AuthPayload {
                    token: Some(session.token),
                    user: Some(session.user.into()),
                }))
            }
            Err(e) => {
                tracing::warn!(error = %e, "User creation failed");
                Err(e.extend())
            }
        }
    }

    /// Authenticate with username or email and password
    ///
    /// No authentication required. Every failure reads "Invalid credentials".
    async fn login_user(
        &self,
        ctx: &Context<'_>,
        username_or_email: Option<String>,
        password: Option<String>,
    ) -> Result<Option<AuthPayload>> {
        let users = ctx.data_unchecked::<UserService>();

        match users
            .login_user(username_or_email.as_deref(), password.as_deref())
            .await
        {
            Ok(session) => {
                tracing::info!(
                    user_id = %session.user.id,
                    username = %session.user.username,
                    "User logged in"
                );
                Ok(Some(AuthPayload {
                    token: Some(session.token),
                    user: Some(session.user.into()),
                }))
            }
            Err(e) => {
                tracing::warn!(
                    username_or_email = ?username_or_email,
                    error = %e,
                    "Login failed"
                );
                Err(e.extend())
            }
        }
    }
}
