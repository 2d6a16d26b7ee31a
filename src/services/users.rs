//! Account flows: lookup, registration and login

use once_cell::sync::Lazy;
use regex::Regex;

use crate::db::{CreateUser, Database, UserRecord};
use crate::error::{AppError, Result};
use crate::services::auth::AuthService;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

/// Registration input. Every field is optional at the API edge and checked here.
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus the user it was issued for
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: UserRecord,
}

#[derive(Clone)]
pub struct UserService {
    db: Database,
    auth: AuthService,
}

impl UserService {
    pub fn new(db: Database, auth: AuthService) -> Self {
        Self { db, auth }
    }

    /// Look up one user by id OR username. Not-found is `None`, never an error.
    pub async fn get_user(
        &self,
        id: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<UserRecord>> {
        self.db.users().find_by_id_or_username(id, username).await
    }

    /// Create an account and sign a token for it
    pub async fn create_user(&self, input: RegisterInput) -> Result<AuthSession> {
        let username = required(input.username, "Username")?;
        let email = required(input.email, "Email")?;
        let password = input
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("Password is required"))?;

        if !EMAIL_RE.is_match(&email) {
            return Err(AppError::validation("Must use a valid email address"));
        }

        let users = self.db.users();
        if users.get_by_username(&username).await?.is_some() {
            return Err(AppError::validation("Username is already taken"));
        }
        if users.get_by_email(&email).await?.is_some() {
            return Err(AppError::validation("Email is already registered"));
        }

        let password_hash = self.auth.hash_password(&password)?;
        let user = users
            .create(CreateUser {
                username,
                email,
                password_hash,
            })
            .await?;

        let token = self.auth.issue_token(&user)?;
        Ok(AuthSession { token, user })
    }

    /// Authenticate by username or email. Unknown identifier and wrong
    /// password fail identically.
    pub async fn login_user(
        &self,
        username_or_email: Option<&str>,
        password: Option<&str>,
    ) -> Result<AuthSession> {
        let (Some(identifier), Some(password)) = (username_or_email, password) else {
            return Err(AppError::invalid_credentials());
        };

        let user = self
            .db
            .users()
            .find_by_username_or_email(identifier.trim())
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        if !self.auth.verify_password(password, &user.password_hash) {
            return Err(AppError::invalid_credentials());
        }

        let token = self.auth.issue_token(&user)?;
        Ok(AuthSession { token, user })
    }
}

/// Trimmed, non-empty value or a validation error naming the field
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::db::test_database;
    use crate::error::INVALID_CREDENTIALS;
    use crate::services::auth::test_auth_service;

    async fn service() -> UserService {
        UserService::new(test_database().await, test_auth_service())
    }

    fn ada() -> RegisterInput {
        RegisterInput {
            username: Some("ada".to_string()),
            email: Some("ada@x.com".to_string()),
            password: Some("secret".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_by_username() {
        let svc = service().await;
        let session = svc.create_user(ada()).await.unwrap();
        assert!(!session.token.is_empty());
        assert!(session.user.saved_books.is_empty());

        let found = svc.get_user(None, Some("ada")).await.unwrap().unwrap();
        assert_eq!(found.username, "ada");
        assert_eq!(found.email, "ada@x.com");
        assert_ne!(found.password_hash, "secret");
    }

    #[tokio::test]
    async fn test_create_trims_fields() {
        let svc = service().await;
        let session = svc
            .create_user(RegisterInput {
                username: Some("  ada ".to_string()),
                email: Some(" ada@x.com".to_string()),
                password: Some("secret".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(session.user.username, "ada");
        assert_eq!(session.user.email, "ada@x.com");
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let svc = service().await;
        for input in [
            RegisterInput { username: None, ..ada() },
            RegisterInput { email: Some("  ".to_string()), ..ada() },
            RegisterInput { password: Some(String::new()), ..ada() },
        ] {
            assert_matches!(svc.create_user(input).await, Err(AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_email() {
        let svc = service().await;
        let input = RegisterInput { email: Some("not-an-email".to_string()), ..ada() };
        assert_matches!(svc.create_user(input).await, Err(AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let svc = service().await;
        svc.create_user(ada()).await.unwrap();

        let same_name = RegisterInput { email: Some("other@x.com".to_string()), ..ada() };
        assert_matches!(svc.create_user(same_name).await, Err(AppError::Validation(_)));

        let same_mail = RegisterInput { username: Some("other".to_string()), ..ada() };
        assert_matches!(svc.create_user(same_mail).await, Err(AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let svc = service().await;
        let created = svc.create_user(ada()).await.unwrap();

        let by_name = svc.login_user(Some("ada"), Some("secret")).await.unwrap();
        let by_mail = svc.login_user(Some("ada@x.com"), Some("secret")).await.unwrap();
        assert_eq!(by_name.user.id, created.user.id);
        assert_eq!(by_mail.user.id, created.user.id);
        assert!(!by_name.token.is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let svc = service().await;
        svc.create_user(ada()).await.unwrap();

        let wrong_password = svc.login_user(Some("ada"), Some("nope")).await.unwrap_err();
        let unknown_user = svc.login_user(Some("grace"), Some("secret")).await.unwrap_err();
        let missing_args = svc.login_user(None, None).await.unwrap_err();

        for err in [wrong_password, unknown_user, missing_args] {
            assert_matches!(err, AppError::Authentication(msg) if msg == INVALID_CREDENTIALS);
        }
    }

    #[tokio::test]
    async fn test_get_user_without_arguments_is_none() {
        let svc = service().await;
        svc.create_user(ada()).await.unwrap();
        assert!(svc.get_user(None, None).await.unwrap().is_none());
    }
}
