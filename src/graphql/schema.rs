//! GraphQL schema definition
//!
//! Query and mutation roots merge the per-domain resolver sets; field
//! dispatch is fixed when the schema is built at startup.

use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::db::Database;
use crate::services::auth::AuthService;
use crate::services::{SavedBooksService, UserService};

use super::mutations::{BookMutations, UserMutations};
use super::queries::UserQueries;

/// The GraphQL schema type
pub type BookshelfSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(UserQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(UserMutations, BookMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(db: Database, auth: AuthService) -> BookshelfSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(UserService::new(db.clone(), auth))
        .data(SavedBooksService::new(db))
        .extension(async_graphql::extensions::Tracing)
        .finish()
}

#[cfg(test)]
mod tests {
    use async_graphql::{Request, Response, Variables};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::db::test_database;
    use crate::graphql::auth::AuthUser;
    use crate::services::auth::test_auth_service;

    const CREATE_USER: &str = r#"
        mutation($input: CreateUserInput) {
            createUser(input: $input) {
                token
                user { _id username email savedBooks { bookId } }
            }
        }
    "#;

    const LOGIN_USER: &str = r#"
        mutation($who: String, $password: String) {
            loginUser(usernameOrEmail: $who, password: $password) { token user { username } }
        }
    "#;

    const SAVE_BOOK: &str = r#"
        mutation($input: SaveBookInput) {
            saveBook(input: $input) { username savedBooks { bookId title authors description } }
        }
    "#;

    const DELETE_BOOK: &str = r#"
        mutation($bookId: String) {
            deleteBook(bookId: $bookId) { savedBooks { bookId title } }
        }
    "#;

    async fn schema() -> BookshelfSchema {
        build_schema(test_database().await, test_auth_service())
    }

    async fn run(schema: &BookshelfSchema, query: &str, vars: Value, user: Option<AuthUser>) -> Response {
        let mut request = Request::new(query).variables(Variables::from_json(vars));
        if let Some(user) = user {
            request = request.data(user);
        }
        schema.execute(request).await
    }

    fn data(response: Response) -> Value {
        assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
        response.data.into_json().unwrap()
    }

    fn error_code(response: &Response) -> String {
        let err = response.errors.first().expect("an error");
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .expect("code extension");
        match code {
            async_graphql::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    async fn create_ada(schema: &BookshelfSchema) -> AuthUser {
        let body = data(
            run(
                schema,
                CREATE_USER,
                json!({"input": {"username": "ada", "email": "ada@x.com", "password": "secret"}}),
                None,
            )
            .await,
        );
        let user = &body["createUser"]["user"];
        AuthUser {
            user_id: user["_id"].as_str().unwrap().to_string(),
            username: "ada".to_string(),
            email: "ada@x.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sdl_matches_published_schema() {
        let sdl = schema().await.sdl();
        for line in [
            "_id: ID",
            "savedBooks: [Book]",
            "authors: [String]",
            "getUser(id: ID, username: String): User",
            "createUser(input: CreateUserInput): AuthPayload",
            "loginUser(usernameOrEmail: String, password: String): AuthPayload",
            "saveBook(input: SaveBookInput): User",
            "deleteBook(bookId: String): User",
        ] {
            assert!(sdl.contains(line), "missing `{}` in:\n{}", line, sdl);
        }
        assert!(!sdl.contains("password_hash") && !sdl.contains("passwordHash"));
    }

    #[tokio::test]
    async fn test_create_then_get_user() {
        let schema = schema().await;
        let body = data(
            run(
                &schema,
                CREATE_USER,
                json!({"input": {"username": "ada", "email": "ada@x.com", "password": "secret"}}),
                None,
            )
            .await,
        );
        let payload = &body["createUser"];
        assert!(payload["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(payload["user"]["username"], "ada");
        assert_eq!(payload["user"]["savedBooks"], json!([]));

        let body = data(
            run(
                &schema,
                "query($u: String) { getUser(username: $u) { username email } }",
                json!({"u": "ada"}),
                None,
            )
            .await,
        );
        assert_eq!(body, json!({"getUser": {"username": "ada", "email": "ada@x.com"}}));
    }

    #[tokio::test]
    async fn test_get_user_misses_are_null() {
        let schema = schema().await;
        create_ada(&schema).await;

        let body = data(run(&schema, "{ getUser { username } }", json!({}), None).await);
        assert_eq!(body, json!({"getUser": null}));

        let body = data(run(&schema, r#"{ getUser(username: "nobody") { username } }"#, json!({}), None).await);
        assert_eq!(body, json!({"getUser": null}));
    }

    #[tokio::test]
    async fn test_create_user_validation_error() {
        let schema = schema().await;
        let response = run(&schema, CREATE_USER, json!({"input": {"username": "ada"}}), None).await;
        assert_eq!(error_code(&response), "BAD_USER_INPUT");

        create_ada(&schema).await;
        let response = run(
            &schema,
            CREATE_USER,
            json!({"input": {"username": "ada", "email": "new@x.com", "password": "pw"}}),
            None,
        )
        .await;
        assert_eq!(error_code(&response), "BAD_USER_INPUT");
    }

    #[tokio::test]
    async fn test_login_user() {
        let schema = schema().await;
        create_ada(&schema).await;

        let body = data(run(&schema, LOGIN_USER, json!({"who": "ada@x.com", "password": "secret"}), None).await);
        assert_eq!(body["loginUser"]["user"]["username"], "ada");
        assert!(body["loginUser"]["token"].is_string());

        let wrong_password = run(&schema, LOGIN_USER, json!({"who": "ada", "password": "nope"}), None).await;
        let unknown_user = run(&schema, LOGIN_USER, json!({"who": "bob", "password": "secret"}), None).await;
        for response in [wrong_password, unknown_user] {
            assert_eq!(response.errors[0].message, "Invalid credentials");
            assert_eq!(error_code(&response), "UNAUTHENTICATED");
        }
    }

    #[tokio::test]
    async fn test_book_list_scenario() {
        let schema = schema().await;
        let ada = create_ada(&schema).await;
        let book = json!({"input": {"bookId": "b1", "title": "T"}});

        let body = data(run(&schema, SAVE_BOOK, book.clone(), Some(ada.clone())).await);
        assert_eq!(
            body["saveBook"]["savedBooks"],
            json!([{"bookId": "b1", "title": "T", "authors": [], "description": null}])
        );

        // Saving the same book again keeps one copy
        let body = data(run(&schema, SAVE_BOOK, book, Some(ada.clone())).await);
        assert_eq!(body["saveBook"]["savedBooks"].as_array().unwrap().len(), 1);

        let body = data(run(&schema, DELETE_BOOK, json!({"bookId": "b1"}), Some(ada.clone())).await);
        assert_eq!(body, json!({"deleteBook": {"savedBooks": []}}));

        let body = data(run(&schema, DELETE_BOOK, json!({"bookId": "b1"}), Some(ada)).await);
        assert_eq!(body, json!({"deleteBook": {"savedBooks": []}}));
    }

    #[tokio::test]
    async fn test_save_book_authors_keep_order() {
        let schema = schema().await;
        let ada = create_ada(&schema).await;
        let body = data(
            run(
                &schema,
                SAVE_BOOK,
                json!({"input": {"bookId": "b2", "title": "Notes", "authors": ["A", null, "B"]}}),
                Some(ada),
            )
            .await,
        );
        assert_eq!(body["saveBook"]["savedBooks"][0]["authors"], json!(["A", "B"]));
    }

    #[tokio::test]
    async fn test_save_book_requires_title() {
        let schema = schema().await;
        let ada = create_ada(&schema).await;
        let response = run(&schema, SAVE_BOOK, json!({"input": {"bookId": "b1"}}), Some(ada)).await;
        assert_eq!(error_code(&response), "BAD_USER_INPUT");
    }

    #[tokio::test]
    async fn test_book_mutations_require_identity() {
        let schema = schema().await;
        let save = run(&schema, SAVE_BOOK, json!({"input": {"bookId": "b1", "title": "T"}}), None).await;
        let delete = run(&schema, DELETE_BOOK, json!({"bookId": "b1"}), None).await;
        for response in [save, delete] {
            assert_eq!(error_code(&response), "UNAUTHENTICATED");
        }
    }

    #[tokio::test]
    async fn test_book_mutations_for_vanished_user_are_null() {
        let schema = schema().await;
        let ghost = AuthUser {
            user_id: "ghost".to_string(),
            username: "ghost".to_string(),
            email: "ghost@x.com".to_string(),
        };
        let body = data(run(&schema, DELETE_BOOK, json!({"bookId": "b1"}), Some(ghost)).await);
        assert_eq!(body, json!({"deleteBook": null}));
    }
}
