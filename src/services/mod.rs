//! Application services: domain logic plus the lifecycle-managed runtime pieces

pub mod auth;
pub mod database;
pub mod graphql;
pub mod http_server;
pub mod manager;
pub mod saved_books;
pub mod users;

pub use auth::{AuthConfig, AuthService, TokenClaims};
pub use database::{DatabaseService, DatabaseServiceConfig};
pub use graphql::GraphqlService;
pub use http_server::HttpServerService;
pub use manager::{HealthStatus, Service, ServiceHealth, ServicesManager};
pub use saved_books::{BookInput, SavedBooksService};
pub use users::{AuthSession, RegisterInput, UserService};
