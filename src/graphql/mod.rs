//! GraphQL API
//!
//! The single API surface for account and saved-book operations, built
//! with async-graphql. Resolvers are grouped per domain in `queries/` and
//! `mutations/` and merged into the roots in `schema.rs`.

pub mod auth;
pub mod mutations;
pub mod queries;
mod schema;
pub mod types;

pub use auth::{AuthUser, authenticate};
pub use schema::{BookshelfSchema, MutationRoot, QueryRoot, build_schema};
