//! Bookshelf: a GraphQL backend for user accounts and their saved books.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
