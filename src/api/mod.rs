//! API route definitions
//!
//! The primary API is GraphQL (see [crate::services::graphql]); the REST
//! surface is limited to liveness and readiness probes.

pub mod health;
