pub mod user;

pub use user::UserQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, ErrorExtensions, ID, Object, Result};

    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::UserService;
}
