pub mod books;
pub mod comments;
pub mod posts;
pub mod reviews;
pub mod search;
pub mod users;

pub use books::BookQueries;
pub use comments::CommentQueries;
pub use posts::PostQueries;
pub use reviews::ReviewQueries;
pub use search::SearchQueries;
pub use users::UserQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, ID, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::AuthExt;
    pub(crate) use crate::graphql::errors;
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::pagination::PageArgs;
    pub(crate) use crate::graphql::types::*;
}
