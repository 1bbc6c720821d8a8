pub mod books;
pub mod comments;
pub mod files;
pub mod posts;
pub mod reviews;
pub mod users;

pub use books::BookMutations;
pub use comments::CommentMutations;
pub use files::FileMutations;
pub use posts::PostMutations;
pub use reviews::ReviewMutations;
pub use users::UserMutations;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, ID, InputObject, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::AuthExt;
    pub(crate) use crate::graphql::errors;
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::{ChangeNotifier, MutationKind};
}
