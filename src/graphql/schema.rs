//! GraphQL schema assembly
//!
//! Query and mutation roots are merged from the per-domain structs under
//! `queries/` and `mutations/`. Everything resolvers need (database,
//! change notifier, token codec, blob storage) is injected as schema data;
//! the per-request identity is injected by the HTTP layer.

use std::sync::Arc;

use async_graphql::{MergedObject, Schema};

use crate::db::Database;
use crate::services::{ChangeNotifier, StorageService, TokenCodec};

use super::mutations::{
    BookMutations, CommentMutations, FileMutations, PostMutations, ReviewMutations, UserMutations,
};
use super::queries::{
    BookQueries, CommentQueries, PostQueries, ReviewQueries, SearchQueries, UserQueries,
};
use super::subscriptions::SubscriptionRoot;

/// The GraphQL schema type
pub type QuillpadSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    UserQueries,
    PostQueries,
    BookQueries,
    CommentQueries,
    ReviewQueries,
    SearchQueries,
);

#[derive(MergedObject, Default)]
pub struct MutationRoot(
    UserMutations,
    PostMutations,
    BookMutations,
    CommentMutations,
    ReviewMutations,
    FileMutations,
);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(
    db: Database,
    notifier: Arc<ChangeNotifier>,
    codec: TokenCodec,
    storage: StorageService,
) -> QuillpadSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        SubscriptionRoot,
    )
    .data(db)
    .data(notifier)
    .data(codec)
    .data(storage)
    .finish()
}
