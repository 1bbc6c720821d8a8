//! GraphQL subscriptions for real-time change events
//!
//! Each subscription wraps a receiver on the change notifier's topic and
//! filter-maps raw bus events into typed payloads. Streams start at
//! subscription time (no replay) and end when the client disconnects.

use std::sync::Arc;

use async_graphql::{Context, ID, Result, Subscription};
use futures::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::db::Database;
use crate::graphql::auth::AuthExt;
use crate::graphql::errors;
use crate::graphql::helpers::parse_id;
use crate::graphql::types::{BookEvent, CommentEvent, PostEvent, ReviewEvent, UserEvent};
use crate::services::{ChangeNode, ChangeNotifier, Topic};

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Published-post changes
    async fn post<'ctx>(&self, ctx: &Context<'ctx>) -> impl Stream<Item = PostEvent> + 'ctx {
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        BroadcastStream::new(notifier.subscribe(Topic::Post)).filter_map(|result| {
            result.ok().and_then(|event| match event.node {
                ChangeNode::Post(record) => Some(PostEvent {
                    mutation: event.mutation.into(),
                    node: record.into(),
                }),
                _ => None,
            })
        })
    }

    /// Published-comment changes. The post must exist when subscribing;
    /// events for every post are delivered.
    async fn comment<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        post_id: ID,
    ) -> Result<impl Stream<Item = CommentEvent> + 'ctx> {
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let post_id =
            parse_id(&post_id).ok_or_else(|| errors::validation_failure("Invalid post id"))?;
        db.posts()
            .find_by_id(post_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(|| errors::validation_failure("Post does not exist"))?;

        Ok(
            BroadcastStream::new(notifier.subscribe(Topic::Comment)).filter_map(|result| {
                result.ok().and_then(|event| match event.node {
                    ChangeNode::Comment(record) => Some(CommentEvent {
                        mutation: event.mutation.into(),
                        node: record.into(),
                    }),
                    _ => None,
                })
            }),
        )
    }

    /// Published-book changes
    async fn book<'ctx>(&self, ctx: &Context<'ctx>) -> impl Stream<Item = BookEvent> + 'ctx {
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        BroadcastStream::new(notifier.subscribe(Topic::Book)).filter_map(|result| {
            result.ok().and_then(|event| match event.node {
                ChangeNode::Book(record) => Some(BookEvent {
                    mutation: event.mutation.into(),
                    node: record.into(),
                }),
                _ => None,
            })
        })
    }

    /// Published-review changes. The book must exist when subscribing;
    /// events for every book are delivered.
    async fn review<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        book_id: ID,
    ) -> Result<impl Stream<Item = ReviewEvent> + 'ctx> {
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let book_id =
            parse_id(&book_id).ok_or_else(|| errors::validation_failure("Invalid book id"))?;
        db.books()
            .find_by_id(book_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(|| errors::validation_failure("Book does not exist"))?;

        Ok(
            BroadcastStream::new(notifier.subscribe(Topic::Review)).filter_map(|result| {
                result.ok().and_then(|event| match event.node {
                    ChangeNode::Review(record) => Some(ReviewEvent {
                        mutation: event.mutation.into(),
                        node: record.into(),
                    }),
                    _ => None,
                })
            }),
        )
    }

    /// Account changes; only available to signed-in clients
    async fn user<'ctx>(&self, ctx: &Context<'ctx>) -> Result<impl Stream<Item = UserEvent> + 'ctx> {
        ctx.identity()?;
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        Ok(
            BroadcastStream::new(notifier.subscribe(Topic::User)).filter_map(|result| {
                result.ok().and_then(|event| match event.node {
                    ChangeNode::User(record) => Some(UserEvent {
                        mutation: event.mutation.into(),
                        node: record.into(),
                    }),
                    _ => None,
                })
            }),
        )
    }
}
