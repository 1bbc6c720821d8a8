// Helper functions shared across GraphQL query/mutation modules.

use async_graphql::ID;
use uuid::Uuid;

use crate::db::{BookRecord, CommentRecord, PostRecord, ReviewRecord, UserRecord};
use crate::services::{ChangeEvent, ChangeNode, ChangeNotifier, MutationKind, Topic};

/// Parse a GraphQL ID into a record id; None when it is not a UUID
pub(crate) fn parse_id(id: &ID) -> Option<Uuid> {
    Uuid::parse_str(id.as_str()).ok()
}

/// Publish a user event. User records have no published flag, so every
/// mutation is announced.
pub(crate) fn notify_user(notifier: &ChangeNotifier, mutation: MutationKind, record: &UserRecord) {
    notifier.publish(
        Topic::User,
        ChangeEvent {
            mutation,
            node: ChangeNode::User(record.clone()),
        },
    );
}

/// Publish a post event iff the record is published
pub(crate) fn notify_post(notifier: &ChangeNotifier, mutation: MutationKind, record: &PostRecord) {
    if record.published {
        notifier.publish(
            Topic::Post,
            ChangeEvent {
                mutation,
                node: ChangeNode::Post(record.clone()),
            },
        );
    }
}

/// Publish a book event iff the record is published
pub(crate) fn notify_book(notifier: &ChangeNotifier, mutation: MutationKind, record: &BookRecord) {
    if record.published {
        notifier.publish(
            Topic::Book,
            ChangeEvent {
                mutation,
                node: ChangeNode::Book(record.clone()),
            },
        );
    }
}

/// Publish a comment event iff the record is published
pub(crate) fn notify_comment(
    notifier: &ChangeNotifier,
    mutation: MutationKind,
    record: &CommentRecord,
) {
    if record.published {
        notifier.publish(
            Topic::Comment,
            ChangeEvent {
                mutation,
                node: ChangeNode::Comment(record.clone()),
            },
        );
    }
}

/// Publish a review event iff the record is published
pub(crate) fn notify_review(
    notifier: &ChangeNotifier,
    mutation: MutationKind,
    record: &ReviewRecord,
) {
    if record.published {
        notifier.publish(
            Topic::Review,
            ChangeEvent {
                mutation,
                node: ChangeNode::Review(record.clone()),
            },
        );
    }
}
