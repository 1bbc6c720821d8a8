//! Application services sitting between the GraphQL layer and the database

pub mod auth;
pub mod notifier;
pub mod storage;

pub use auth::{AuthPayload, AuthService, TokenCodec};
pub use notifier::{ChangeEvent, ChangeNode, ChangeNotifier, MutationKind, Topic};
pub use storage::{StorageService, StoredBlob};
