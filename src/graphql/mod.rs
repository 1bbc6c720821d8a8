//! GraphQL API with subscriptions for real-time updates
//!
//! Single API surface: queries, mutations, and WebSocket subscriptions,
//! served by axum at /graphql and /graphql/ws.

pub mod auth;
pub mod errors;
pub mod helpers;
pub mod mutations;
pub mod pagination;
pub mod queries;
mod schema;
mod subscriptions;
pub mod types;

pub use auth::{AuthAttempt, AuthExt, AuthUser};
pub use schema::{MutationRoot, QueryRoot, QuillpadSchema, build_schema};
pub use subscriptions::SubscriptionRoot;
