//! Quillpad backend — GraphQL publishing service
//!
//! CRUD plus real-time subscriptions over users, posts, books, comments,
//! reviews, and file uploads. All operations are exposed via GraphQL at
//! /graphql; subscriptions ride a WebSocket at /graphql/ws.

pub mod config;
pub mod db;
pub mod graphql;
pub mod server;
pub mod services;
