//! Request identity for GraphQL operations
//!
//! The HTTP layer classifies every request before execution and injects an
//! `AuthAttempt` into the request data. Resolvers never look at headers;
//! they ask the context for an identity and get the right error for free:
//! a missing credential on a protected operation is `AUTHENTICATION_REQUIRED`,
//! a supplied-but-bad credential is `INVALID_CREDENTIAL` even on operations
//! that would have allowed anonymous access.

use async_graphql::{Context, Result};
use uuid::Uuid;

use super::errors;

/// Verified caller identity, valid for the duration of one request
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Outcome of classifying a request's credential
#[derive(Debug, Clone, Default)]
pub enum AuthAttempt {
    /// No credential supplied
    #[default]
    Anonymous,
    /// Credential verified
    Verified(AuthUser),
    /// Credential supplied but rejected
    Invalid(String),
}

/// Extension trait to get the caller identity from the GraphQL context
pub trait AuthExt {
    /// Require a verified identity
    fn identity(&self) -> Result<AuthUser>;

    /// Allow anonymous callers, but still reject bad credentials
    fn identity_opt(&self) -> Result<Option<AuthUser>>;
}

impl AuthExt for Context<'_> {
    fn identity(&self) -> Result<AuthUser> {
        match self.data_opt::<AuthAttempt>() {
            Some(AuthAttempt::Verified(user)) => Ok(*user),
            Some(AuthAttempt::Invalid(reason)) => Err(errors::invalid_credential(reason)),
            Some(AuthAttempt::Anonymous) | None => Err(errors::authentication_required()),
        }
    }

    fn identity_opt(&self) -> Result<Option<AuthUser>> {
        match self.data_opt::<AuthAttempt>() {
            Some(AuthAttempt::Verified(user)) => Ok(Some(*user)),
            Some(AuthAttempt::Invalid(reason)) => Err(errors::invalid_credential(reason)),
            Some(AuthAttempt::Anonymous) | None => Ok(None),
        }
    }
}
