//! GraphQL error constructors with machine-readable `code` extensions
//!
//! Every error surfaced to a caller carries one of four codes. Not-found
//! and forbidden are deliberately the same error so ownership checks never
//! reveal whether a record exists.

use async_graphql::{Error, ErrorExtensions};

pub fn authentication_required() -> Error {
    Error::new("Authentication required")
        .extend_with(|_, e| e.set("code", "AUTHENTICATION_REQUIRED"))
}

pub fn invalid_credential(reason: impl Into<String>) -> Error {
    Error::new(reason.into()).extend_with(|_, e| e.set("code", "INVALID_CREDENTIAL"))
}

pub fn not_found_or_forbidden() -> Error {
    Error::new("Record not found").extend_with(|_, e| e.set("code", "NOT_FOUND_OR_FORBIDDEN"))
}

pub fn validation_failure(message: impl Into<String>) -> Error {
    Error::new(message.into()).extend_with(|_, e| e.set("code", "VALIDATION_FAILURE"))
}
