//! SQLite helper utilities for type conversion
//!
//! SQLite doesn't natively support UUIDs, booleans, or timestamps. This
//! module converts between Rust types and the TEXT/INTEGER representations
//! the schema uses.

use anyhow::{Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

// ============================================================================
// UUID Helpers
// ============================================================================

/// Convert a UUID to a SQLite-compatible string
#[inline]
pub fn uuid_to_str(id: Uuid) -> String {
    id.to_string()
}

/// Parse a SQLite string back to a UUID
#[inline]
pub fn str_to_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| anyhow!("Invalid UUID '{}': {}", s, e))
}

/// Parse an optional SQLite string to an optional UUID
#[inline]
pub fn str_to_uuid_opt(s: Option<&str>) -> Result<Option<Uuid>> {
    match s {
        Some(s) => Ok(Some(str_to_uuid(s)?)),
        None => Ok(None),
    }
}

// ============================================================================
// Timestamp Helpers (stored as RFC 3339 TEXT in SQLite)
// ============================================================================

/// Get current UTC timestamp as a SQLite-compatible string.
///
/// Fixed-width microsecond precision with a `Z` suffix, so lexicographic
/// TEXT comparison in SQL agrees with chronological ordering. The
/// pagination engine relies on this.
#[inline]
pub fn now_timestamp() -> String {
    datetime_to_str(Utc::now())
}

/// Convert a chrono DateTime to the stored TEXT format
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored TEXT timestamp back to a DateTime
#[inline]
pub fn str_to_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("Invalid datetime '{}': {}", s, e))
}

// ============================================================================
// LIKE Pattern Helpers
// ============================================================================

/// Escape LIKE metacharacters in a search term.
///
/// The result is safe to embed between `%` anchors in a pattern bound to a
/// `LIKE ? ESCAPE '\'` clause; a literal `%` or `_` in the term matches
/// itself instead of acting as a wildcard.
#[inline]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ============================================================================
// Boolean Helpers (SQLite uses 0/1 integers)
// ============================================================================

/// Convert bool to SQLite integer (0 or 1)
#[inline]
pub fn bool_to_int(b: bool) -> i32 {
    if b { 1 } else { 0 }
}

/// Convert SQLite integer to bool
#[inline]
pub fn int_to_bool(i: i32) -> bool {
    i != 0
}
