//! SQL dialect differences between supported backends.
//!
//! Query templates are written once with Postgres-style `$n` placeholders
//! and a `{coalesce}` marker for the null-coalescing function. Anything
//! more involved has to be written out per backend.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::DbBackend;

/// Positional parameter placeholder, `$1`, `$2`, ...
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)").expect("invalid regex string"));

/// Marker substituted with the backend's null-coalescing function.
const COALESCE_MARKER: &str = "{coalesce}";

/// Rewrite `$n` placeholders into the form expected by `backend`.
pub fn rewrite_placeholders(backend: DbBackend, sql: &str) -> Cow<'_, str> {
    match backend {
        DbBackend::Postgres => Cow::Borrowed(sql),
        DbBackend::Sqlite => PLACEHOLDER_REGEX.replace_all(sql, "?$1"),
        DbBackend::MySql => PLACEHOLDER_REGEX.replace_all(sql, "?"),
    }
}

/// Null-coalescing function name for `backend`.
pub fn coalesce(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "COALESCE",
        DbBackend::Sqlite | DbBackend::MySql => "IFNULL",
    }
}

/// Produce backend-specific SQL from a query template.
pub fn render(backend: DbBackend, template: &str) -> String {
    rewrite_placeholders(backend, &template.replace(COALESCE_MARKER, coalesce(backend)))
        .into_owned()
}
