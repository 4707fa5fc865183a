//! Environment variable parsing utilities
//!
//! Parse-with-fallback helpers shared by service configuration loaders.

use std::str::FromStr;

/// Parse an environment variable with a default fallback.
///
/// Missing and unparsable values both yield the default.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, `None` if missing or invalid.
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a string variable, treating blank values as unset.
pub fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
