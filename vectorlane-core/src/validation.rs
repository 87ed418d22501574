//! Shared validation rules applied by every request builder.
//!
//! Names of collections, partitions, fields, indexes and aliases all follow the
//! same rule: 1 to 255 characters, starting with a letter or underscore and
//! containing only letters, digits and underscores. Numeric fields are checked
//! against inclusive ranges. All checks run inside `build()`, never in setters.

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Maximum length of any name-bearing field.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum number of shards a collection may be created with.
pub const MAX_SHARDS: u32 = 256;

/// Shard count used when none is given.
pub const DEFAULT_SHARDS: u32 = 2;

/// Replica count used when none is given.
pub const DEFAULT_REPLICAS: u32 = 1;

/// Smallest allowed vector dimension.
pub const MIN_DIMENSION: u32 = 1;

/// Largest allowed vector dimension.
pub const MAX_DIMENSION: u32 = 32768;

/// Largest allowed `max_length` of a VarChar field.
pub const MAX_VARCHAR_LENGTH: u32 = 255;

/// Pattern every name must match.
pub const NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]{0,254}$";

fn name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| Regex::new(NAME_PATTERN).expect("NAME_PATTERN is a valid regex"))
}

/// Returns true if `value` is a well-formed name.
///
/// # Example
///
/// ```
/// use vectorlane_core::validation::is_valid_name;
///
/// assert!(is_valid_name("_books_2024"));
/// assert!(!is_valid_name("1abc"));
/// assert!(!is_valid_name(""));
/// ```
#[inline]
pub fn is_valid_name(value: &str) -> bool {
    name_regex().is_match(value)
}

/// Checks a name-bearing field and reports which rule it breaks.
pub fn check_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }

    let len = value.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(Error::validation(
            field,
            format!("length {} exceeds {} characters", len, MAX_NAME_LENGTH),
        ));
    }

    if is_valid_name(value) {
        return Ok(());
    }

    // Regex rejected it; work out which character rule failed for the message.
    let mut chars = value.chars();
    if let Some(first) = chars.next() {
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(Error::validation(
                field,
                format!("must start with a letter or underscore, found {:?}", first),
            ));
        }
    }
    let bad = chars
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        .unwrap_or('?');
    Err(Error::validation(
        field,
        format!(
            "may only contain letters, digits and underscores, found {:?}",
            bad
        ),
    ))
}

/// Checks a name that is allowed to be absent.
pub fn check_optional_name(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => check_name(field, value),
        None => Ok(()),
    }
}

/// Unwraps a required builder field or fails with a validation error.
pub fn require<'a, T>(field: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| Error::validation(field, "is required"))
}

/// Checks that `value` falls within `range` (inclusive on both ends).
pub fn check_range<T>(field: &str, value: T, range: RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::validation(
            field,
            format!(
                "{} is out of range [{}, {}]",
                value,
                range.start(),
                range.end()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern_compiles() {
        assert!(Regex::new(NAME_PATTERN).is_ok());
        assert!(name_regex().is_match("books"));
    }

    #[test]
    fn test_valid_names() {
        for name in ["a", "_", "books", "Books_2024", "_private", "x1_y2_z3"] {
            assert!(check_name("collection_name", name).is_ok(), "{name}");
        }
        let longest = "a".repeat(MAX_NAME_LENGTH);
        assert!(check_name("collection_name", &longest).is_ok());
    }

    #[test]
    fn test_empty_name() {
        let err = check_name("collection_name", "").unwrap_err();
        assert_eq!(err.field(), Some("collection_name"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_too_long_name() {
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        let err = check_name("partition_name", &name).unwrap_err();
        assert_eq!(err.field(), Some("partition_name"));
        assert!(err.to_string().contains("exceeds 255"));
    }

    #[test]
    fn test_leading_digit() {
        let err = check_name("field_name", "1abc").unwrap_err();
        assert_eq!(err.field(), Some("field_name"));
        assert!(err.to_string().contains("must start with a letter or underscore"));
    }

    #[test]
    fn test_bad_character() {
        let err = check_name("alias", "my-alias").unwrap_err();
        assert!(err.to_string().contains("'-'"));

        let err = check_name("alias", "caf\u{e9}").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_optional_name() {
        assert!(check_optional_name("index_name", None).is_ok());
        assert!(check_optional_name("index_name", Some("idx")).is_ok());
        assert!(check_optional_name("index_name", Some("")).is_err());
    }

    #[test]
    fn test_require() {
        let present = Some(3u32);
        assert_eq!(require("task_id", &present).unwrap(), &3);

        let missing: Option<u32> = None;
        let err = require("task_id", &missing).unwrap_err();
        assert_eq!(err.to_string(), "invalid task_id: is required");
    }

    #[test]
    fn test_check_range() {
        assert!(check_range("num_shards", 1, 1..=MAX_SHARDS).is_ok());
        assert!(check_range("num_shards", MAX_SHARDS, 1..=MAX_SHARDS).is_ok());

        let err = check_range("num_shards", 257, 1..=MAX_SHARDS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid num_shards: 257 is out of range [1, 256]"
        );
        assert!(check_range("num_shards", 0, 1..=MAX_SHARDS).is_err());
    }
}
