//! Domain services.
//!
//! Each service owns a database handle and the shared [`AccessGate`]. Every
//! mutating operation runs its checks and writes inside one transaction;
//! a dropped transaction rolls back.
//!
//! [`AccessGate`]: crate::access::AccessGate

pub mod blocks;
pub mod catalog;
pub mod projects;
pub mod zero_blocks;

pub use blocks::BlockService;
pub use catalog::CatalogService;
pub use projects::ProjectService;
pub use zero_blocks::ZeroBlockService;

use serde::{Deserialize, Deserializer};

use crate::error::{Result, ServerError};

/// Default value for opaque JSON payloads
pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// Distinguish an explicit `null` from an absent field in PATCH bodies.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`,
/// value → `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn require_non_negative(field: &str, value: i32) -> Result<()> {
    if value < 0 {
        return Err(ServerError::InvalidRequest(format!(
            "{} must be greater than or equal to 0",
            field
        )));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: i32) -> Result<()> {
    if value <= 0 {
        return Err(ServerError::InvalidRequest(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}

pub(crate) fn require_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ServerError::InvalidRequest(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        height: Option<Option<i32>>,
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"height": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"height": 40}"#).unwrap();

        assert_eq!(absent.height, None);
        assert_eq!(null.height, Some(None));
        assert_eq!(set.height, Some(Some(40)));
    }

    #[test]
    fn test_bounds() {
        assert!(require_non_negative("position", 0).is_ok());
        assert!(require_non_negative("position", -1).is_err());
        assert!(require_positive("width", 0).is_err());
        assert!(require_length("type_name", "", 1, 50).is_err());
        assert!(require_length("type_name", "text", 1, 50).is_ok());
    }
}
