//! Shared input checks.

use guildkeep_error::{StoreError, StoreResult};

pub(crate) fn require(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn max_chars(field: &str, value: &str, max: usize) -> StoreResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(StoreError::validation(format!(
            "{} exceeds {} characters (got {})",
            field, max, len
        )));
    }
    Ok(())
}

pub(crate) fn optional(field: &str, value: Option<&str>) -> StoreResult<()> {
    match value {
        Some(v) => require(field, v),
        None => Ok(()),
    }
}
