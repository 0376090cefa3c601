use super::completion::strip_code_fence;
use serde::de::DeserializeOwned;
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected {min}-{max} entries in {field}, got {actual}")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("{0} is empty")]
    Empty(&'static str),

    #[error("priority step {index} is out of range for {len} steps")]
    PriorityOutOfRange { index: usize, len: usize },
}

pub fn decode_json<T: DeserializeOwned>(reply: &str) -> Result<T, DecodeError> {
    Ok(serde_json::from_str(strip_code_fence(reply))?)
}

pub fn non_empty(field: &'static str, value: &str) -> Result<(), DecodeError> {
    if value.trim().is_empty() {
        return Err(DecodeError::Empty(field));
    }
    Ok(())
}

/// Checks the list length and that no entry is blank.
pub fn string_list(
    field: &'static str,
    values: &[String],
    range: RangeInclusive<usize>,
) -> Result<(), DecodeError> {
    if !range.contains(&values.len()) {
        return Err(DecodeError::Length {
            field,
            min: *range.start(),
            max: *range.end(),
            actual: values.len(),
        });
    }
    values.iter().try_for_each(|value| non_empty(field, value))
}
