//! JSON array decoding

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse a response body that must be a JSON array
pub fn decode_values(body: &[u8], url: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::decode(url, format!("Failed to parse JSON: {e}")))?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::decode(
            url,
            format!("expected a JSON array, got {}", kind(&other)),
        )),
    }
}

/// Parse a JSON array body into typed items, preserving order
pub fn decode_array<T: DeserializeOwned>(body: &[u8], url: &str) -> Result<Vec<T>> {
    decode_values(body, url)?
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|e| Error::decode(url, format!("item {index}: {e}")))
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
