//! JSON parser for delay API responses.

use anyhow::{Result, bail};
use serde_json::Value;
use tracing::debug;

use crate::journey::RawJourneyRecord;

/// Decodes a response body into journey records.
///
/// The body must be a JSON array. Elements that do not look like journey
/// records are skipped rather than failing the whole response.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON or the top level is not an
/// array.
pub fn parse_journeys(bytes: &[u8]) -> Result<Vec<RawJourneyRecord>> {
    let items = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => items,
        other => bail!("expected a JSON array of journeys, got {}", kind(&other)),
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawJourneyRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => debug!(index, error = %e, "Skipping malformed journey record"),
        }
    }

    Ok(records)
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
