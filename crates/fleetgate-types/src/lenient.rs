//! Lenient decoding helpers for backend payloads.
//!
//! Role data arrives from a service we do not control. A single malformed
//! grant must not take down the whole membership, so sequences are decoded
//! item by item and items that fail to decode are dropped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Deserializes a sequence, dropping items that fail to decode.
///
/// `null` and a missing field both decode to an empty `Vec`. Use with
/// `#[serde(default, deserialize_with = "lenient::seq")]`.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    let Some(items) = raw else {
        return Ok(Vec::new());
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, item_type = std::any::type_name::<T>(), "Dropping malformed payload item");
                None
            }
        })
        .collect();

    if decoded.len() != total {
        debug!(
            kept = decoded.len(),
            dropped = total - decoded.len(),
            "Malformed items skipped while decoding sequence"
        );
    }

    Ok(decoded)
}

/// Deserializes an optional string, treating non-string values as absent.
///
/// Numbers and booleans are not coerced: a grant whose subject is `42` is
/// malformed, not subject `"42"`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
