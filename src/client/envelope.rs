//! Response envelope handling.
//!
//! The backend answers either with the bare payload or with the payload wrapped
//! as `{"data": ...}`; both shapes are accepted everywhere.

use serde::de::DeserializeOwned;
use serde_json::Value;

const DATA_FIELD: &str = "data";

/// Decodes `body`, unwrapping a `{"data": ...}` envelope when present.
pub fn unwrap_envelope<T: DeserializeOwned>(mut body: Value) -> Result<T, serde_json::Error> {
    if let Value::Object(map) = &mut body {
        if let Some(inner) = map.remove(DATA_FIELD) {
            return serde_json::from_value(inner);
        }
    }
    serde_json::from_value(body)
}
