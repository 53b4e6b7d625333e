//! Dotted-path extraction from provider JSON.
//!
//! Path segments name object keys; a numeric segment indexes into an array,
//! which is how the positional payloads of the translation endpoint are read.
//!
//! ```rust
//! use anicine::net::json;
//! use serde_json::json;
//!
//! let data = json!({
//!     "id": "0ZpGFaIiR",
//!     "mappings": [
//!         {"service": "myanimelist/anime", "serviceId": "52991"},
//!         {"service": "anilist/anime", "serviceId": "154587"}
//!     ]
//! });
//!
//! let service = json::extract_path(&data, "mappings.1.service").unwrap();
//! assert_eq!(service, "anilist/anime");
//! assert_eq!(json::extract_array(&data, "mappings").len(), 2);
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Value at `path`, `None` when any segment is missing.
///
/// An empty path returns the whole value.
///
/// ```rust
/// use anicine::net::json;
/// use serde_json::json;
///
/// let data = json!([[["Frieren", "フリーレン"]]]);
/// let text = json::extract_path(&data, "0.0.0");
/// assert_eq!(text.unwrap().as_str(), Some("Frieren"));
///
/// assert_eq!(json::extract_path(&data, "0.1"), None);
/// ```
pub fn extract_path(json: &Value, path: &str) -> Option<Value> {
    let mut current = json;

    for key in path.split('.').filter(|key| !key.is_empty()) {
        current = match current {
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => current.get(key)?,
        };
    }

    Some(current.clone())
}

/// Value at `path` deserialized into `T`.
///
/// # Errors
///
/// * [`Error::Parse`](crate::Error::Parse) - If the path doesn't exist
/// * [`Error::Json`](crate::Error::Json) - If deserialization fails
///
/// ```rust
/// use anicine::net::json;
/// use serde_json::json;
///
/// let data = json!({"startDate": "2023-09-29", "episodeCount": 28});
/// let episodes: u32 = json::extract_as(&data, "episodeCount").unwrap();
/// assert_eq!(episodes, 28);
/// ```
pub fn extract_as<T>(json: &Value, path: &str) -> crate::Result<T>
where
    T: DeserializeOwned,
{
    extract_path(json, path)
        .ok_or_else(|| crate::Error::parse(format!("Path not found: {}", path)))
        .and_then(|v| serde_json::from_value(v).map_err(Into::into))
}

/// Elements of the array at `path`; empty when missing or not an array.
pub fn extract_array(json: &Value, path: &str) -> Vec<Value> {
    extract_path(json, path)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
}
