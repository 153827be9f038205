//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the persisted entities and all request/response structures used by the API.

pub mod blog;
pub mod category;
pub mod user;

// Re-export commonly used types
pub use blog::*;
pub use category::*;
pub use user::*;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Response envelope: `{ message?, <key>? }`
///
/// Every handler answers with this shape. The payload key differs per route
/// (`users`, `newBlog`, `updatedCategory`, ...), so it is carried at runtime.
#[derive(Debug)]
pub struct Envelope<T: Serialize> {
    pub message: Option<String>,
    pub payload: Option<(&'static str, T)>,
}

impl<T: Serialize> Envelope<T> {
    pub fn with_data(key: &'static str, data: T) -> Self {
        Self {
            message: None,
            payload: Some((key, data)),
        }
    }

    pub fn with_message(message: impl Into<String>, key: &'static str, data: T) -> Self {
        Self {
            message: Some(message.into()),
            payload: Some((key, data)),
        }
    }
}

impl Envelope<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            payload: None,
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.message.is_some()) + usize::from(self.payload.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(message) = &self.message {
            map.serialize_entry("message", message)?;
        }
        if let Some((key, data)) = &self.payload {
            map.serialize_entry(key, data)?;
        }
        map.end()
    }
}

/// Treat an absent or empty value as missing
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_envelope_with_message_and_payload() {
        let body = Envelope::with_message("Blog updated", "updatedBlog", json!({ "id": "b1" }));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "message": "Blog updated", "updatedBlog": { "id": "b1" } })
        );
    }

    #[test]
    fn test_envelope_message_only() {
        let body = Envelope::message_only("Blog deleted");
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "message": "Blog deleted" }));
    }

    #[test]
    fn test_envelope_data_only() {
        let body = Envelope::with_data("blogs", Vec::<u8>::new());
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "blogs": [] }));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("u1")), Some("u1"));
    }
}
