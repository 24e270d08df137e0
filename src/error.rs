//! Error types for language switching.

use thiserror::Error;

/// Errors raised synchronously while building a coordinator or handling a
/// switch request.
///
/// Loader failures are not represented here: they happen after the
/// synchronous portion of a switch and are logged, never returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwitchError {
    /// The switch action carried something other than a string.
    #[error("switch language payload must be a string, got {found}")]
    InvalidPayload { found: String },

    /// The switch action carried an empty language code.
    #[error("switch language payload must be a non-empty language code")]
    EmptyLanguage,

    /// A coordinator was built outside of a Tokio runtime.
    #[error("no Tokio runtime is available to run dictionary loads")]
    NoRuntime,
}

impl SwitchError {
    /// Build an `InvalidPayload` error describing the JSON kind that was received.
    pub(crate) fn invalid_payload(payload: &serde_json::Value) -> Self {
        let kind = match payload {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        SwitchError::InvalidPayload {
            found: format!("{} ({})", kind, payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_payload_message_names_kind() {
        let err = SwitchError::invalid_payload(&json!(42));
        let message = err.to_string();
        assert!(message.contains("must be a string"));
        assert!(message.contains("a number"));
        assert!(message.contains("42"));
    }

    #[test]
    fn test_invalid_payload_null() {
        let err = SwitchError::invalid_payload(&json!(null));
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn test_empty_language_message() {
        assert_eq!(
            SwitchError::EmptyLanguage.to_string(),
            "switch language payload must be a non-empty language code"
        );
    }
}
