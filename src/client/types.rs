//! Wire types for the `/api/chat` exchange.

use serde::{Deserialize, Serialize};

/// Request body sent to the backend.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
}

impl ChatRequest {
    /// Build a request for `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful response body.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// The coach's reply text.
    pub reply: String,
}

impl Reply {
    /// Build a reply.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

/// Error response body. Only read on non-success statuses.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// Primary human-readable field.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    /// Secondary human-readable field.
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl ErrorBody {
    /// First non-empty string among `detail` then `message`.
    #[must_use]
    pub fn human_message(&self) -> Option<&str> {
        [&self.detail, &self.message]
            .into_iter()
            .find_map(|field| {
                field
                    .as_ref()
                    .and_then(serde_json::Value::as_str)
                    .filter(|text| !text.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(ChatRequest::new("hi")).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi" }));
    }

    #[test]
    fn test_reply_ignores_extra_fields() {
        let reply: Reply =
            serde_json::from_str(r#"{"reply":"Great to hear!","model":"x"}"#).unwrap();
        assert_eq!(reply.reply, "Great to hear!");
    }

    #[test]
    fn test_error_body_prefers_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"model unavailable","message":"other"}"#).unwrap();
        assert_eq!(body.human_message(), Some("model unavailable"));
    }

    #[test]
    fn test_error_body_falls_back_to_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"message":"bad input"}"#).unwrap();
        assert_eq!(body.human_message(), Some("bad input"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail":"","message":"bad"}"#).unwrap();
        assert_eq!(body.human_message(), Some("bad"));
    }

    #[test]
    fn test_error_body_non_string_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#)
                .unwrap();
        assert_eq!(body.human_message(), None);
    }
}
