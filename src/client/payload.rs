//! Wire types for the relay.
//!
//! The request mirrors the generative language API's `generateContent` body;
//! the relay forwards it untouched.

use serde::{Deserialize, Serialize};

/// A single text part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A block of content made of parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// One model invocation as sent to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

impl GenerateRequest {
    /// A request carrying only user text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::text(text)],
            system_instruction: None,
        }
    }

    /// Attach a system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::text(instruction));
        self
    }

    /// Concatenated user text, mostly useful for logging and tests
    pub fn user_text(&self) -> String {
        self.contents
            .iter()
            .flat_map(|content| content.parts.iter())
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn system_text(&self) -> Option<String> {
        self.system_instruction.as_ref().map(|content| {
            content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

/// The part of the relay's response the client cares about
#[derive(Debug, Deserialize)]
pub struct RelayResponse {
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_persona_payload_shape() {
        let request = GenerateRequest::user("How?").with_system_instruction("Be careful");
        let value = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(
            value,
            json!({
                "contents": [{ "parts": [{ "text": "How?" }] }],
                "systemInstruction": { "parts": [{ "text": "Be careful" }] }
            })
        );
    }

    #[test]
    fn test_synthesis_payload_omits_system_instruction() {
        let value =
            serde_json::to_value(GenerateRequest::user("merge")).expect("request should serialize");
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_relay_response_without_text() {
        let response: RelayResponse =
            serde_json::from_str(r#"{"candidates": []}"#).expect("should parse");
        assert!(response.text.is_none());
    }
}
