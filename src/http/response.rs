use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::IntakeError;

/// Captured outcome of one outbound HTTP call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
    pub size_bytes: u64,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Result<Value, IntakeError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Decode the body into the intake service's success shape.
    pub fn decode_process_reply(&self) -> Result<ProcessReply, IntakeError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Success shape returned by the process endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessReply {
    pub status: String,
    pub session_id: String,
    pub response_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_body(body: &str) -> ApiResponse {
        ApiResponse {
            status: 200,
            status_text: "OK".into(),
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body: body.to_string(),
            duration_ms: 12,
            size_bytes: body.len() as u64,
        }
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = response_with_body("{}");
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("X-Missing"), None);
    }

    #[test]
    fn decodes_process_reply() {
        let response = response_with_body(
            r#"{"status":"SUCCESS","session_id":"sess-42","response_time":123.5}"#,
        );
        let reply = response.decode_process_reply().unwrap();
        assert_eq!(reply.status, "SUCCESS");
        assert_eq!(reply.session_id, "sess-42");
        assert!(reply.response_time > 0.0);
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let response = response_with_body("not json");
        assert!(matches!(
            response.json().unwrap_err(),
            IntakeError::Decode(_)
        ));
    }
}
