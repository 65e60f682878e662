//! HTTP implementation of the backend session protocol.
//!
//! Every failure (transport, status, body shape) is logged and degraded to
//! None. The conversation loop decides what a missing turn means; this
//! client never bubbles an error past the trait.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::types::{BackendReply, PostOptions, SessionCreated};
use super::Backend;

/// Failure modes inside the HTTP client. Internal: logged, then flattened
/// to None at the trait boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("empty response body")]
    EmptyBody,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("response carried no session id")]
    MissingSessionId,
}

#[derive(Serialize)]
struct MessageRequest {
    parts: Vec<RequestPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

#[derive(Serialize)]
struct RequestPart {
    #[serde(rename = "type")]
    part_type: &'static str,
    text: String,
}

impl RequestPart {
    fn text(content: &str) -> Self {
        Self {
            part_type: "text",
            text: content.to_string(),
        }
    }
}

/// Client for a session-holding model server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    server_url: String,
}

impl HttpBackend {
    /// Create a client for the given base url. Trailing slashes are
    /// stripped so path joins stay predictable.
    pub fn new(server_url: impl Into<String>) -> Self {
        let mut url = server_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self {
            http: Client::new(),
            server_url: url,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn try_create_session(&self) -> Result<String, BackendError> {
        let url = format!("{}/session", self.server_url);
        let response = self.http.post(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(BackendError::EmptyBody);
        }
        let created: SessionCreated = serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("session body: {e}")))?;
        created
            .into_session_id()
            .ok_or(BackendError::MissingSessionId)
    }

    async fn try_post_message(
        &self,
        session_id: &str,
        prompt: &str,
        options: &PostOptions,
    ) -> Result<BackendReply, BackendError> {
        let url = format!("{}/session/{}/message", self.server_url, session_id);
        let request = MessageRequest {
            parts: vec![RequestPart::text(prompt)],
            model: options.model.clone(),
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(BackendError::EmptyBody);
        }
        serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("message body: {e}")))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_session(&self) -> Option<String> {
        match self.try_create_session().await {
            Ok(id) => {
                debug!(session_id = %id, "session created");
                Some(id)
            }
            Err(e) => {
                warn!("session creation failed: {e}");
                None
            }
        }
    }

    async fn post_message(
        &self,
        session_id: &str,
        prompt: &str,
        options: &PostOptions,
    ) -> Option<BackendReply> {
        match self.try_post_message(session_id, prompt, options).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(session_id, "message post failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_stripped() {
        assert_eq!(
            HttpBackend::new("http://localhost:4096/").server_url(),
            "http://localhost:4096"
        );
        assert_eq!(
            HttpBackend::new("http://localhost:4096//").server_url(),
            "http://localhost:4096"
        );
        assert_eq!(
            HttpBackend::new("http://localhost:4096").server_url(),
            "http://localhost:4096"
        );
    }

    #[test]
    fn message_request_serializes_the_prompt_as_a_text_part() {
        let request = MessageRequest {
            parts: vec![RequestPart::text("hello")],
            model: Some("claude-sonnet".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "parts": [{"type": "text", "text": "hello"}],
                "model": "claude-sonnet"
            })
        );
    }

    #[test]
    fn absent_model_is_omitted_from_the_request() {
        let request = MessageRequest {
            parts: vec![RequestPart::text("hello")],
            model: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("model"));
    }

    #[test]
    fn error_display() {
        let err = BackendError::Status(503);
        assert!(err.to_string().contains("503"));

        let err = BackendError::EmptyBody;
        assert_eq!(err.to_string(), "empty response body");

        let err = BackendError::InvalidResponse("session body: expected value".into());
        assert!(err.to_string().contains("session body"));
    }
}
