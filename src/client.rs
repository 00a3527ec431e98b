//! Backend API client.
//!
//! Talks to the chat backend over an injected [`HttpClient`]: the streaming
//! generate call plus the abort control endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{ConfigError, NetworkError};
use crate::traits::{ByteStream, Headers, HttpClient};

/// Which answer pipeline the backend runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Small local model
    #[default]
    Lite,
    /// Full local model
    Base,
    /// Cloud model; subject to provider rate limits
    Net,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Lite => "lite",
            ChatMode::Base => "base",
            ChatMode::Net => "net",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lite" => Ok(ChatMode::Lite),
            "base" => Ok(ChatMode::Base),
            "net" => Ok(ChatMode::Net),
            _ => Err(ConfigError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Body of `POST /chat/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub session_id: String,
    pub question: String,
    pub mode: ChatMode,
}

impl GenerateRequest {
    pub fn new(session_id: impl Into<String>, question: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            session_id: session_id.into(),
            question: question.into(),
            mode,
        }
    }
}

#[derive(Debug, Serialize)]
struct AbortRequest<'a> {
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Response of `GET /abort/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbortStatus {
    pub session_id: String,
    pub aborted: bool,
}

/// Client for the chat backend.
///
/// Cheap to clone; clones share the underlying HTTP client.
#[derive(Clone)]
pub struct ChatClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Build a reqwest-backed client from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let http = ReqwestHttpClient::from_config(config)?;
        Ok(Self::with_http(Arc::new(http), config.base_url.clone()))
    }

    /// Use an existing transport (a mock in tests).
    pub fn with_http(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn json_headers() -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    /// Start a generation and return its body for incremental reading.
    ///
    /// Sends `POST /chat/`. A non-2xx status fails here, before any bytes.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ByteStream, NetworkError> {
        let url = self.url("/chat/");
        let body = serde_json::to_string(request).map_err(|e| NetworkError::Other {
            message: e.to_string(),
        })?;

        let mut headers = Self::json_headers();
        headers.insert("Accept".to_string(), "text/plain".to_string());

        tracing::debug!(
            session_id = %request.session_id,
            mode = %request.mode,
            "POST {}",
            url
        );
        self.http
            .post_stream(&url, &body, &headers)
            .await
            .map_err(|e| NetworkError::from_http(e, &url))
    }

    /// Tell the backend to stop generating for `session_id`.
    ///
    /// Sends `POST /abort/`.
    pub async fn notify_abort(
        &self,
        session_id: &str,
        reason: Option<&str>,
    ) -> Result<(), NetworkError> {
        self.post_control("/abort/", &AbortRequest { session_id, reason })
            .await
    }

    /// Clear the backend's abort flag so a new request can start.
    ///
    /// Sends `POST /abort/reset`.
    pub async fn reset_abort(&self, session_id: &str) -> Result<(), NetworkError> {
        self.post_control(
            "/abort/reset",
            &AbortRequest {
                session_id,
                reason: None,
            },
        )
        .await
    }

    /// Sends `GET /abort/{session_id}`.
    pub async fn abort_status(&self, session_id: &str) -> Result<AbortStatus, NetworkError> {
        let url = self.url(&format!("/abort/{}", urlencoding::encode(session_id)));
        let response = self
            .http
            .get(&url, &Headers::new())
            .await
            .map_err(|e| NetworkError::from_http(e, &url))?;

        if !response.is_success() {
            return Err(NetworkError::HttpStatus {
                status: response.status,
                message: response.text().unwrap_or_default(),
            });
        }

        response
            .json::<AbortStatus>()
            .map_err(|e| NetworkError::InvalidResponse {
                message: e.to_string(),
            })
    }

    async fn post_control(&self, path: &str, body: &AbortRequest<'_>) -> Result<(), NetworkError> {
        let url = self.url(path);
        let body = serde_json::to_string(body).map_err(|e| NetworkError::Other {
            message: e.to_string(),
        })?;

        let response = self
            .http
            .post(&url, &body, &Self::json_headers())
            .await
            .map_err(|e| NetworkError::from_http(e, &url))?;

        if !response.is_success() {
            return Err(NetworkError::HttpStatus {
                status: response.status,
                message: response
                    .text()
                    .unwrap_or_else(|_| "Unknown error".to_string()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::{HttpError, Response};
    use bytes::Bytes;
    use futures_util::StreamExt;

    const BASE: &str = "http://backend.test";

    fn client_with(mock: &MockHttpClient) -> ChatClient {
        ChatClient::with_http(Arc::new(mock.clone()), format!("{}/", BASE))
    }

    #[test]
    fn test_chat_mode_parse() {
        assert_eq!("lite".parse::<ChatMode>().unwrap(), ChatMode::Lite);
        assert_eq!(" NET ".parse::<ChatMode>().unwrap(), ChatMode::Net);
        assert_eq!("Base".parse::<ChatMode>().unwrap(), ChatMode::Base);
        assert!("turbo".parse::<ChatMode>().is_err());
        assert_eq!(ChatMode::default(), ChatMode::Lite);
    }

    #[test]
    fn test_generate_request_wire_shape() {
        let request = GenerateRequest::new("s1", "What is the deadline?", ChatMode::Net);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "session_id": "s1",
                "question": "What is the deadline?",
                "mode": "net"
            })
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client_with(&MockHttpClient::new());
        assert_eq!(client.base_url(), BASE);
    }

    #[tokio::test]
    async fn test_generate_posts_to_chat() {
        let mock = MockHttpClient::new();
        mock.set_response(&format!("{}/chat/", BASE), MockResponse::chunked("Hi", 1));
        let client = client_with(&mock);

        let mut stream = client
            .generate(&GenerateRequest::new("s1", "q", ChatMode::Lite))
            .await
            .unwrap();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"Hi");

        let requests = mock.requests_to("/chat/");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].json().unwrap()["mode"], "lite");
        assert_eq!(
            requests[0].headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_generate_error_status() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}/chat/", BASE),
            MockResponse::Success(Response::new(500, Bytes::from("boom"))),
        );
        let client = client_with(&mock);

        let result = client
            .generate(&GenerateRequest::new("s1", "q", ChatMode::Lite))
            .await;
        assert!(matches!(
            result,
            Err(NetworkError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_notify_abort_body() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}/abort/", BASE),
            MockResponse::json(200, &serde_json::json!({"ok": true})),
        );
        let client = client_with(&mock);

        client.notify_abort("s1", Some("superseded")).await.unwrap();
        client.notify_abort("s2", None).await.unwrap();

        let requests = mock.requests_to("/abort/");
        assert_eq!(
            requests[0].json().unwrap(),
            serde_json::json!({"session_id": "s1", "reason": "superseded"})
        );
        assert_eq!(
            requests[1].json().unwrap(),
            serde_json::json!({"session_id": "s2"})
        );
    }

    #[tokio::test]
    async fn test_notify_abort_connection_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}/abort/", BASE),
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );
        let client = client_with(&mock);

        let err = client.notify_abort("s1", None).await.unwrap_err();
        assert!(matches!(err, NetworkError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_reset_abort() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}/abort/reset", BASE),
            MockResponse::json(200, &serde_json::json!({"ok": true, "aborted": false})),
        );
        let client = client_with(&mock);

        client.reset_abort("s1").await.unwrap();
        assert_eq!(mock.requests_to("/abort/reset").len(), 1);
    }

    #[tokio::test]
    async fn test_abort_status_encodes_session_id() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}/abort/a%20b", BASE),
            MockResponse::json(200, &serde_json::json!({"session_id": "a b", "aborted": true})),
        );
        let client = client_with(&mock);

        let status = client.abort_status("a b").await.unwrap();
        assert_eq!(
            status,
            AbortStatus {
                session_id: "a b".to_string(),
                aborted: true
            }
        );
    }

    #[tokio::test]
    async fn test_abort_status_invalid_body() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}/abort/s1", BASE),
            MockResponse::Success(Response::new(200, Bytes::from("not json"))),
        );
        let client = client_with(&mock);

        let err = client.abort_status("s1").await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidResponse { .. }));
    }
}
