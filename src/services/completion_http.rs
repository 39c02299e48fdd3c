//! OpenRouter chat-completions client using reqwest.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::domain::config::API_KEY_ENV;
use crate::domain::{CompletionApiConfig, CompletionError};
use crate::ports::{CompletionClient, CompletionRequest};

const SYSTEM_MESSAGE: &str = "あなたは楽しい会話のテーマを考えるアシスタントです";

/// HTTP transport for the completion service.
///
/// Performs a single request per call; retry behavior belongs to the
/// orchestrator. A client built without a credential never touches the
/// network: every call fails fast with `AuthFailure`.
#[derive(Clone)]
pub struct HttpCompletionClient {
    api_key: Option<String>,
    config: CompletionApiConfig,
    client: Client,
}

impl std::fmt::Debug for HttpCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionClient")
            .field("api_url", &self.config.api_url)
            .field("model", &self.config.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpCompletionClient {
    /// Create a client with an explicit credential (None means "missing").
    pub fn new(
        api_key: Option<String>,
        config: CompletionApiConfig,
    ) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Transport {
                status: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { api_key, config, client })
    }

    /// Read the bearer credential from the environment.
    ///
    /// A missing credential is reported once here; the client is still
    /// constructed so that later calls fail fast with `AuthFailure` instead
    /// of attempting the network.
    pub fn from_env(config: CompletionApiConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            eprintln!("warning: {API_KEY_ENV} is not set; completion calls will fail");
        }
        Self::new(api_key, config)
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CompletionError::AuthFailure);
        };

        let payload = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_MESSAGE },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.config.api_url.clone())
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::Transport {
                        status: e.status().map(|s| s.as_u16()),
                        message: format!("HTTP request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::AuthFailure);
        }
        if status == StatusCode::REQUEST_TIMEOUT {
            return Err(CompletionError::Timeout);
        }
        if !status.is_success() {
            let message = if body.trim().is_empty() {
                "completion request failed".to_string()
            } else {
                body.trim().to_string()
            };
            return Err(CompletionError::Transport { status: Some(status.as_u16()), message });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Malformed(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Malformed("no choices in response".into()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn test_config(server_url: &str) -> CompletionApiConfig {
        CompletionApiConfig {
            api_url: Url::parse(server_url).unwrap(),
            model: "openai/gpt-4.1-nano".to_string(),
            timeout_secs: 5,
        }
    }

    fn test_request() -> CompletionRequest {
        CompletionRequest { prompt: "テーマを1つ".to_string(), max_tokens: 150, temperature: 0.7 }
    }

    #[test]
    fn complete_returns_first_choice_content() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"こんにちは"}}]}"#,
            )
            .create();

        let client =
            HttpCompletionClient::new(Some("fake-key".to_string()), test_config(&server.url()))
                .unwrap();

        let result = client.complete(test_request());
        assert_eq!(result.unwrap(), "こんにちは");
    }

    #[test]
    fn complete_maps_401_to_auth_failure() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/").with_status(401).expect(1).create();

        let client =
            HttpCompletionClient::new(Some("bad-key".to_string()), test_config(&server.url()))
                .unwrap();

        let result = client.complete(test_request());
        assert_eq!(result.unwrap_err(), CompletionError::AuthFailure);
        mock.assert();
    }

    #[test]
    fn complete_maps_500_to_transport_error() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/").with_status(500).expect(1).create();

        let client =
            HttpCompletionClient::new(Some("fake-key".to_string()), test_config(&server.url()))
                .unwrap();

        match client.complete(test_request()) {
            Err(CompletionError::Transport { status, .. }) => assert_eq!(status, Some(500)),
            other => panic!("unexpected result: {:?}", other),
        }
        mock.assert();
    }

    #[test]
    fn complete_rejects_unparseable_body_as_malformed() {
        let mut server = mockito::Server::new();
        let _m = server.mock("POST", "/").with_status(200).with_body("not json").create();

        let client =
            HttpCompletionClient::new(Some("fake-key".to_string()), test_config(&server.url()))
                .unwrap();

        match client.complete(test_request()) {
            Err(CompletionError::Malformed(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn complete_rejects_empty_choices_as_malformed() {
        let mut server = mockito::Server::new();
        let _m = server.mock("POST", "/").with_status(200).with_body(r#"{"choices":[]}"#).create();

        let client =
            HttpCompletionClient::new(Some("fake-key".to_string()), test_config(&server.url()))
                .unwrap();

        match client.complete(test_request()) {
            Err(CompletionError::Malformed(message)) => assert!(message.contains("no choices")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_credential_fails_fast_without_network() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/").expect(0).create();

        let client = HttpCompletionClient::new(None, test_config(&server.url())).unwrap();

        let result = client.complete(test_request());
        assert_eq!(result.unwrap_err(), CompletionError::AuthFailure);
        mock.assert();
    }

    #[test]
    fn debug_output_redacts_the_credential() {
        let client = HttpCompletionClient::new(
            Some("secret-key".to_string()),
            CompletionApiConfig::default(),
        )
        .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
