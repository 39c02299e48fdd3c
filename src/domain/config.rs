//! Completion API configuration.

use url::Url;

/// Environment variable holding the bearer credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Completion service configuration.
#[derive(Debug, Clone)]
pub struct CompletionApiConfig {
    /// Chat-completions endpoint URL.
    pub api_url: Url,
    /// Model identifier sent with every request.
    pub model: String,
    /// Per-call network timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CompletionApiConfig {
    fn default() -> Self {
        Self { api_url: default_api_url(), model: default_model(), timeout_secs: default_timeout() }
    }
}

fn default_api_url() -> Url {
    Url::parse("https://openrouter.ai/api/v1/chat/completions")
        .expect("default API URL is valid")
}

fn default_model() -> String {
    "openai/gpt-4.1-nano".to_string()
}

fn default_timeout() -> u64 {
    30
}
