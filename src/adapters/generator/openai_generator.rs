//! OpenAI-compatible chat-completion generator.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol
//! (OpenAI, DeepSeek, local gateways). Retrying and the per-call deadline
//! are left to the caller; this adapter makes exactly one request per call.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIGeneratorConfig::new(api_key)
//!     .with_model("deepseek-chat")
//!     .with_base_url("https://api.deepseek.com/v1");
//!
//! let generator = OpenAIGenerator::new(config)?;
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::session::{Category, Report, FINALIST_COUNT};
use crate::ports::{ContentGenerator, GenerationContext, GeneratorError, RevealedPair};

use super::prompts;

/// Matches the first fenced json block of a completion.
static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```json\s*\n(.*?)\n?\s*```").expect("json block pattern is valid")
});

/// Configuration for the OpenAI-compatible generator.
#[derive(Debug, Clone)]
pub struct OpenAIGeneratorConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// HTTP-level timeout for one request.
    pub timeout: Duration,
}

impl OpenAIGeneratorConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_secret(Secret::new(api_key.into()))
    }

    /// Creates a new configuration from an already-wrapped key.
    pub fn from_secret(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(9),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible content generator.
pub struct OpenAIGenerator {
    client: Client,
    config: OpenAIGeneratorConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIGenerator {
    /// Creates a generator with its own HTTP client.
    pub fn new(config: OpenAIGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::InvalidRequest(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Sends one user prompt and returns the completion text.
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::timeout(self.config.timeout.as_millis() as u64)
                } else if e.is_connect() {
                    GeneratorError::network(format!("Connection failed: {}", e))
                } else {
                    GeneratorError::network(e.to_string())
                }
            })?;

        let response = Self::handle_response_status(response).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::malformed(format!("Failed to parse response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GeneratorError::malformed("No content in response"))
    }

    /// Maps non-success statuses onto generator errors.
    async fn handle_response_status(response: Response) -> Result<Response, GeneratorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(GeneratorError::AuthenticationFailed),
            429 => Err(GeneratorError::RateLimited),
            400..=499 => Err(GeneratorError::InvalidRequest(error_body)),
            500..=599 => Err(GeneratorError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(GeneratorError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }
}

/// Parses the first fenced json block of `content`.
pub fn extract_json_block<T: DeserializeOwned>(content: &str) -> Result<T, GeneratorError> {
    let block = JSON_BLOCK
        .captures(content)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| GeneratorError::malformed("No json code block in completion"))?;

    serde_json::from_str(block.as_str())
        .map_err(|e| GeneratorError::malformed(format!("Invalid json block: {}", e)))
}

/// Picks the descriptions for both categories out of a reveal reply.
fn revealed_pair(
    content: &str,
    first: &Category,
    second: &Category,
) -> Result<RevealedPair, GeneratorError> {
    let mut texts: HashMap<String, String> = extract_json_block(content)?;
    let mut take = |category: &Category| {
        texts
            .remove(category.as_str())
            .ok_or_else(|| GeneratorError::malformed(format!("No text for '{}'", category)))
    };
    Ok(RevealedPair {
        first: take(first)?,
        second: take(second)?,
    })
}

#[async_trait]
impl ContentGenerator for OpenAIGenerator {
    async fn reveal(
        &self,
        context: &GenerationContext,
        first: &Category,
        second: &Category,
    ) -> Result<RevealedPair, GeneratorError> {
        tracing::debug!(
            session_id = %context.session_id,
            first = %first,
            second = %second,
            "Requesting comparison text"
        );
        let prompt = prompts::reveal_prompt(&context.base_information, first, second);
        let content = self.complete(&prompt).await?;
        revealed_pair(&content, first, second)
    }

    async fn summarize(
        &self,
        context: &GenerationContext,
        finalists: &[Category; FINALIST_COUNT],
    ) -> Result<Report, GeneratorError> {
        tracing::debug!(session_id = %context.session_id, "Requesting report");
        let prompt = prompts::summary_prompt(&context.base_information, finalists);
        let content = self.complete(&prompt).await?;

        let report: Report = extract_json_block(&content)?;
        report
            .validate_against(finalists)
            .map_err(|e| GeneratorError::malformed(e.to_string()))?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str) -> Category {
        Category::new(name).unwrap()
    }

    #[test]
    fn extracts_json_block_surrounded_by_prose() {
        let content = "好的，结果如下：\n```json\n{\"医学\": \"a\", \"文学\": \"b\"}\n```\n希望有帮助";
        let map: HashMap<String, String> = extract_json_block(content).unwrap();
        assert_eq!(map.get("医学").map(String::as_str), Some("a"));
    }

    #[test]
    fn missing_block_is_malformed() {
        let err = extract_json_block::<HashMap<String, String>>("{\"医学\": \"a\"}").unwrap_err();
        assert!(matches!(err, GeneratorError::MalformedOutput(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err =
            extract_json_block::<HashMap<String, String>>("```json\n{not json}\n```").unwrap_err();
        assert!(matches!(err, GeneratorError::MalformedOutput(_)));
    }

    #[test]
    fn revealed_pair_follows_request_order() {
        let content = "```json\n{\"文学\": \"second\", \"医学\": \"first\"}\n```";
        let pair = revealed_pair(content, &cat("医学"), &cat("文学")).unwrap();
        assert_eq!(pair.first, "first");
        assert_eq!(pair.second, "second");
    }

    #[test]
    fn revealed_pair_requires_both_keys() {
        let content = "```json\n{\"医学\": \"first\"}\n```";
        let err = revealed_pair(content, &cat("医学"), &cat("文学")).unwrap_err();
        assert!(matches!(err, GeneratorError::MalformedOutput(_)));
    }

    #[test]
    fn report_block_parses() {
        let content = r#"```json
{
  "final_three_majors": ["数学类", "物理学类", "文学"],
  "final_three_majors_report": ["a", "b", "c"],
  "final_recommendation": "数学类"
}
```"#;
        let report: Report = extract_json_block(content).unwrap();
        assert_eq!(report.final_three_majors.len(), 3);
    }

    #[test]
    fn completions_url_ignores_trailing_slash() {
        let generator = OpenAIGenerator::new(
            OpenAIGeneratorConfig::new("sk-test").with_base_url("https://api.example.com/v1/"),
        )
        .unwrap();
        assert_eq!(
            generator.completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn config_debug_hides_api_key() {
        let config = OpenAIGeneratorConfig::new("sk-very-secret");
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }
}
