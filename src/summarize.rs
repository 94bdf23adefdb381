use log::debug;
use reqwest::Client;

use crate::error::{Error, Result};
use crate::ExtractedContent;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

const PROMPT_TEMPLATE: &str = "
Provide a summary of the following content in 300 words:
Context = {text}
";

/// Separator between documents when they are stuffed into one prompt
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Summarizes extracted content with a hosted chat-completions model.
pub struct Summarizer {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl Summarizer {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn summarize(&self, content: &ExtractedContent) -> Result<String> {
        let prompt = build_prompt(content);
        debug!(
            "Summarizing {} chars via {} with model {}",
            prompt.len(),
            self.api_base,
            self.model
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Summarization {
                status: None,
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Summarization {
                status: Some(status),
                message: api_error_message(&body),
            });
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| Error::Summarization {
            status: None,
            message: format!("invalid response body: {e}"),
        })?;
        extract_completion_text(&json)
    }
}

/// Substitute every document's text, in order, into the fixed prompt
pub fn build_prompt(content: &ExtractedContent) -> String {
    PROMPT_TEMPLATE.replace("{text}", &content.joined(DOCUMENT_SEPARATOR))
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty error response".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

fn extract_completion_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Ok(text.to_string());
    }
    Err(Error::Summarization {
        status: None,
        message: "unexpected chat completion response format".to_string(),
    })
}
