use async_trait::async_trait;
use reqwest::Client;

use crate::error::{LlmMarketError, Result};
use crate::models::{GroqRequest, GroqResponse};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[async_trait]
pub trait Transport: Send + Sync {
    async fn chat(&self, req: &GroqRequest) -> Result<GroqResponse>;
}

pub struct GroqTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqTransport {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: GROQ_API_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl Transport for GroqTransport {
    // Single attempt: a failed call degrades at the call site (keyword
    // fallback or SEARCH default), it is never retried.
    async fn chat(&self, req: &GroqRequest) -> Result<GroqResponse> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmMarketError::Internal(format!(
                "Groq API error ({}): {}",
                response.status(),
                response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string())
            )));
        }

        Ok(response.json().await?)
    }
}

/// Extract the content of the first choice, or error on an empty reply.
pub fn first_choice(response: &GroqResponse) -> Result<&str> {
    response
        .choices
        .first()
        .map(|c| c.message.content.as_str())
        .ok_or_else(|| LlmMarketError::Internal("Groq API returned empty choices".to_string()))
}

/// Strip markdown code fencing the model sometimes wraps JSON replies in.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence ("json", "JSON", ...)
    let rest = rest
        .split_once('\n')
        .map(|(_, body)| body)
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
