use std::sync::Arc;

use crate::error::{LlmMarketError, Result};
use crate::models::{ChatMessage, Comparison, GroqRequest, Product};
use crate::transport::{Transport, first_choice, strip_code_fences};

/// Generates a structured pros/cons comparison of the two visible products
/// through the Groq chat API.
pub struct GroqComparer {
    tx: Arc<dyn Transport>,
    model: String,
}

impl GroqComparer {
    pub fn new(tx: Arc<dyn Transport>, model: String) -> Self {
        Self { tx, model }
    }

    /// Request a comparison of exactly two products. A parse failure is an
    /// error to the caller; no partial comparison is ever produced.
    pub async fn compare(&self, first: &Product, second: &Product) -> Result<Comparison> {
        tracing::info!(
            "Comparing products with Groq: '{}' vs '{}'",
            first.name,
            second.name
        );

        let system_message = ChatMessage {
            role: "system".to_string(),
            content: r#"You are a shopping advisor. Compare the two products the user provides and return a JSON object with this exact structure:
{
    "first": { "pros": ["..."], "cons": ["..."] },
    "second": { "pros": ["..."], "cons": ["..."] },
    "summary": "one or two sentences recommending which to pick and why"
}

Keep each pros/cons list to 2-4 short entries. Base the comparison only on the provided details."#
                .to_string(),
        };

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: format!(
                "First product:\n{}\nSecond product:\n{}",
                describe(first),
                describe(second)
            ),
        };

        let request = GroqRequest {
            model: self.model.clone(),
            messages: vec![system_message, user_message],
            temperature: 0.3,
            max_tokens: 600,
            response_format: Some(serde_json::json!({"type": "json_object"})),
        };

        let response = self.tx.chat(&request).await?;
        let raw = first_choice(&response)?;
        let json_str = strip_code_fences(raw);
        serde_json::from_str(json_str).map_err(|e| {
            LlmMarketError::Internal(format!(
                "Failed to deserialize comparison JSON: {e}. Raw: {json_str}"
            ))
        })
    }
}

fn describe(product: &Product) -> String {
    let mut lines = format!("- Name: {}\n- Price: ${:.2}\n", product.name, product.price);
    if let Some(rating) = product.rating {
        lines.push_str(&format!("- Rating: {rating}\n"));
    }
    if let Some(reviews) = product.reviews_count {
        lines.push_str(&format!("- Reviews: {reviews}\n"));
    }
    lines
}
