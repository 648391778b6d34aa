use serde::{Deserialize, Deserializer, Serialize};

/// Flexible integer deserializer to tolerate string, float, or int inputs
/// in the LLM's extracted-intent JSON
fn deserialize_flexible_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleInt {
        Int(u32),
        Float(f64),
        String(String),
    }

    let value = Option::<FlexibleInt>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(FlexibleInt::Int(i)) => Ok(Some(i)),
        Some(FlexibleInt::Float(f)) => Ok(Some(f as u32)),
        Some(FlexibleInt::String(s)) => {
            s.parse::<u32>().map(Some).map_err(serde::de::Error::custom)
        }
    }
}

/// A single normalized product from one search response.
///
/// Identifiers are scoped to the result set that produced them: the gateway
/// reassigns `1..=N` on every search, so an id is only meaningful against the
/// result set currently held by the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: f64,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u32>,
}

/// How the interpreter classified a piece of free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Search,
    Command,
}

/// Action extracted from a COMMAND-classified input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Dismiss,
    AddToCart,
    ShowNext,
    Compare,
}

/// Structured intent extracted from free text, either by the LLM or by the
/// local keyword fallback. Target references are resolved against the visible
/// window in order: `product_id`, then `position` (1-based), then a
/// case-insensitive substring match on `product_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandIntent {
    pub action: CommandAction,
    #[serde(default, deserialize_with = "deserialize_flexible_u32")]
    pub position: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_flexible_u32")]
    pub product_id: Option<u32>,
    #[serde(default)]
    pub product_name: Option<String>,
}

/// One side of a comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVerdict {
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// Pros/cons comparison of the two visible products. Ephemeral: any change
/// to the visible window discards it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub first: ProductVerdict,
    pub second: ProductVerdict,
    pub summary: String,
}

// Groq chat message format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

// Groq API request format
#[derive(Debug, Serialize, Clone)]
pub struct GroqRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

// Groq API response format
#[derive(Debug, Deserialize)]
pub struct GroqResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}
