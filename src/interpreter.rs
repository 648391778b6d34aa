use std::sync::Arc;

use crate::error::{LlmMarketError, Result};
use crate::models::{
    ChatMessage, Classification, CommandAction, CommandIntent, GroqRequest, Product,
};
use crate::transport::{Transport, first_choice, strip_code_fences};

/// Any of these short-circuits classification to COMMAND without a remote
/// call.
const COMMAND_KEYWORDS: [&str; 7] = [
    "compare",
    "dismiss",
    "remove",
    "delete",
    "add to cart",
    "show next",
    "get rid of",
];

/// Fast local classifier: pure keyword containment, first stage of the
/// two-stage strategy.
pub fn contains_command_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    COMMAND_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Re-derive an intent from the raw text when the remote extraction call
/// fails or returns malformed JSON.
pub fn fallback_intent(text: &str) -> Option<CommandIntent> {
    let lower = text.to_lowercase();

    let action = if lower.contains("compare") || lower.contains("pros and cons") {
        CommandAction::Compare
    } else if lower.contains("show next") || lower.contains("next") || lower.contains("more") {
        CommandAction::ShowNext
    } else if lower.contains("add") && lower.contains("cart") {
        CommandAction::AddToCart
    } else if lower.contains("dismiss")
        || lower.contains("remove")
        || lower.contains("delete")
        || lower.contains("get rid of")
    {
        CommandAction::Dismiss
    } else {
        return None;
    };

    Some(CommandIntent {
        action,
        position: ordinal_reference(&lower),
        product_id: None,
        product_name: None,
    })
}

/// Pick up "first"/"second"/"1st"/"2nd" or a bare number from the text.
fn ordinal_reference(lower: &str) -> Option<u32> {
    if lower.contains("first") || lower.contains("1st") {
        return Some(1);
    }
    if lower.contains("second") || lower.contains("2nd") {
        return Some(2);
    }
    lower
        .split_whitespace()
        .find_map(|word| word.trim_matches(|c: char| !c.is_ascii_digit()).parse().ok())
}

/// Resolve the intent's target against the visible window: direct id, then
/// 1-based position, then case-insensitive substring on the name.
pub fn resolve_target<'a>(intent: &CommandIntent, visible: &'a [Product]) -> Option<&'a Product> {
    if let Some(id) = intent.product_id {
        if let Some(product) = visible.iter().find(|p| p.id == id) {
            return Some(product);
        }
    }
    if let Some(position) = intent.position {
        if position >= 1 {
            if let Some(product) = visible.get(position as usize - 1) {
                return Some(product);
            }
        }
    }
    if let Some(name) = &intent.product_name {
        let needle = name.to_lowercase();
        if !needle.is_empty() {
            return visible
                .iter()
                .find(|p| p.name.to_lowercase().contains(&needle));
        }
    }
    None
}

/// Remote stage of the interpreter: classification and intent extraction
/// through the Groq chat API.
pub struct GroqInterpreter {
    tx: Arc<dyn Transport>,
    classify_model: String,
    intent_model: String,
}

impl GroqInterpreter {
    pub fn new(tx: Arc<dyn Transport>, classify_model: String, intent_model: String) -> Self {
        Self {
            tx,
            classify_model,
            intent_model,
        }
    }

    /// Classify free text as a new search or a command over the visible
    /// products. Keyword hits never leave the process; the remote call only
    /// runs for ambiguous input, and any failure defaults to SEARCH.
    pub async fn classify(&self, text: &str, visible: &[Product]) -> Classification {
        if contains_command_keyword(text) {
            return Classification::Command;
        }

        match self.classify_remote(text, visible).await {
            Ok(classification) => classification,
            Err(e) => {
                tracing::warn!("Classification call failed: {e} - defaulting to SEARCH");
                Classification::Search
            }
        }
    }

    async fn classify_remote(&self, text: &str, visible: &[Product]) -> Result<Classification> {
        tracing::info!("Classifying input with Groq: {}", text);

        let system_message = ChatMessage {
            role: "system".to_string(),
            content: r#"You are an input classifier for a shopping assistant. The user sees a small set of products and types free text. Decide whether the text is a COMMAND acting on the shown products (dismissing one, comparing them, adding one to the cart, asking for more) or a SEARCH for something new.

Reply with exactly one word: COMMAND or SEARCH."#
                .to_string(),
        };

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: format!(
                "Currently shown products:\n{}\nUser input: {text}",
                numbered_names(visible)
            ),
        };

        let request = GroqRequest {
            model: self.classify_model.clone(),
            messages: vec![system_message, user_message],
            temperature: 0.0,
            max_tokens: 10,
            response_format: None,
        };

        let response = self.tx.chat(&request).await?;
        let reply = first_choice(&response)?.trim().to_uppercase();

        if reply.starts_with("COMMAND") {
            Ok(Classification::Command)
        } else if reply.starts_with("SEARCH") {
            Ok(Classification::Search)
        } else {
            Err(LlmMarketError::Internal(format!(
                "Unexpected classification reply: {reply}"
            )))
        }
    }

    /// Extract a structured intent from COMMAND-classified text. A failed or
    /// malformed remote reply falls back to the local keyword derivation;
    /// `None` means the input could not be understood at all.
    pub async fn extract_intent(&self, text: &str, visible: &[Product]) -> Option<CommandIntent> {
        match self.extract_remote(text, visible).await {
            Ok(intent) => Some(intent),
            Err(e) => {
                tracing::warn!("Intent extraction failed: {e} - trying keyword fallback");
                fallback_intent(text)
            }
        }
    }

    async fn extract_remote(&self, text: &str, visible: &[Product]) -> Result<CommandIntent> {
        tracing::info!("Extracting command intent with Groq: {}", text);

        let system_message = ChatMessage {
            role: "system".to_string(),
            content: r#"You are an intent extractor for a shopping assistant. The user issued a command about the products currently shown. Return a JSON object with this structure:
{
    "action": "dismiss" | "add_to_cart" | "show_next" | "compare",
    "position": 1, // Optional: 1-based position among the shown products
    "product_id": 3, // Optional: the product's numeric id, if the user names it directly
    "product_name": "string" // Optional: a fragment of the product's name
}

Omit position, product_id and product_name when the command does not reference a specific product (show_next, compare).

Examples:
User: "dismiss the second one"
Output:
{
    "action": "dismiss",
    "position": 2
}

User: "get rid of the sandisk card"
Output:
{
    "action": "dismiss",
    "product_name": "sandisk"
}

User: "add the first one to my cart"
Output:
{
    "action": "add_to_cart",
    "position": 1
}

User: "compare these"
Output:
{
    "action": "compare"
}
"#
            .to_string(),
        };

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: format!(
                "Currently shown products:\n{}\nUser command: {text}",
                numbered_names(visible)
            ),
        };

        let request = GroqRequest {
            model: self.intent_model.clone(),
            messages: vec![system_message, user_message],
            temperature: 0.0,
            max_tokens: 200,
            response_format: Some(serde_json::json!({"type": "json_object"})),
        };

        let response = self.tx.chat(&request).await?;
        let raw = first_choice(&response)?;
        let json_str = strip_code_fences(raw);
        serde_json::from_str(json_str).map_err(|e| {
            LlmMarketError::Internal(format!(
                "Failed to deserialize intent JSON: {e}. Raw: {json_str}"
            ))
        })
    }
}

fn numbered_names(visible: &[Product]) -> String {
    visible
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {} (id {})\n", i + 1, p.name, p.id))
        .collect()
}
