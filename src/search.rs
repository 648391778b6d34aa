use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{LlmMarketError, Result};
use crate::models::Product;

/// Shown when a result record carries no image, and as the image of the
/// placeholder product substituted on provider failure.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1513708927688-890a1e2b6b94?auto=format&fit=crop&w=400&q=80";

const PLACEHOLDER_TITLE: &str = "Unknown Product";

#[async_trait]
pub trait ProductSearch: Send + Sync {
    /// Run one search against the provider and return normalized products,
    /// provider order preserved.
    async fn search(&self, term: &str) -> Result<Vec<Product>>;
}

/// Gateway to the ASIN Data API search endpoint.
pub struct AsinDataSearch {
    client: Client,
    api_key: String,
    base_url: String,
    amazon_domain: String,
}

impl AsinDataSearch {
    pub fn new(api_key: String, base_url: String, amazon_domain: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            amazon_domain,
        }
    }
}

#[async_trait]
impl ProductSearch for AsinDataSearch {
    async fn search(&self, term: &str) -> Result<Vec<Product>> {
        tracing::info!(term, domain = %self.amazon_domain, "Searching products");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("type", "search"),
                ("amazon_domain", self.amazon_domain.as_str()),
                ("search_term", term),
            ])
            .send()
            .await
            .map_err(|e| LlmMarketError::SearchProvider(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LlmMarketError::SearchProvider(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| LlmMarketError::SearchProvider(format!("malformed payload: {e}")))?;

        let products = normalize(body.search_results.unwrap_or_default());
        tracing::info!(count = products.len(), "Search results normalized");
        Ok(products)
    }
}

/// Raw result record from the provider. Every field is optional and the
/// price arrives in heterogeneous shapes.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchItem {
    pub title: Option<String>,
    pub price: Option<RawPrice>,
    pub image: Option<String>,
    pub asin: Option<String>,
    pub link: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub ratings_total: Option<u32>,
}

/// Price may be a bare number, a numeric string, or an object with a
/// `value` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPrice {
    Number(f64),
    Text(String),
    Object { value: Option<f64> },
}

impl RawPrice {
    fn amount(&self) -> f64 {
        match self {
            RawPrice::Number(n) => *n,
            RawPrice::Text(s) => s.parse().unwrap_or(0.0),
            RawPrice::Object { value } => value.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    search_results: Option<Vec<RawSearchItem>>,
}

/// Normalize raw records into Products. Ids are reassigned `1..=N` per
/// response; they carry no meaning outside this result set.
pub(crate) fn normalize(items: Vec<RawSearchItem>) -> Vec<Product> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| Product {
            id: index as u32 + 1,
            name: item
                .title
                .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            price: item.price.map(|p| p.amount()).unwrap_or(0.0),
            image_url: item
                .image
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
            asin: item.asin,
            link: item.link,
            rating: item.rating,
            reviews_count: item.reviews_count.or(item.ratings_total),
        })
        .collect()
}

/// The single hardcoded product the caller substitutes when a search fails
/// outright, rather than showing nothing.
pub fn fallback_products() -> Vec<Product> {
    vec![Product {
        id: 1,
        name: "Sample Product 1".to_string(),
        price: 19.99,
        image_url: PLACEHOLDER_IMAGE_URL.to_string(),
        asin: None,
        link: None,
        rating: None,
        reviews_count: None,
    }]
}
