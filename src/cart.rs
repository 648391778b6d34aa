use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Product;
use crate::redis::RedisManager;

#[cfg(test)]
use mockall::automock;

/// Persistence boundary for the cart: one serialized list under one key.
/// `automock` must run before `async_trait` so the mock sees the async
/// methods rather than the desugared boxed futures.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CartRepository: Send + Sync + 'static {
    async fn load(&self) -> Result<Option<Vec<Product>>>;
    async fn save(&self, items: &[Product]) -> Result<()>;
}

/// Redis-backed cart persistence under a single JSON key.
pub struct RedisCartRepository {
    redis: Arc<RedisManager>,
    key: String,
}

impl RedisCartRepository {
    pub fn new(redis: Arc<RedisManager>, key: String) -> Self {
        Self { redis, key }
    }
}

#[async_trait]
impl CartRepository for RedisCartRepository {
    async fn load(&self) -> Result<Option<Vec<Product>>> {
        self.redis.json_get(&self.key).await
    }

    async fn save(&self, items: &[Product]) -> Result<()> {
        self.redis.json_set(&self.key, &items.to_vec()).await
    }
}

/// Ordered cart contents plus their persistence handle.
///
/// Duplicates are permitted: `add` never checks identity, matching the
/// original behavior. Every mutation is written through immediately; a
/// failed write is logged and swallowed, never surfaced to the user.
pub struct CartStore {
    items: Vec<Product>,
    repository: Arc<dyn CartRepository>,
}

impl CartStore {
    /// Rehydrate the cart from persistence. Absent or malformed data loads
    /// as an empty cart with no error surfaced.
    pub async fn load(repository: Arc<dyn CartRepository>) -> Self {
        let items = match repository.load().await {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to load persisted cart: {e} - starting empty");
                Vec::new()
            }
        };
        Self { items, repository }
    }

    /// Append unconditionally and persist.
    pub async fn add(&mut self, product: Product) {
        self.items.push(product);
        self.persist().await;
    }

    /// Delete all entries with a matching id, persist, and report how many
    /// were removed.
    pub async fn remove(&mut self, id: u32) -> usize {
        let before = self.items.len();
        self.items.retain(|p| p.id != id);
        let removed = before - self.items.len();
        if removed > 0 {
            self.persist().await;
        }
        removed
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|p| p.price).sum()
    }

    async fn persist(&self) {
        if let Err(e) = self.repository.save(&self.items).await {
            tracing::warn!("Failed to persist cart: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmMarketError;
    use std::sync::Mutex;

    // In-memory repository standing in for Redis, shared across "reloads"
    struct InMemoryRepository {
        stored: Mutex<Option<Vec<Product>>>,
    }

    impl InMemoryRepository {
        fn new() -> Self {
            Self {
                stored: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CartRepository for InMemoryRepository {
        async fn load(&self) -> Result<Option<Vec<Product>>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save(&self, items: &[Product]) -> Result<()> {
            *self.stored.lock().unwrap() = Some(items.to_vec());
            Ok(())
        }
    }

    fn product(id: u32, name: &str, price: f64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
            image_url: "https://img/placeholder.jpg".to_string(),
            asin: None,
            link: None,
            rating: None,
            reviews_count: None,
        }
    }

    #[tokio::test]
    async fn test_cart_persists_across_reload_in_insertion_order() {
        let repository = Arc::new(InMemoryRepository::new());

        let mut cart = CartStore::load(repository.clone()).await;
        assert!(cart.is_empty());
        cart.add(product(1, "Headphones", 49.99)).await;
        cart.add(product(2, "Memory Card", 12.49)).await;
        drop(cart);

        // Simulated reload against the same store
        let cart = CartStore::load(repository).await;
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].name, "Headphones");
        assert_eq!(cart.items()[1].name, "Memory Card");
    }

    #[tokio::test]
    async fn test_cart_permits_duplicates() {
        let repository = Arc::new(InMemoryRepository::new());
        let mut cart = CartStore::load(repository).await;

        cart.add(product(1, "Headphones", 49.99)).await;
        cart.add(product(1, "Headphones", 49.99)).await;
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total(), 99.98);
    }

    #[tokio::test]
    async fn test_remove_deletes_all_matching_entries() {
        let repository = Arc::new(InMemoryRepository::new());
        let mut cart = CartStore::load(repository.clone()).await;

        cart.add(product(1, "Headphones", 49.99)).await;
        cart.add(product(2, "Memory Card", 12.49)).await;
        cart.add(product(1, "Headphones", 49.99)).await;

        assert_eq!(cart.remove(1).await, 2);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].id, 2);

        // Removal was persisted too
        let reloaded = CartStore::load(repository).await;
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_mocked_repository_rehydrates_items() {
        let mut repository = MockCartRepository::new();
        repository
            .expect_load()
            .returning(|| Ok(Some(vec![product(3, "Charger", 8.99)])));

        let cart = CartStore::load(Arc::new(repository)).await;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].name, "Charger");
    }

    #[tokio::test]
    async fn test_load_failure_degrades_to_empty_cart() {
        let mut repository = MockCartRepository::new();
        repository
            .expect_load()
            .returning(|| Err(LlmMarketError::Internal("redis down".to_string())));

        let cart = CartStore::load(Arc::new(repository)).await;
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let mut repository = MockCartRepository::new();
        repository.expect_load().returning(|| Ok(None));
        repository
            .expect_save()
            .returning(|_| Err(LlmMarketError::Internal("redis down".to_string())));

        let mut cart = CartStore::load(Arc::new(repository)).await;
        cart.add(product(1, "Headphones", 49.99)).await;
        // The item is still in the in-memory cart despite the failed write
        assert_eq!(cart.len(), 1);
    }
}
