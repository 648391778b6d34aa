use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::carousel::Carousel;
use crate::cart::{CartRepository, CartStore, RedisCartRepository};
use crate::comparison::GroqComparer;
use crate::config::Config;
use crate::error::{LlmMarketError, Result};
use crate::interpreter::{GroqInterpreter, resolve_target};
use crate::models::{Classification, CommandAction, Comparison, Product};
use crate::redis::RedisManager;
use crate::search::{AsinDataSearch, ProductSearch, fallback_products};
use crate::transport::GroqTransport;

/// How long a feedback message stays visible before a background task
/// clears it.
const FEEDBACK_TTL: Duration = Duration::from_secs(3);

/// Everything the front end needs to render after one input.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub visible: Vec<Product>,
    pub cart_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub no_more_products: bool,
}

struct Session {
    carousel: Carousel,
    feedback: Option<String>,
    // Bumped on every feedback change so a stale expiry task never clears
    // a newer message
    feedback_generation: u64,
}

/// Clears the loading flag when dropped, so the gate reopens even if the
/// request future is dropped mid-search (client disconnect).
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-session orchestrator: classifies each input, then runs either the
/// search path (reseeding the carousel) or the command path (mutating
/// carousel/cart, or generating a comparison).
pub struct AssistantService {
    gateway: Arc<dyn ProductSearch>,
    interpreter: GroqInterpreter,
    comparer: GroqComparer,
    session: Arc<Mutex<Session>>,
    cart: Mutex<CartStore>,
    loading: AtomicBool,
}

impl AssistantService {
    pub async fn new(config: &Config, redis: Arc<RedisManager>) -> Result<Self> {
        let transport = Arc::new(GroqTransport::new(config.groq.api_key.clone())?);

        let gateway = Arc::new(AsinDataSearch::new(
            config.search.api_key.clone(),
            config.search.base_url.clone(),
            config.search.amazon_domain.clone(),
        ));

        let repository: Arc<dyn CartRepository> = Arc::new(RedisCartRepository::new(
            redis,
            config.server.cart_key.clone(),
        ));

        Ok(Self::with_components(
            gateway,
            GroqInterpreter::new(
                transport.clone(),
                config.groq.classify_model.clone(),
                config.groq.intent_model.clone(),
            ),
            GroqComparer::new(transport, config.groq.compare_model.clone()),
            CartStore::load(repository).await,
        ))
    }

    pub fn with_components(
        gateway: Arc<dyn ProductSearch>,
        interpreter: GroqInterpreter,
        comparer: GroqComparer,
        cart: CartStore,
    ) -> Self {
        Self {
            gateway,
            interpreter,
            comparer,
            session: Arc::new(Mutex::new(Session {
                carousel: Carousel::new(),
                feedback: None,
                feedback_generation: 0,
            })),
            cart: Mutex::new(cart),
            loading: AtomicBool::new(false),
        }
    }

    /// Handle one piece of free text from the user.
    pub async fn handle_input(&self, input: &str) -> Result<ChatReply> {
        let text = input.trim();
        if text.is_empty() {
            return Err(LlmMarketError::InvalidInput(
                "Search term is required".to_string(),
            ));
        }

        let visible = {
            let session = self.session.lock().await;
            session.carousel.visible().to_vec()
        };

        match self.interpreter.classify(text, &visible).await {
            Classification::Search => self.run_search(text).await,
            Classification::Command => self.run_command(text, &visible).await,
        }
    }

    /// Search path: gated by the loading flag so one trigger cannot run two
    /// concurrent searches. The command path deliberately skips this gate.
    async fn run_search(&self, term: &str) -> Result<ChatReply> {
        if self.loading.swap(true, Ordering::SeqCst) {
            tracing::debug!("Search already in progress - returning current state");
            return Ok(self.snapshot(false).await);
        }
        let _guard = LoadingGuard(&self.loading);

        let products = match self.gateway.search(term).await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(term, "Search failed: {e} - using placeholder");
                fallback_products()
            }
        };

        {
            let mut session = self.session.lock().await;
            session.carousel.seed(products);
        }

        Ok(self.snapshot(false).await)
    }

    async fn run_command(&self, text: &str, visible: &[Product]) -> Result<ChatReply> {
        let Some(intent) = self.interpreter.extract_intent(text, visible).await else {
            self.set_feedback("Sorry, I didn't understand that command.".to_string())
                .await;
            return Ok(self.snapshot(false).await);
        };

        match intent.action {
            CommandAction::ShowNext => {
                let advanced = {
                    let mut session = self.session.lock().await;
                    session.carousel.show_next()
                };
                if advanced {
                    self.set_feedback("Showing the next products.".to_string())
                        .await;
                    Ok(self.snapshot(false).await)
                } else {
                    self.set_feedback("No more products to show.".to_string())
                        .await;
                    Ok(self.snapshot(true).await)
                }
            }
            CommandAction::Dismiss => {
                let Some(target) = resolve_target(&intent, visible).cloned() else {
                    self.set_feedback("Sorry, I didn't understand that command.".to_string())
                        .await;
                    return Ok(self.snapshot(false).await);
                };
                let dismissed = {
                    let mut session = self.session.lock().await;
                    session.carousel.dismiss(target.id)
                };
                if dismissed {
                    self.set_feedback(format!("Dismissed \"{}\".", target.name))
                        .await;
                } else {
                    self.set_feedback("Sorry, I didn't understand that command.".to_string())
                        .await;
                }
                Ok(self.snapshot(false).await)
            }
            CommandAction::AddToCart => {
                let Some(target) = resolve_target(&intent, visible).cloned() else {
                    self.set_feedback("Sorry, I didn't understand that command.".to_string())
                        .await;
                    return Ok(self.snapshot(false).await);
                };
                {
                    let mut cart = self.cart.lock().await;
                    cart.add(target.clone()).await;
                }
                self.set_feedback(format!("Added \"{}\" to your cart.", target.name))
                    .await;
                Ok(self.snapshot(false).await)
            }
            CommandAction::Compare => {
                let pair = {
                    let session = self.session.lock().await;
                    session.carousel.visible_pair().map(|(a, b)| (a.clone(), b.clone()))
                };
                let Some((first, second)) = pair else {
                    self.set_feedback("I need two products on screen to compare.".to_string())
                        .await;
                    return Ok(self.snapshot(false).await);
                };
                match self.comparer.compare(&first, &second).await {
                    Ok(comparison) => {
                        {
                            let mut session = self.session.lock().await;
                            session.carousel.set_comparison(comparison);
                        }
                        self.set_feedback("Comparison ready.".to_string()).await;
                    }
                    Err(e) => {
                        tracing::error!("Comparison failed: {e}");
                        self.set_feedback(
                            "Couldn't generate a comparison right now.".to_string(),
                        )
                        .await;
                    }
                }
                Ok(self.snapshot(false).await)
            }
        }
    }

    /// Current cart contents and total, for the cart page.
    pub async fn cart_contents(&self) -> (Vec<Product>, f64) {
        let cart = self.cart.lock().await;
        (cart.items().to_vec(), cart.total())
    }

    /// Remove all cart entries matching the id; returns how many went.
    pub async fn remove_from_cart(&self, id: u32) -> usize {
        let mut cart = self.cart.lock().await;
        cart.remove(id).await
    }

    /// Set a feedback message and schedule its expiry. The expiry task is
    /// the only thing that mutates session state off the action path, and it
    /// only ever clears the exact message it was spawned for.
    async fn set_feedback(&self, message: String) {
        let generation = {
            let mut session = self.session.lock().await;
            session.feedback = Some(message);
            session.feedback_generation += 1;
            session.feedback_generation
        };

        let session = Arc::clone(&self.session);
        tokio::spawn(async move {
            tokio::time::sleep(FEEDBACK_TTL).await;
            let mut session = session.lock().await;
            if session.feedback_generation == generation {
                session.feedback = None;
            }
        });
    }

    async fn snapshot(&self, no_more_products: bool) -> ChatReply {
        let session = self.session.lock().await;
        let cart = self.cart.lock().await;
        ChatReply {
            visible: session.carousel.visible().to_vec(),
            cart_count: cart.len(),
            comparison: session.carousel.comparison().cloned(),
            feedback: session.feedback.clone(),
            no_more_products,
        }
    }
}
