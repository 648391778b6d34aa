use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for LlmMarket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub search: SearchConfig,
    pub groq: GroqConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub bind: String,
    pub cart_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub database: u8,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_size: usize,
    pub timeout_seconds: u64,
    pub create_timeout_seconds: u64,
    pub recycle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub amazon_domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    pub api_key: String,
    pub classify_model: String,
    pub intent_model: String,
    pub compare_model: String,
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        // Load environment variables from .env if present
        if dotenvy::dotenv().is_ok() {
            tracing::info!("Loaded .env from current directory");
        }

        // Default config path
        let config_path = env::var("LM_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        // Load config from file if it exists
        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::warn!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration - log warnings but don't fail
        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(name) = env::var("LM_SERVER_NAME") {
            self.server.name = name;
        }
        if let Ok(bind) = env::var("LM_HTTP_BIND") {
            self.server.bind = bind;
        }
        if let Ok(key) = env::var("LM_CART_KEY") {
            self.server.cart_key = key;
        }

        // Redis overrides
        if let Ok(host) = env::var("REDIS_HOST") {
            self.redis.host = host;
        }
        if let Ok(port) = env::var("REDIS_PORT") {
            if let Ok(port_num) = port.parse() {
                self.redis.port = port_num;
            }
        }
        if let Ok(db) = env::var("REDIS_DB") {
            if let Ok(db_num) = db.parse() {
                self.redis.database = db_num;
            }
        }

        // Pool overrides
        if let Ok(pool_size) = env::var("LM_REDIS_POOL_SIZE") {
            if let Ok(size) = pool_size.parse() {
                self.redis.pool.max_size = size;
            }
        }

        // Search provider overrides
        if let Ok(api_key) = env::var("ASIN_DATA_API_KEY") {
            self.search.api_key = api_key;
        }
        if let Ok(base_url) = env::var("LM_SEARCH_BASE_URL") {
            self.search.base_url = base_url;
        }
        if let Ok(domain) = env::var("LM_AMAZON_DOMAIN") {
            self.search.amazon_domain = domain;
        }

        // Groq overrides
        if let Ok(api_key) = env::var("GROQ_API_KEY") {
            self.groq.api_key = api_key;
        }
        if let Ok(model) = env::var("GROQ_CLASSIFY_MODEL") {
            self.groq.classify_model = model;
        }
        if let Ok(model) = env::var("GROQ_INTENT_MODEL") {
            self.groq.intent_model = model;
        }
        if let Ok(model) = env::var("GROQ_COMPARE_MODEL") {
            self.groq.compare_model = model;
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.redis.port == 0 {
            return Err("Redis port cannot be 0".into());
        }

        if self.search.api_key == "PLACEHOLDER_ASIN_DATA_API_KEY" || self.search.api_key.is_empty()
        {
            return Err("ASIN_DATA_API_KEY environment variable must be set".into());
        }
        if self.search.base_url.is_empty() {
            return Err("Search base URL cannot be empty".into());
        }

        if self.groq.api_key == "PLACEHOLDER_GROQ_API_KEY" || self.groq.api_key.is_empty() {
            return Err("GROQ_API_KEY environment variable must be set".into());
        }

        Ok(())
    }

    /// Get Redis URL with password from environment
    pub fn get_redis_url(&self) -> String {
        let password = env::var("REDIS_PASSWORD")
            .or_else(|_| env::var("REDIS_PASS"))
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "REDIS_PASSWORD not set, assuming no password for local development."
                );
                "".to_string()
            });

        if password.is_empty() {
            format!(
                "redis://{}:{}/{}",
                self.redis.host, self.redis.port, self.redis.database
            )
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                password, self.redis.host, self.redis.port, self.redis.database
            )
        }
    }

    /// Get pool timeout as Duration
    pub fn get_pool_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.timeout_seconds)
    }

    /// Get pool create timeout as Duration
    pub fn get_pool_create_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.create_timeout_seconds)
    }

    /// Get pool recycle timeout as Duration
    pub fn get_pool_recycle_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.recycle_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "llm-market".to_string(),
                version: "0.3.0".to_string(),
                bind: "127.0.0.1:8788".to_string(),
                cart_key: "llm-market:cart".to_string(),
            },
            redis: RedisConfig {
                host: "localhost".to_string(),
                port: 6379,
                database: 0,
                pool: PoolConfig {
                    max_size: 16,
                    timeout_seconds: 5,
                    create_timeout_seconds: 5,
                    recycle_timeout_seconds: 5,
                },
            },
            search: SearchConfig {
                api_key: env::var("ASIN_DATA_API_KEY").unwrap_or_else(|_| {
                    tracing::warn!("ASIN_DATA_API_KEY not set, using placeholder");
                    "PLACEHOLDER_ASIN_DATA_API_KEY".to_string()
                }),
                base_url: "https://api.asindataapi.com/request".to_string(),
                amazon_domain: "amazon.com".to_string(),
            },
            groq: GroqConfig {
                api_key: env::var("GROQ_API_KEY").unwrap_or_else(|_| {
                    tracing::warn!("GROQ_API_KEY not set, using placeholder");
                    "PLACEHOLDER_GROQ_API_KEY".to_string()
                }),
                classify_model: "llama-3.1-8b-instant".to_string(),
                intent_model: "llama-3.1-8b-instant".to_string(),
                compare_model: "llama-3.3-70b-versatile".to_string(),
            },
        }
    }
}
