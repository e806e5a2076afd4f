use crate::i18n::{LanguageCode, LanguagePair};
use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Languages
    pub target_language: String,
    pub source_language: String,

    // Translation backend
    pub backend_endpoint: String,
    pub backend_api_key: Option<String>,
    pub format: String,

    // Throughput and resilience
    pub max_concurrency: usize,
    pub retry_limit: u32,
    pub retry_backoff_ms: u64,
    pub request_timeout_ms: u64,

    // Cache
    pub cache_capacity: usize,
}

impl Config {
    pub const DEFAULT_BACKEND_ENDPOINT: &'static str = "http://localhost:5000/translate";

    /// Defaults for everything except the required target language.
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
            source_language: LanguageCode::DEFAULT_SOURCE.to_string(),
            backend_endpoint: Self::DEFAULT_BACKEND_ENDPOINT.to_string(),
            backend_api_key: None,
            format: "text".to_string(),
            max_concurrency: 10,
            retry_limit: 2,
            retry_backoff_ms: 250,
            request_timeout_ms: 5000,
            cache_capacity: 10_000,
        }
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::new(String::new());

        let config = Self {
            target_language: std::env::var("TRANSLATION_TARGET_LANGUAGE")
                .context("TRANSLATION_TARGET_LANGUAGE not set")?,
            source_language: std::env::var("TRANSLATION_SOURCE_LANGUAGE")
                .unwrap_or(defaults.source_language),

            backend_endpoint: std::env::var("TRANSLATION_BACKEND_URL")
                .unwrap_or(defaults.backend_endpoint),
            backend_api_key: std::env::var("TRANSLATION_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            format: std::env::var("TRANSLATION_FORMAT").unwrap_or(defaults.format),

            max_concurrency: env_or("TRANSLATION_MAX_CONCURRENCY", defaults.max_concurrency),
            retry_limit: env_or("TRANSLATION_RETRY_LIMIT", defaults.retry_limit),
            retry_backoff_ms: env_or("TRANSLATION_RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
            request_timeout_ms: env_or(
                "TRANSLATION_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            ),

            cache_capacity: env_or("TRANSLATION_CACHE_CAPACITY", defaults.cache_capacity),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.languages()?;
        if self.backend_endpoint.trim().is_empty() {
            bail!("Translation backend endpoint must not be empty");
        }
        if self.max_concurrency == 0 {
            bail!("max_concurrency must be at least 1");
        }
        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be at least 1");
        }
        if self.cache_capacity == 0 {
            bail!("cache_capacity must be at least 1");
        }
        Ok(())
    }

    pub fn languages(&self) -> Result<LanguagePair> {
        let source = LanguageCode::parse(&self.source_language)
            .context("Invalid TRANSLATION_SOURCE_LANGUAGE")?;
        let target = LanguageCode::parse(&self.target_language)
            .context("Invalid TRANSLATION_TARGET_LANGUAGE")?;
        Ok(LanguagePair::new(source, target))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Parse an optional numeric variable, falling back to the default when unset or unparsable
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
