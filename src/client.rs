use crate::backend::{HttpBackend, TranslationBackend};
use crate::cache::{CacheKey, Lookup, TranslationCache};
use crate::config::Config;
use crate::error::TranslationError;
use crate::i18n::TranslationMetrics;
use crate::retry::{with_retry_if, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Caching, coalescing, retrying front for a [`TranslationBackend`].
///
/// One client is shared by every interceptor of the process; its cache lives
/// as long as the client does.
pub struct TranslationClient {
    backend: Arc<dyn TranslationBackend>,
    cache: TranslationCache,
    retry: RetryConfig,
    request_timeout: Duration,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationClient {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        cache: TranslationCache,
        retry: RetryConfig,
        request_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            cache,
            retry,
            request_timeout,
            metrics: Arc::new(TranslationMetrics::new()),
        }
    }

    /// Client over `backend` with cache, retry and deadline taken from `config`.
    pub fn with_backend(backend: Arc<dyn TranslationBackend>, config: &Config) -> Self {
        Self::new(
            backend,
            TranslationCache::new(config.cache_capacity),
            RetryConfig::backend_call(config.retry_limit, config.retry_backoff()),
            config.request_timeout(),
        )
    }

    /// Client talking HTTP to `config.backend_endpoint`.
    pub fn from_config(config: &Config) -> Self {
        let backend = HttpBackend::from_config(reqwest::Client::new(), config);
        Self::with_backend(Arc::new(backend), config)
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate `text`, answering from the cache when possible.
    ///
    /// Concurrent calls for the same (text, source, target) share one backend
    /// request and all receive its result. Failures are returned, never cached.
    pub async fn get_translation(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        if source_language == target_language {
            return Ok(text.to_string());
        }

        let key = CacheKey::new(text, source_language, target_language);
        let flight = match self.cache.lookup_or_start(&key, || self.fetch(key.clone())) {
            Lookup::Hit(value) => {
                self.metrics.record_cache_hit();
                return Ok(value);
            }
            Lookup::Joined(flight) => {
                self.metrics.record_coalesced();
                debug!("Joining in-flight translation {}->{}", source_language, target_language);
                flight
            }
            Lookup::Started(flight) => {
                self.metrics.record_cache_miss();
                flight
            }
        };

        flight.await
    }

    /// Backend call with per-attempt deadline and retries.
    fn fetch(&self, key: CacheKey) -> BoxFuture<'static, Result<String, TranslationError>> {
        let backend = Arc::clone(&self.backend);
        let metrics = Arc::clone(&self.metrics);
        let retry = self.retry.clone();
        let deadline = self.request_timeout;

        async move {
            let operation_name = format!("Translation {}->{}", key.source, key.target);
            let result = with_retry_if(
                &retry,
                &operation_name,
                || {
                    let backend = Arc::clone(&backend);
                    let metrics = Arc::clone(&metrics);
                    let key = key.clone();
                    async move {
                        metrics.record_api_call();
                        let call = backend.translate(&key.text, &key.source, &key.target);
                        let result = match tokio::time::timeout(deadline, call).await {
                            Ok(result) => result,
                            Err(_) => Err(TranslationError::Timeout {
                                after_ms: deadline.as_millis() as u64,
                            }),
                        };
                        if result.is_err() {
                            metrics.record_api_failure();
                        }
                        result
                    }
                },
                TranslationError::is_retryable,
            )
            .await;

            if let Err(e) = &result {
                warn!("{} failed: {}", operation_name, e);
            }
            result
        }
        .boxed()
    }
}
