//! Startup wiring: build the registry once, attach one interceptor per entity.

use crate::catalog::EntityCatalog;
use crate::client::TranslationClient;
use crate::config::Config;
use crate::error::StartupError;
use crate::hooks::ReadHookRegistrar;
use crate::i18n::LanguagePair;
use crate::interceptor::TranslationInterceptor;
use crate::registry::TranslationRegistry;
use anyhow::Result;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

pub struct TranslationPlugin {
    client: Arc<TranslationClient>,
    languages: LanguagePair,
    max_concurrency: usize,
    registry: OnceLock<TranslationRegistry>,
}

impl TranslationPlugin {
    pub fn new(config: &Config, client: Arc<TranslationClient>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            languages: config.languages()?,
            max_concurrency: config.max_concurrency,
            registry: OnceLock::new(),
        })
    }

    /// Plugin with an HTTP translation client built from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, Arc::new(TranslationClient::from_config(config)))
    }

    /// Startup hook: scan the catalog and register the read interceptors.
    ///
    /// Runs once. Entities with unusable metadata are skipped; only an
    /// unavailable catalog or a second invocation is an error.
    pub fn on_startup<C, H>(
        &self,
        catalog: &C,
        hooks: &mut H,
    ) -> Result<&TranslationRegistry, StartupError>
    where
        C: EntityCatalog + ?Sized,
        H: ReadHookRegistrar + ?Sized,
    {
        if self.registry.get().is_some() {
            return Err(StartupError::AlreadyInitialized);
        }

        let services = catalog.services()?;
        let registry = TranslationRegistry::build(services);
        self.registry
            .set(registry)
            .map_err(|_| StartupError::AlreadyInitialized)?;
        let registry = self
            .registry
            .get()
            .ok_or(StartupError::AlreadyInitialized)?;

        for binding in registry.bindings() {
            hooks.register_after_read(TranslationInterceptor::new(
                Arc::clone(binding),
                Arc::clone(&self.client),
                self.languages.clone(),
                self.max_concurrency,
            ));
        }

        if !registry.skipped().is_empty() {
            warn!(
                "{} entities skipped because of unreadable metadata",
                registry.skipped().len()
            );
        }
        info!(
            "Field translation ready ({}): {} of {} entities translated on read",
            self.languages,
            registry.len(),
            services.iter().map(|s| s.entities.len()).sum::<usize>()
        );

        Ok(registry)
    }

    /// The registry, once startup has run.
    pub fn registry(&self) -> Option<&TranslationRegistry> {
        self.registry.get()
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }
}
