//! Read-hook table of the serving layer.
//!
//! The serving runtime fires `after_read` once a read has produced its batch
//! and awaits it before the response is sent.

use crate::interceptor::{InterceptOutcome, Record, TranslationInterceptor};
use std::collections::HashMap;
use tracing::info;

/// Where the startup scan attaches interceptors.
pub trait ReadHookRegistrar {
    fn register_after_read(&mut self, interceptor: TranslationInterceptor);
}

/// After-read hooks keyed by qualified entity name (`CatalogService.Books`).
#[derive(Clone, Default)]
pub struct ReadHooks {
    after_read: HashMap<String, TranslationInterceptor>,
}

impl ReadHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_hook(&self, entity: &str) -> bool {
        self.after_read.contains_key(entity)
    }

    /// Entities with an after-read hook, sorted.
    pub fn entities(&self) -> Vec<&str> {
        let mut entities: Vec<&str> = self.after_read.keys().map(String::as_str).collect();
        entities.sort_unstable();
        entities
    }

    /// Run the after-read hook of `entity`, if it has one.
    ///
    /// Returns `None` when no hook is registered; the records are untouched.
    pub async fn after_read(
        &self,
        entity: &str,
        records: &mut [Record],
    ) -> Option<InterceptOutcome> {
        let interceptor = self.after_read.get(entity)?;
        Some(interceptor.after_read(records).await)
    }
}

impl ReadHookRegistrar for ReadHooks {
    fn register_after_read(&mut self, interceptor: TranslationInterceptor) {
        info!(
            "Translating {} on read: {}",
            interceptor.entity(),
            interceptor.fields().join(", ")
        );
        self.after_read
            .insert(interceptor.entity().to_string(), interceptor);
    }
}
