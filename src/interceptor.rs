//! Per-entity read interceptor: rewrites translatable fields of a read batch in place.

use crate::client::TranslationClient;
use crate::i18n::LanguagePair;
use crate::registry::EntityBinding;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// One row of a read response.
pub type Record = serde_json::Map<String, Value>;

/// What happened to the bound fields of one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterceptOutcome {
    /// Fields overwritten with their translation
    pub translated: usize,
    /// Fields absent, null, empty or not text
    pub skipped: usize,
    /// Fields left at their original value because translation failed
    pub failed: usize,
}

/// Translation hook bound to one entity and its fixed list of fields.
#[derive(Clone)]
pub struct TranslationInterceptor {
    name: String,
    binding: Arc<EntityBinding>,
    client: Arc<TranslationClient>,
    languages: LanguagePair,
    max_concurrency: usize,
}

impl TranslationInterceptor {
    pub fn new(
        binding: Arc<EntityBinding>,
        client: Arc<TranslationClient>,
        languages: LanguagePair,
        max_concurrency: usize,
    ) -> Self {
        Self {
            name: binding.qualified_name(),
            binding,
            client,
            languages,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Qualified name of the bound entity (`CatalogService.Books`).
    pub fn entity(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.binding.fields
    }

    /// Translate the bound fields of every record, in place.
    ///
    /// At most `max_concurrency` backend lookups run at once; they are
    /// dispatched record by record, fields in binding order. Record order is
    /// untouched. Never fails: a field whose translation fails keeps its value.
    pub async fn after_read(&self, records: &mut [Record]) -> InterceptOutcome {
        let mut outcome = InterceptOutcome::default();

        if self.languages.is_identity() {
            debug!(
                "{}: source and target are both {}, nothing to translate",
                self.entity(),
                self.languages.target
            );
            return outcome;
        }

        let mut jobs: Vec<(usize, &str, String)> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            for field in &self.binding.fields {
                match record.get(field) {
                    Some(Value::String(text)) if !text.is_empty() => {
                        jobs.push((index, field.as_str(), text.clone()));
                    }
                    None | Some(Value::Null) | Some(Value::String(_)) => outcome.skipped += 1,
                    Some(other) => {
                        debug!(
                            "{}.{}: not text, leaving as is ({})",
                            self.entity(),
                            field,
                            other
                        );
                        outcome.skipped += 1;
                    }
                }
            }
        }

        if jobs.is_empty() {
            return outcome;
        }

        let source = self.languages.source.as_str();
        let target = self.languages.target.as_str();

        let results: Vec<_> = stream::iter(jobs)
            .map(|(index, field, text)| async move {
                let result = self.client.get_translation(&text, source, target).await;
                (index, field, result)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        for (index, field, result) in results {
            match result {
                Ok(translated) => {
                    if let Some(value) = records[index].get_mut(field) {
                        *value = Value::String(translated);
                    }
                    outcome.translated += 1;
                }
                Err(e) => {
                    warn!(
                        "{}.{} (record {}): translation failed, keeping original: {}",
                        self.entity(),
                        field,
                        index,
                        e
                    );
                    outcome.failed += 1;
                }
            }
        }

        debug!(
            "{}: {} records, {} fields translated, {} skipped, {} failed",
            self.entity(),
            records.len(),
            outcome.translated,
            outcome.skipped,
            outcome.failed
        );
        outcome
    }
}
