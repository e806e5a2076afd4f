//! Internationalization (i18n) module.
//!
//! # Architecture
//!
//! - `language`: validated language codes and the process-wide source/target pair
//! - `metrics`: translation observability counters
//!
//! # Example
//!
//! ```rust,ignore
//! use field_translator::i18n::{LanguageCode, LanguagePair};
//!
//! let pair = LanguagePair::new(LanguageCode::parse("en")?, LanguageCode::parse("it")?);
//! assert!(!pair.is_identity());
//! ```

mod language;
mod metrics;

pub use language::{LanguageCode, LanguagePair};
pub use metrics::{MetricsReport, TranslationMetrics};
