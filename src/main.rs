//! Run one read batch through the field translation hooks.
//!
//! Usage:
//!   field-translator <catalog.json> <Service.Entity> <records.json>
//!
//! Required environment variables:
//! - TRANSLATION_TARGET_LANGUAGE
//!
//! Optional:
//! - TRANSLATION_SOURCE_LANGUAGE (defaults to en)
//! - TRANSLATION_BACKEND_URL (defaults to http://localhost:5000/translate)
//! - TRANSLATION_API_KEY, TRANSLATION_FORMAT, TRANSLATION_MAX_CONCURRENCY,
//!   TRANSLATION_RETRY_LIMIT, TRANSLATION_RETRY_BACKOFF_MS,
//!   TRANSLATION_REQUEST_TIMEOUT_MS, TRANSLATION_CACHE_CAPACITY

use anyhow::{bail, Context, Result};
use field_translator::catalog::ServiceCatalog;
use field_translator::config::Config;
use field_translator::hooks::ReadHooks;
use field_translator::interceptor::Record;
use field_translator::plugin::TranslationPlugin;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("field_translator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [catalog_path, entity, records_path] = args.as_slice() else {
        bail!("Usage: field-translator <catalog.json> <Service.Entity> <records.json>");
    };

    let config = Config::from_env()?;
    let catalog = ServiceCatalog::from_file(catalog_path)?;

    let plugin = TranslationPlugin::from_config(&config)?;
    let mut hooks = ReadHooks::new();
    plugin.on_startup(&catalog, &mut hooks)?;

    let content = std::fs::read_to_string(records_path)
        .with_context(|| format!("Failed to read records from {}", records_path))?;
    let mut records: Vec<Record> =
        serde_json::from_str(&content).context("Records must be a JSON array of objects")?;

    info!("Read {} records of {}", records.len(), entity);

    match hooks.after_read(entity, &mut records).await {
        Some(outcome) => info!(
            "{} fields translated, {} skipped, {} failed",
            outcome.translated, outcome.skipped, outcome.failed
        ),
        None => info!("{} has no translatable fields, returning records as read", entity),
    }

    println!("{}", serde_json::to_string_pretty(&records)?);

    let report = plugin.client().metrics().report();
    info!(
        "Translation metrics: {}",
        serde_json::to_string(&report).unwrap_or_default()
    );

    Ok(())
}
