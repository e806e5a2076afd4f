//! Translate annotated entity fields on read.
//!
//! At startup [`plugin::TranslationPlugin::on_startup`] scans the service
//! catalog for elements annotated `@translatable` and attaches one
//! [`interceptor::TranslationInterceptor`] per entity to the read hooks.
//! Every read batch then has those fields rewritten into the target language
//! through a shared, caching [`client::TranslationClient`].

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod i18n;
pub mod interceptor;
pub mod plugin;
pub mod registry;
pub mod retry;
