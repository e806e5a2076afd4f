//! Language codes: validated tags for the source and target of a translation.
//!
//! The backend decides which languages it actually supports, so validation
//! here is syntactic only: a 2-3 letter lowercase primary subtag with an
//! optional region or script subtag (`en`, `pt-BR`, `zh-Hant`).

use anyhow::{bail, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

static CODE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn code_pattern() -> &'static Regex {
    CODE_PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]{2,3}(-([A-Z]{2}|[A-Z][a-z]{3}|[0-9]{3}))?$")
            .expect("language code pattern is valid")
    })
}

/// A syntactically valid language code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Source language used when none is configured.
    pub const DEFAULT_SOURCE: &'static str = "en";

    /// Parse a language code, trimming surrounding whitespace.
    ///
    /// # Example
    /// ```ignore
    /// let italian = LanguageCode::parse("it")?;
    /// ```
    pub fn parse(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            bail!("Language code must not be empty");
        }
        if !code_pattern().is_match(code) {
            bail!("Invalid language code: '{}'", code);
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The process-wide source/target pair every interceptor translates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        Self { source, target }
    }

    /// Source and target are the same, so every value is already "translated".
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}
