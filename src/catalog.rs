//! Entity metadata as exposed by the serving layer.
//!
//! The serving runtime owns its services and entities; this module only
//! describes the read-only view the translation registry needs, plus a JSON
//! catalog that adapts a compiled schema dump to that view.

use crate::error::{MetadataScanError, StartupError};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Annotation that marks an element for translation on read.
pub const TRANSLATABLE_ANNOTATION: &str = "@translatable";

/// Capability every element representation must offer to be scanned.
pub trait HasTranslatableFlag {
    fn element_name(&self) -> &str;

    /// `Err` when the flag is present but cannot be interpreted as a boolean.
    fn is_translatable(&self) -> std::result::Result<bool, String>;
}

/// Source of service metadata, available once all services are loaded.
pub trait EntityCatalog {
    fn services(&self) -> std::result::Result<&[ServiceDescriptor], StartupError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    /// `None` when the schema loader produced no element list for the entity
    #[serde(default)]
    pub elements: Option<Vec<ElementDescriptor>>,
}

impl EntityDescriptor {
    /// Elements in declaration order.
    pub fn elements(&self) -> std::result::Result<&[ElementDescriptor], MetadataScanError> {
        if self.name.trim().is_empty() {
            return Err(MetadataScanError::new(&self.name, "entity has no name"));
        }
        self.elements
            .as_deref()
            .ok_or_else(|| MetadataScanError::new(&self.name, "missing element list"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementDescriptor {
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
}

impl ElementDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn translatable(name: impl Into<String>) -> Self {
        Self::new(name).with_annotation(TRANSLATABLE_ANNOTATION, Value::Bool(true))
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }
}

impl HasTranslatableFlag for ElementDescriptor {
    fn element_name(&self) -> &str {
        &self.name
    }

    fn is_translatable(&self) -> std::result::Result<bool, String> {
        match self.annotations.get(TRANSLATABLE_ANNOTATION) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(other) => Err(format!(
                "element '{}' has non-boolean {} annotation: {}",
                self.name, TRANSLATABLE_ANNOTATION, other
            )),
        }
    }
}

/// All services of a running application, loaded from a JSON schema dump.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceCatalog {
    pub services: Vec<ServiceDescriptor>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse service catalog")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service catalog {}", path.display()))?;
        Self::from_json_str(&content)
    }
}

impl EntityCatalog for ServiceCatalog {
    fn services(&self) -> std::result::Result<&[ServiceDescriptor], StartupError> {
        Ok(&self.services)
    }
}
