//! Translation registry: which fields of which entity are translated on read.
//!
//! Built once from the service catalog when the application has finished
//! loading, immutable afterwards. Reads need no locking.

use crate::catalog::{HasTranslatableFlag, ServiceDescriptor};
use crate::error::MetadataScanError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Service-qualified entity name (`CatalogService.Books`).
///
/// Keys both the registry and the read-hook table.
pub fn qualified_name(service: &str, entity: &str) -> String {
    format!("{}.{}", service, entity)
}

/// One entity and the fields its interceptor translates, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBinding {
    pub service: String,
    pub entity: String,
    pub fields: Vec<String>,
}

impl EntityBinding {
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.service, &self.entity)
    }
}

/// Immutable mapping from qualified entity name to its translatable fields.
///
/// Entity names are unique within a service only, so keys carry the service
/// (`CatalogService.Books`). Only entities with at least one translatable
/// field are present.
#[derive(Debug, Default)]
pub struct TranslationRegistry {
    bindings: BTreeMap<String, Arc<EntityBinding>>,
    skipped: Vec<MetadataScanError>,
}

impl TranslationRegistry {
    /// Scan every entity of every service.
    ///
    /// An entity whose metadata cannot be interpreted is logged and skipped;
    /// the rest of the scan continues.
    pub fn build(services: &[ServiceDescriptor]) -> Self {
        let mut bindings: BTreeMap<String, Arc<EntityBinding>> = BTreeMap::new();
        let mut seen: Vec<String> = Vec::new();
        let mut skipped = Vec::new();

        for service in services {
            for entity in &service.entities {
                let name = qualified_name(&service.name, &entity.name);
                if seen.contains(&name) {
                    let err = MetadataScanError::new(&name, "duplicate entity name in service");
                    warn!("Skipping entity: {}", err);
                    skipped.push(err);
                    continue;
                }

                let fields = entity
                    .elements()
                    .map_err(|err| MetadataScanError::new(&name, err.reason))
                    .and_then(|elements| Self::scan_entity(&name, elements));
                seen.push(name.clone());

                match fields {
                    Ok(fields) if fields.is_empty() => {
                        debug!("{}: no translatable fields", name);
                    }
                    Ok(fields) => {
                        debug!("{}: translatable fields {:?}", name, fields);
                        bindings.insert(
                            name,
                            Arc::new(EntityBinding {
                                service: service.name.clone(),
                                entity: entity.name.clone(),
                                fields,
                            }),
                        );
                    }
                    Err(err) => {
                        warn!("Skipping entity: {}", err);
                        skipped.push(err);
                    }
                }
            }
        }

        Self { bindings, skipped }
    }

    /// Names of the translatable elements, in declaration order, without duplicates.
    pub fn scan_entity<E: HasTranslatableFlag>(
        entity: &str,
        elements: &[E],
    ) -> Result<Vec<String>, MetadataScanError> {
        let mut fields: Vec<String> = Vec::new();

        for element in elements {
            let name = element.element_name();
            if name.trim().is_empty() {
                return Err(MetadataScanError::new(entity, "element without a name"));
            }

            let translatable = element
                .is_translatable()
                .map_err(|reason| MetadataScanError::new(entity, reason))?;

            if translatable && !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }

        Ok(fields)
    }

    pub fn fields(&self, entity: &str) -> Option<&[String]> {
        self.bindings.get(entity).map(|b| b.fields.as_slice())
    }

    pub fn binding(&self, entity: &str) -> Option<Arc<EntityBinding>> {
        self.bindings.get(entity).cloned()
    }

    /// Bindings ordered by qualified name.
    pub fn bindings(&self) -> impl Iterator<Item = &Arc<EntityBinding>> {
        self.bindings.values()
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.bindings.contains_key(entity)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Entities left out because their metadata could not be scanned.
    pub fn skipped(&self) -> &[MetadataScanError] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ElementDescriptor, EntityDescriptor, TRANSLATABLE_ANNOTATION};
    use proptest::prelude::*;
    use serde_json::json;

    fn entity(name: &str, elements: Vec<ElementDescriptor>) -> EntityDescriptor {
        EntityDescriptor {
            name: name.to_string(),
            elements: Some(elements),
        }
    }

    fn service(name: &str, entities: Vec<EntityDescriptor>) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_string(),
            entities,
        }
    }

    fn bookshop() -> Vec<ServiceDescriptor> {
        vec![service(
            "CatalogService",
            vec![
                entity(
                    "Books",
                    vec![
                        ElementDescriptor::new("ID"),
                        ElementDescriptor::new("title"),
                        ElementDescriptor::translatable("description"),
                        ElementDescriptor::translatable("genre"),
                    ],
                ),
                entity(
                    "Authors",
                    vec![ElementDescriptor::new("ID"), ElementDescriptor::new("name")],
                ),
            ],
        )]
    }

    // ==================== Build Tests ====================

    #[test]
    fn test_build_registers_only_entities_with_translatable_fields() {
        let registry = TranslationRegistry::build(&bookshop());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("CatalogService.Books"));
        assert!(!registry.contains("CatalogService.Authors"));
        assert!(registry.fields("CatalogService.Authors").is_none());
        assert!(!registry.contains("Books"));
    }

    #[test]
    fn test_build_preserves_declaration_order() {
        let registry = TranslationRegistry::build(&bookshop());

        assert_eq!(
            registry.fields("CatalogService.Books").unwrap(),
            &["description".to_string(), "genre".to_string()]
        );
    }

    #[test]
    fn test_build_empty_catalog() {
        let registry = TranslationRegistry::build(&[]);
        assert!(registry.is_empty());
        assert!(registry.skipped().is_empty());
    }

    #[test]
    fn test_bindings_are_independent_per_entity() {
        let services = vec![service(
            "S",
            vec![
                entity("A", vec![ElementDescriptor::translatable("x")]),
                entity("B", vec![ElementDescriptor::translatable("y")]),
            ],
        )];
        let registry = TranslationRegistry::build(&services);

        let a = registry.binding("S.A").unwrap();
        let b = registry.binding("S.B").unwrap();
        assert_eq!(a.service, "S");
        assert_eq!(a.entity, "A");
        assert_eq!(a.qualified_name(), "S.A");
        assert_eq!(a.fields, vec!["x".to_string()]);
        assert_eq!(b.entity, "B");
        assert_eq!(b.fields, vec!["y".to_string()]);
    }

    #[test]
    fn test_bindings_iterate_in_name_order() {
        let services = vec![service(
            "S",
            vec![
                entity("Zebra", vec![ElementDescriptor::translatable("x")]),
                entity("Apple", vec![ElementDescriptor::translatable("y")]),
            ],
        )];
        let registry = TranslationRegistry::build(&services);

        let names: Vec<&str> = registry.bindings().map(|b| b.entity.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zebra"]);
    }

    // ==================== Malformed Metadata Tests ====================

    #[test]
    fn test_malformed_entity_is_skipped_without_aborting_scan() {
        let services = vec![service(
            "CatalogService",
            vec![
                entity(
                    "Broken",
                    vec![ElementDescriptor::new("summary")
                        .with_annotation(TRANSLATABLE_ANNOTATION, json!(1))],
                ),
                entity("Books", vec![ElementDescriptor::translatable("description")]),
            ],
        )];

        let registry = TranslationRegistry::build(&services);

        assert!(!registry.contains("CatalogService.Broken"));
        assert!(registry.contains("CatalogService.Books"));
        assert_eq!(registry.skipped().len(), 1);
        assert_eq!(registry.skipped()[0].entity, "CatalogService.Broken");
    }

    #[test]
    fn test_missing_elements_are_skipped() {
        let services = vec![service(
            "S",
            vec![
                EntityDescriptor {
                    name: "NoElements".to_string(),
                    elements: None,
                },
                entity("Books", vec![ElementDescriptor::translatable("description")]),
            ],
        )];

        let registry = TranslationRegistry::build(&services);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.skipped()[0].entity, "S.NoElements");
    }

    #[test]
    fn test_same_entity_name_in_two_services_registers_both() {
        let services = vec![
            service(
                "CatalogService",
                vec![entity("Books", vec![ElementDescriptor::translatable("title")])],
            ),
            service(
                "AdminService",
                vec![entity("Books", vec![ElementDescriptor::translatable("description")])],
            ),
        ];

        let registry = TranslationRegistry::build(&services);

        assert!(registry.skipped().is_empty());
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.fields("CatalogService.Books").unwrap(),
            &["title".to_string()]
        );
        assert_eq!(
            registry.fields("AdminService.Books").unwrap(),
            &["description".to_string()]
        );
    }

    #[test]
    fn test_duplicate_entity_within_a_service_keeps_first() {
        let services = vec![service(
            "CatalogService",
            vec![
                entity("Books", vec![ElementDescriptor::translatable("title")]),
                entity("Books", vec![ElementDescriptor::translatable("description")]),
            ],
        )];

        let registry = TranslationRegistry::build(&services);
        assert_eq!(
            registry.fields("CatalogService.Books").unwrap(),
            &["title".to_string()]
        );
        assert_eq!(registry.skipped().len(), 1);
        assert_eq!(registry.skipped()[0].entity, "CatalogService.Books");
    }

    #[test]
    fn test_scan_entity_rejects_unnamed_element() {
        let err = TranslationRegistry::scan_entity("Books", &[ElementDescriptor::translatable("")])
            .unwrap_err();
        assert_eq!(err.entity, "Books");
    }

    #[test]
    fn test_scan_entity_deduplicates_fields() {
        let fields = TranslationRegistry::scan_entity(
            "Books",
            &[
                ElementDescriptor::translatable("description"),
                ElementDescriptor::translatable("description"),
            ],
        )
        .unwrap();
        assert_eq!(fields, vec!["description".to_string()]);
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_entity_registered_iff_it_has_a_translatable_field(
            flags in prop::collection::vec(prop::collection::vec(any::<bool>(), 0..6), 0..8)
        ) {
            let entities: Vec<EntityDescriptor> = flags
                .iter()
                .enumerate()
                .map(|(i, element_flags)| {
                    let elements = element_flags
                        .iter()
                        .enumerate()
                        .map(|(j, flag)| {
                            ElementDescriptor::new(format!("f{}", j))
                                .with_annotation(TRANSLATABLE_ANNOTATION, json!(*flag))
                        })
                        .collect();
                    entity(&format!("E{}", i), elements)
                })
                .collect();

            let registry = TranslationRegistry::build(&[service("S", entities)]);

            for (i, element_flags) in flags.iter().enumerate() {
                let expected: Vec<String> = element_flags
                    .iter()
                    .enumerate()
                    .filter(|(_, flag)| **flag)
                    .map(|(j, _)| format!("f{}", j))
                    .collect();
                let name = format!("S.E{}", i);

                if expected.is_empty() {
                    prop_assert!(!registry.contains(&name));
                } else {
                    prop_assert_eq!(registry.fields(&name).unwrap(), expected.as_slice());
                }
            }
        }
    }
}
