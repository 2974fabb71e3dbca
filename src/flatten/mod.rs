//! Profile Flattening
//!
//! Resolves a constraint chain into one self-contained schema:
//! - `base` becomes the nearest non-constraint ancestor (the structural root)
//! - `fields` becomes the merge of every level, most-derived level winning
//!
//! Intermediate constraints only contribute field refinements. They never show
//! up as a declared parent, so generated code extends the real resource or
//! complex type.

pub mod cache;

pub use cache::{CacheStats, FlattenCache};

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{Result, SchemaError};
use crate::loader::SchemaLoader;
use crate::schema::{FieldDefinition, FlattenedSchema, TypeSchema};

/// Resolve the ancestors of `schema`, nearest first.
///
/// The walk starts at `schema.base` and stops at the first ancestor whose kind
/// is not `constraint`; that ancestor is the last element. Returns an empty
/// chain for root schemas.
///
/// Fails with `CyclicInheritance` if an identifier (including the schema's own)
/// is reached twice, and with `MalformedSchema` if a constraint ancestor has no base.
pub fn ancestor_chain<L>(loader: &L, schema: &TypeSchema) -> Result<Vec<Arc<TypeSchema>>>
where
    L: SchemaLoader + ?Sized,
{
    let mut chain: Vec<Arc<TypeSchema>> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut path: Vec<String> = vec![schema.identifier.url.clone()];
    visited.insert(schema.identifier.url.clone());

    let Some(mut current) = schema.base.clone() else {
        return Ok(chain);
    };

    loop {
        path.push(current.url.clone());
        if !visited.insert(current.url.clone()) {
            return Err(SchemaError::CyclicInheritance {
                url: schema.identifier.url.clone(),
                path,
            });
        }

        let resolved = loader.resolve(&current)?;
        trace!(from = %schema.identifier.url, ancestor = %resolved.identifier.url, "resolved ancestor");
        chain.push(Arc::clone(&resolved));

        if resolved.identifier.kind.is_structural() {
            debug!(
                schema = %schema.identifier.url,
                root = %resolved.identifier.url,
                depth = chain.len(),
                "resolved structural root"
            );
            return Ok(chain);
        }

        match &resolved.base {
            Some(next) => current = next.clone(),
            None => {
                return Err(SchemaError::MalformedSchema {
                    url: resolved.identifier.url.clone(),
                    reason: "constraint has no base".to_string(),
                })
            }
        }
    }
}

/// Flatten `schema` against the ancestors available through `loader`.
///
/// Root schemas come back unchanged (no base, same fields). Anything else gets
/// the structural root as `base` and the merged field set of the full chain.
pub fn flatten<L>(loader: &L, schema: &TypeSchema) -> Result<FlattenedSchema>
where
    L: SchemaLoader + ?Sized,
{
    if schema.is_root() {
        return Ok(FlattenedSchema::from_root(schema));
    }

    let chain = ancestor_chain(loader, schema)?;
    let root = chain
        .last()
        .map(|s| s.identifier.clone())
        .ok_or_else(|| SchemaError::MalformedSchema {
            url: schema.identifier.url.clone(),
            reason: "empty ancestor chain".to_string(),
        })?;

    let levels = chain
        .iter()
        .rev()
        .map(|s| &s.fields)
        .chain(std::iter::once(&schema.fields));

    Ok(FlattenedSchema {
        identifier: schema.identifier.clone(),
        base: Some(root),
        fields: merge_fields(levels),
    })
}

/// Merge field maps ordered least-derived first.
///
/// A field at a later level replaces the same-named field wholesale; there is
/// no attribute-wise narrowing. Replaced fields keep the position where the
/// name first appeared, new names are appended.
pub fn merge_fields<'a, I>(levels: I) -> IndexMap<String, FieldDefinition>
where
    I: IntoIterator<Item = &'a IndexMap<String, FieldDefinition>>,
{
    let mut merged = IndexMap::new();
    for level in levels {
        for (name, field) in level {
            merged.insert(name.clone(), field.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::InMemoryLoader;
    use crate::schema::{Identifier, TypeKind};

    fn ident(name: &str, kind: TypeKind) -> Identifier {
        Identifier::new(
            name,
            "hl7.fhir.r4.core",
            "4.0.1",
            kind,
            format!("http://hl7.org/fhir/StructureDefinition/{}", name),
        )
    }

    fn string() -> FieldDefinition {
        FieldDefinition::new(ident("string", TypeKind::PrimitiveType))
    }

    #[test]
    fn test_root_is_returned_unchanged() {
        let patient = TypeSchema::new(ident("Patient", TypeKind::Resource))
            .with_field("name", string().array())
            .with_field("active", string());
        let loader = InMemoryLoader::new();

        let flat = flatten(&loader, &patient).unwrap();
        assert!(flat.base.is_none());
        assert_eq!(flat.fields, patient.fields);
        assert_eq!(flat.identifier, patient.identifier);
    }

    #[test]
    fn test_chain_is_nearest_first() {
        let r = TypeSchema::new(ident("R", TypeKind::Resource));
        let c1 = TypeSchema::new(ident("C1", TypeKind::Constraint)).with_base(r.identifier.clone());
        let c2 = TypeSchema::new(ident("C2", TypeKind::Constraint)).with_base(c1.identifier.clone());
        let loader = InMemoryLoader::from_schemas([r, c1, c2.clone()]);

        let chain = ancestor_chain(&loader, &c2).unwrap();
        let names: Vec<_> = chain.iter().map(|s| s.identifier.name.as_str()).collect();
        assert_eq!(names, vec!["C1", "R"]);
    }

    #[test]
    fn test_walk_stops_at_first_structural_ancestor() {
        // DomainResource is itself based on Resource, but the walk must not go past it
        let resource = TypeSchema::new(ident("Resource", TypeKind::Resource))
            .with_field("id", string());
        let domain = TypeSchema::new(ident("DomainResource", TypeKind::Resource))
            .with_base(resource.identifier.clone())
            .with_field("text", string());
        let profile = TypeSchema::new(ident("p", TypeKind::Constraint))
            .with_base(domain.identifier.clone());
        let loader = InMemoryLoader::from_schemas([resource, domain, profile.clone()]);

        let flat = flatten(&loader, &profile).unwrap();
        assert_eq!(flat.base.as_ref().unwrap().name, "DomainResource");
        assert!(flat.fields.contains_key("text"));
        assert!(!flat.fields.contains_key("id"));
    }

    #[test]
    fn test_override_replaces_whole_field() {
        let r = TypeSchema::new(ident("R", TypeKind::Resource)).with_field(
            "status",
            string().with_attribute("binding", serde_json::json!({"strength": "required"})),
        );
        let c = TypeSchema::new(ident("C", TypeKind::Constraint))
            .with_base(r.identifier.clone())
            .with_field("status", string().required());
        let loader = InMemoryLoader::from_schemas([r, c.clone()]);

        let flat = flatten(&loader, &c).unwrap();
        let status = &flat.fields["status"];
        assert!(status.required);
        assert!(status.attributes.is_empty());
    }

    #[test]
    fn test_merge_keeps_first_position() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), string());
        a.insert("y".to_string(), string());
        let mut b = IndexMap::new();
        b.insert("z".to_string(), string());
        b.insert("x".to_string(), string().required());

        let merged = merge_fields([&a, &b]);
        let names: Vec<_> = merged.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert!(merged["x"].required);
    }

    #[test]
    fn test_self_cycle_detected() {
        let mut c = TypeSchema::new(ident("C", TypeKind::Constraint));
        c.base = Some(c.identifier.clone());
        let loader = InMemoryLoader::from_schemas([c.clone()]);

        let err = flatten(&loader, &c).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicInheritance { .. }));
    }

    #[test]
    fn test_constraint_without_base_is_malformed() {
        let orphan = TypeSchema::new(ident("orphan", TypeKind::Constraint));
        let child = TypeSchema::new(ident("child", TypeKind::Constraint))
            .with_base(orphan.identifier.clone());
        let loader = InMemoryLoader::from_schemas([orphan, child.clone()]);

        let err = flatten(&loader, &child).unwrap_err();
        match err {
            SchemaError::MalformedSchema { url, .. } => assert!(url.ends_with("/orphan")),
            other => panic!("Expected MalformedSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_ancestor_propagates() {
        let c = TypeSchema::new(ident("C", TypeKind::Constraint))
            .with_base(ident("Missing", TypeKind::Resource));
        let loader = InMemoryLoader::from_schemas([c.clone()]);

        let err = flatten(&loader, &c).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaNotFound { .. }));
    }
}
