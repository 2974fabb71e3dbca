//! Schema types and structures
//!
//! `TypeSchema` is what the parsing layer hands over; `FlattenedSchema` is what
//! the flattening engine produces and code generators consume.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    /// Primitive types (string, boolean, dateTime, ...)
    PrimitiveType,
    /// Complex data types (HumanName, Quantity, ...)
    ComplexType,
    /// Resources (Patient, Observation, ...)
    Resource,
    /// Logical models
    Logical,
    /// Profiles constraining another type
    Constraint,
}

impl TypeKind {
    /// Whether this kind is a structural root kind (anything but a constraint)
    pub fn is_structural(&self) -> bool {
        !matches!(self, TypeKind::Constraint)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::PrimitiveType => "primitive-type",
            TypeKind::ComplexType => "complex-type",
            TypeKind::Resource => "resource",
            TypeKind::Logical => "logical",
            TypeKind::Constraint => "constraint",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names a type definition.
///
/// Identity is the canonical `url`: equality, hashing and ordering ignore
/// every other member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    /// Display name (e.g., "Patient", "bodyweight")
    pub name: String,
    /// Package the type comes from (e.g., "hl7.fhir.r4.core")
    pub package: String,
    /// Package version
    pub version: String,
    /// Kind of the type
    pub kind: TypeKind,
    /// Canonical url
    pub url: String,
}

impl Identifier {
    /// Create a new identifier
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        version: impl Into<String>,
        kind: TypeKind,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            version: version.into(),
            kind,
            url: url.into(),
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::PrimitiveType
    }

    pub fn is_constraint(&self) -> bool {
        self.kind == TypeKind::Constraint
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.url.cmp(&other.url)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// A single structural member of a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Referenced type (primitive or named)
    #[serde(rename = "type")]
    pub type_ref: Identifier,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub array: bool,
    /// Auxiliary attributes (binding, fixed value, ...), carried through untouched
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl FieldDefinition {
    /// Create an optional scalar field of the given type
    pub fn new(type_ref: Identifier) -> Self {
        Self {
            type_ref,
            required: false,
            array: false,
            attributes: BTreeMap::new(),
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as a collection
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Attach an auxiliary attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// A type definition as produced by the parsing layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSchema {
    pub identifier: Identifier,
    /// Direct structural parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Identifier>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDefinition>,
}

impl TypeSchema {
    /// Create a schema with no base and no fields
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            base: None,
            fields: IndexMap::new(),
        }
    }

    /// Set the direct parent
    pub fn with_base(mut self, base: Identifier) -> Self {
        self.base = Some(base);
        self
    }

    /// Add (or replace) a field
    pub fn with_field(mut self, name: impl Into<String>, field: FieldDefinition) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// A schema without a base
    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }

    /// A constraint that specializes another type
    pub fn is_profile(&self) -> bool {
        self.identifier.is_constraint() && self.base.is_some()
    }

    pub fn url(&self) -> &str {
        &self.identifier.url
    }
}

/// A self-contained type description.
///
/// `base` is the structural root (never a constraint) and `fields` holds the
/// merged members of the whole ancestor chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedSchema {
    pub identifier: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Identifier>,
    pub fields: IndexMap<String, FieldDefinition>,
}

impl FlattenedSchema {
    /// Wrap an already flat root schema
    pub fn from_root(schema: &TypeSchema) -> Self {
        Self {
            identifier: schema.identifier.clone(),
            base: None,
            fields: schema.fields.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.identifier.url
    }

    /// Every identifier this schema references, `base` first, then field
    /// types in field order
    pub fn referenced_types(&self) -> impl Iterator<Item = &Identifier> {
        self.base
            .iter()
            .chain(self.fields.values().map(|f| &f.type_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ident(name: &str, kind: TypeKind) -> Identifier {
        Identifier::new(
            name,
            "hl7.fhir.r4.core",
            "4.0.1",
            kind,
            format!("http://hl7.org/fhir/StructureDefinition/{}", name),
        )
    }

    #[test]
    fn test_identifier_equality_uses_url() {
        let a = ident("Patient", TypeKind::Resource);
        let mut b = a.clone();
        b.name = "Renamed".to_string();
        b.version = "5.0.0".to_string();
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&TypeKind::PrimitiveType).unwrap();
        assert_eq!(json, "\"primitive-type\"");
        let kind: TypeKind = serde_json::from_str("\"constraint\"").unwrap();
        assert_eq!(kind, TypeKind::Constraint);
    }

    #[test]
    fn test_profile_detection() {
        let observation = TypeSchema::new(ident("Observation", TypeKind::Resource));
        assert!(observation.is_root());
        assert!(!observation.is_profile());

        let vitals = TypeSchema::new(ident("vitalsigns", TypeKind::Constraint))
            .with_base(observation.identifier.clone());
        assert!(vitals.is_profile());
    }

    #[test]
    fn test_field_attributes_roundtrip_through_json() {
        let json = serde_json::json!({
            "identifier": {
                "name": "Patient",
                "package": "hl7.fhir.r4.core",
                "version": "4.0.1",
                "kind": "resource",
                "url": "http://hl7.org/fhir/StructureDefinition/Patient"
            },
            "fields": {
                "gender": {
                    "type": {
                        "name": "code",
                        "package": "hl7.fhir.r4.core",
                        "version": "4.0.1",
                        "kind": "primitive-type",
                        "url": "http://hl7.org/fhir/StructureDefinition/code"
                    },
                    "binding": { "strength": "required" }
                }
            }
        });

        let schema: TypeSchema = serde_json::from_value(json).unwrap();
        let gender = &schema.fields["gender"];
        assert!(!gender.required);
        assert!(!gender.array);
        assert_eq!(gender.attributes["binding"]["strength"], "required");
    }

    #[test]
    fn test_referenced_types_lists_base_first() {
        let flat = FlattenedSchema {
            identifier: ident("bodyweight", TypeKind::Constraint),
            base: Some(ident("Observation", TypeKind::Resource)),
            fields: [(
                "valueQuantity".to_string(),
                FieldDefinition::new(ident("Quantity", TypeKind::ComplexType)),
            )]
            .into_iter()
            .collect(),
        };

        let names: Vec<_> = flat.referenced_types().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Observation", "Quantity"]);
    }
}
