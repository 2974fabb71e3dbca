//! Code Generation
//!
//! Renders flattened schemas as type declarations.
//!
//! Architecture:
//! - Generator: one implementation per target language, behind one contract
//! - RenderProfile: per-language type mappings and optional/keyword rules
//! - generate_all: batch driver that flattens (cached) and renders in parallel
//!
//! The key constraint: generators only ever see `FlattenedSchema`. Profile and
//! constraint semantics are resolved before emission and never leak into a backend.

pub mod config;
pub mod names;
pub mod rust;
pub mod typescript;

pub use config::{Language, OptionalRepr, RenderProfile};
pub use rust::RustGenerator;
pub use typescript::TypeScriptGenerator;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CodegenError;
use crate::flatten::FlattenCache;
use crate::loader::SchemaLoader;
use crate::schema::{FieldDefinition, FlattenedSchema, Identifier, TypeSchema};

// =============================================================================
// Generator contract
// =============================================================================

/// Output of one generator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedType {
    /// The type being declared
    pub identifier: Identifier,
    /// Declaration source text
    pub declaration: String,
    /// Types referenced by the declaration (base and non-primitive field types)
    pub imports: BTreeSet<Identifier>,
}

/// A target-language backend
pub trait Generator: Send + Sync {
    /// Language this generator emits
    fn language(&self) -> Language;

    /// Render one flattened schema.
    ///
    /// Every field that cannot be rendered is reported; a partial declaration
    /// is never returned.
    fn generate(&self, schema: &FlattenedSchema) -> Result<GeneratedType, Vec<CodegenError>>;

    /// File name (without directory) for the declaration of `identifier`
    fn file_name(&self, identifier: &Identifier) -> String;

    /// Full file contents: import statements for sibling files, then the declaration
    fn render_file(&self, generated: &GeneratedType) -> String;
}

/// Available backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    #[value(name = "typescript")]
    TypeScript,
    #[value(name = "rust")]
    Rust,
}

impl Backend {
    /// Generator with the backend's default render profile
    pub fn generator(self) -> Box<dyn Generator> {
        match self {
            Backend::TypeScript => Box::new(TypeScriptGenerator::new(RenderProfile::typescript())),
            Backend::Rust => Box::new(RustGenerator::new(RenderProfile::rust())),
        }
    }
}

// =============================================================================
// Field type resolution
// =============================================================================

/// A field type resolved for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedType {
    /// Rendered element type (before optional/array wrapping)
    pub rendered: String,
    /// Whether the element type is a named (non-primitive) type
    pub named: bool,
}

/// Resolve a field's element type, registering a named type in `imports`.
pub(crate) fn resolve_field_type(
    profile: &RenderProfile,
    schema: &FlattenedSchema,
    field_name: &str,
    field: &FieldDefinition,
    imports: &mut BTreeSet<Identifier>,
) -> Result<ResolvedType, CodegenError> {
    let type_ref = &field.type_ref;
    if type_ref.is_primitive() {
        return profile
            .primitive_type(&type_ref.name)
            .map(|t| ResolvedType {
                rendered: t.to_string(),
                named: false,
            })
            .ok_or_else(|| CodegenError::UnmappedPrimitive {
                schema: schema.identifier.url.clone(),
                field: field_name.to_string(),
                type_ref: type_ref.clone(),
            });
    }

    if type_ref != &schema.identifier {
        imports.insert(type_ref.clone());
    }
    Ok(ResolvedType {
        rendered: type_name(profile, type_ref),
        named: true,
    })
}

/// Declared type name for an identifier
pub(crate) fn type_name(profile: &RenderProfile, identifier: &Identifier) -> String {
    profile.escape_keyword(&names::to_pascal_case(&identifier.name))
}

// =============================================================================
// Batch generation
// =============================================================================

/// One successfully generated type
#[derive(Debug, Clone)]
pub struct GeneratedEntry {
    pub schema: Arc<FlattenedSchema>,
    pub output: GeneratedType,
}

/// Result of a batch run: every success and every failure
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Successes, ordered by url
    pub generated: Vec<GeneratedEntry>,
    /// Failures, ordered by schema url (field order within a schema)
    pub errors: Vec<CodegenError>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Urls of the schemas that failed
    pub fn failed_urls(&self) -> BTreeSet<&str> {
        self.errors.iter().map(|e| e.schema_url()).collect()
    }

    /// Output file names claimed by more than one generated type, with the
    /// urls of the claimants in url order
    pub fn file_collisions(&self, generator: &dyn Generator) -> BTreeMap<String, Vec<&str>> {
        let mut claims: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for entry in &self.generated {
            claims
                .entry(generator.file_name(&entry.output.identifier))
                .or_default()
                .push(entry.schema.url());
        }
        claims.retain(|_, urls| urls.len() > 1);
        claims
    }
}

/// Flatten and generate every schema in `schemas`.
///
/// Schemas are processed in parallel; the cache is shared between workers.
/// Failures of one schema never stop the others.
pub fn generate_all<L>(
    loader: &L,
    cache: &FlattenCache,
    schemas: &[Arc<TypeSchema>],
    generator: &dyn Generator,
) -> GenerationReport
where
    L: SchemaLoader + ?Sized,
{
    let results: Vec<Result<GeneratedEntry, Vec<CodegenError>>> = schemas
        .par_iter()
        .map(|schema| -> Result<GeneratedEntry, Vec<CodegenError>> {
            let flattened = cache.flatten_cached(loader, schema).map_err(|source| {
                vec![CodegenError::Flatten {
                    url: schema.identifier.url.clone(),
                    source,
                }]
            })?;
            let output = generator.generate(&flattened)?;
            debug!(url = %schema.identifier.url, imports = output.imports.len(), "generated type");
            Ok(GeneratedEntry {
                schema: flattened,
                output,
            })
        })
        .collect();

    let mut report = GenerationReport::default();
    for result in results {
        match result {
            Ok(entry) => report.generated.push(entry),
            Err(errors) => report.errors.extend(errors),
        }
    }
    report
        .generated
        .sort_by(|a, b| a.schema.identifier.url.cmp(&b.schema.identifier.url));
    report
        .errors
        .sort_by(|a, b| a.schema_url().cmp(b.schema_url()));

    let stats = cache.stats();
    info!(
        generated = report.generated.len(),
        failed = report.failed_urls().len(),
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "generation finished"
    );
    report
}
