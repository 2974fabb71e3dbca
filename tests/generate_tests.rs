//! Generation Tests
//!
//! End-to-end: fixture package -> flatten -> TypeScript / Rust declarations.

use std::path::Path;

use typeschema_codegen::codegen::{RustGenerator, TypeScriptGenerator};
use typeschema_codegen::{
    generate_all, Backend, CodegenError, DirectoryLoader, FlattenCache, Generator,
    InheritanceGraph, LoadConfig, RenderProfile,
};

const SD: &str = "http://hl7.org/fhir/StructureDefinition/";

fn load(package: &str) -> DirectoryLoader {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(package);
    DirectoryLoader::load(&dir, &LoadConfig::default()).unwrap()
}

// =============================================================================
// TypeScript
// =============================================================================

#[test]
fn test_typescript_profile_extends_resource() {
    let loader = load("r4");
    let cache = FlattenCache::new();
    let generator = TypeScriptGenerator::new(RenderProfile::typescript());
    let genetic = loader.get(&format!("{}familymemberhistory-genetic", SD)).unwrap();

    let flat = cache.flatten_cached(&loader, &genetic).unwrap();
    let out = generator.generate(&flat).unwrap();

    assert_eq!(
        out.declaration,
        format!(
            "/** {}familymemberhistory-genetic */\n\
             export interface FamilymemberhistoryGenetic extends FamilyMemberHistory {{\n    \
             status: string;\n    \
             patient: Reference;\n    \
             date?: string;\n    \
             name?: string;\n    \
             sex?: CodeableConcept;\n    \
             relationship: CodeableConcept;\n\
             }}\n",
            SD
        )
    );

    let imports: Vec<&str> = out.imports.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(imports, vec!["CodeableConcept", "FamilyMemberHistory", "Reference"]);

    let file = generator.render_file(&out);
    assert!(file.starts_with("import type { CodeableConcept } from './CodeableConcept';\n"));
    assert!(file.contains("import type { FamilyMemberHistory } from './FamilyMemberHistory';\n"));
    assert_eq!(generator.file_name(&out.identifier), "FamilymemberhistoryGenetic.ts");
}

#[test]
fn test_intermediate_profile_never_extended() {
    let loader = load("r4");
    let cache = FlattenCache::new();
    let generator = Backend::TypeScript.generator();

    let report = generate_all(&loader, &cache, &loader.schemas(), generator.as_ref());
    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(report.generated.len(), 6);

    for entry in &report.generated {
        assert!(!entry.output.declaration.contains("extends Vitalsigns"));
        assert!(entry.output.imports.iter().all(|i| !i.is_constraint()));
    }

    let bodyweight = report
        .generated
        .iter()
        .find(|e| e.output.identifier.name == "bodyweight")
        .unwrap();
    assert!(bodyweight
        .output
        .declaration
        .contains("export interface Bodyweight extends Observation {\n"));
    assert!(bodyweight.output.declaration.contains("    category: CodeableConcept[];\n"));
    assert!(bodyweight.output.declaration.contains("    valueQuantity?: Quantity;\n"));
}

#[test]
fn test_batch_reuses_shared_ancestors() {
    let loader = load("r4");
    let cache = FlattenCache::new();
    let generator = Backend::TypeScript.generator();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();

    let report = pool.install(|| generate_all(&loader, &cache, &loader.schemas(), generator.as_ref()));
    assert!(report.is_success());

    // each url is flattened once; profiles pick up their cached ancestors
    let stats = cache.stats();
    assert_eq!(stats.misses, 6);
    assert!(stats.hits > 0, "stats: {:?}", stats);
}

// =============================================================================
// Rust
// =============================================================================

#[test]
fn test_rust_profile_struct() {
    let loader = load("r4");
    let cache = FlattenCache::new();
    let generator = RustGenerator::new(RenderProfile::rust());
    let bodyweight = loader.get(&format!("{}bodyweight", SD)).unwrap();

    let flat = cache.flatten_cached(&loader, &bodyweight).unwrap();
    let out = generator.generate(&flat).unwrap();
    let decl = &out.declaration;

    assert!(decl.contains("/// Constrains [`Observation`].\n"));
    assert!(decl.contains("pub struct Bodyweight {\n"));
    assert!(decl.contains("    pub status: String,\n"));
    assert!(decl.contains("    pub subject: Box<Reference>,\n"));
    assert!(decl.contains("    pub category: Vec<CodeableConcept>,\n"));
    assert!(decl.contains("    pub value_quantity: Option<Box<Quantity>>,\n"));

    // inherited members are declared directly; there is no base member
    assert!(decl.contains("    pub code: Box<CodeableConcept>,\n"));
    assert!(!decl.contains("#[serde(flatten)]"));
    assert!(!decl.contains("pub base:"));
    assert_eq!(out.imports.iter().filter(|i| i.name == "Observation").count(), 1);

    let file = generator.render_file(&out);
    assert!(file.starts_with("use serde::{Deserialize, Serialize};\n"));
    assert!(file.contains("use super::observation::Observation;\n"));
    assert!(!file.contains("vitalsigns"));
}

// =============================================================================
// Batch failures and ordering
// =============================================================================

#[test]
fn test_broken_package_reports_every_failure() {
    let loader = load("broken");
    let cache = FlattenCache::new();
    let generator = Backend::TypeScript.generator();

    let report = generate_all(&loader, &cache, &loader.schemas(), generator.as_ref());
    assert!(!report.is_success());

    let generated: Vec<&str> = report
        .generated
        .iter()
        .map(|e| e.output.identifier.name.as_str())
        .collect();
    assert_eq!(generated, vec!["orphan"]);

    let failed: Vec<&str> = report.failed_urls().into_iter().collect();
    assert_eq!(
        failed,
        vec![
            "http://hl7.org/fhir/StructureDefinition/OddTypes",
            "http://hl7.org/fhir/StructureDefinition/child-of-orphan",
            "http://hl7.org/fhir/StructureDefinition/loop-a",
            "http://hl7.org/fhir/StructureDefinition/loop-b",
        ]
    );
    assert!(report.errors.iter().any(|e| matches!(
        e,
        CodegenError::UnmappedPrimitive { field, .. } if field == "amount"
    )));

    // failures are never cached
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_generation_order_and_cycles() {
    let graph = InheritanceGraph::build(&load("r4").schemas());
    let order = graph.generation_order().unwrap();
    let position = |name: &str| order.iter().position(|u| u == &format!("{}{}", SD, name)).unwrap();
    assert!(position("Observation") < position("vitalsigns"));
    assert!(position("vitalsigns") < position("bodyweight"));
    assert!(position("FamilyMemberHistory") < position("familymemberhistory-genetic"));

    let broken = InheritanceGraph::build(&load("broken").schemas());
    assert_eq!(
        broken.cycles(),
        vec![vec![format!("{}loop-a", SD), format!("{}loop-b", SD)]]
    );
    assert!(broken.generation_order().is_err());
}
