//! TypeSchema Codegen
//!
//! Turns a package of type schemas (resources, complex types, primitives and
//! the profiles constraining them) into source-code type declarations.
//!
//! ## Features
//!
//! - **Profile Flattening**: constraint chains collapse into one schema whose base
//!   is the real structural root and whose fields are the merged set of every level
//! - **Injected Loading**: ancestors are resolved through a `SchemaLoader`, never global state
//! - **Run Cache**: flattened schemas are memoized per url and shared across threads
//! - **Multi-Language Output**: TypeScript interfaces and Rust serde structs
//!
//! ## Pipeline
//!
//! ```text
//! SchemaLoader ──> flatten (+ FlattenCache) ──> Generator ──> { declaration, imports }
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod flatten;
pub mod graph;
pub mod loader;
pub mod schema;

pub use codegen::{generate_all, Backend, GeneratedType, GenerationReport, Generator, RenderProfile};
pub use config::TypegenConfig;
pub use error::{CodegenError, Result, SchemaError};
pub use flatten::{ancestor_chain, flatten, FlattenCache};
pub use graph::InheritanceGraph;
pub use loader::{DirectoryLoader, InMemoryLoader, LoadConfig, SchemaLoader};
pub use schema::{FieldDefinition, FlattenedSchema, Identifier, TypeKind, TypeSchema};
