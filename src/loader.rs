//! Schema Loading
//!
//! The flattening engine resolves ancestors through the `SchemaLoader` trait and
//! never touches storage itself. Two loaders ship with the crate:
//! - `InMemoryLoader`: schemas registered programmatically (tests, embedders)
//! - `DirectoryLoader`: TypeSchema JSON documents read from a directory tree

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};
use crate::schema::{Identifier, TypeSchema};

/// Resolves an identifier to the schema registered for its url.
///
/// Implementations must be deterministic for the duration of a generation run.
pub trait SchemaLoader: Send + Sync {
    /// Look up the schema whose identifier url equals `identifier.url`
    fn resolve(&self, identifier: &Identifier) -> Result<Arc<TypeSchema>>;
}

impl<L: SchemaLoader + ?Sized> SchemaLoader for &L {
    fn resolve(&self, identifier: &Identifier) -> Result<Arc<TypeSchema>> {
        (**self).resolve(identifier)
    }
}

impl<L: SchemaLoader + ?Sized> SchemaLoader for Arc<L> {
    fn resolve(&self, identifier: &Identifier) -> Result<Arc<TypeSchema>> {
        (**self).resolve(identifier)
    }
}

impl<L: SchemaLoader + ?Sized> SchemaLoader for Box<L> {
    fn resolve(&self, identifier: &Identifier) -> Result<Arc<TypeSchema>> {
        (**self).resolve(identifier)
    }
}

// =============================================================================
// In-memory loader
// =============================================================================

/// Loader backed by a map from url to schema
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    schemas: HashMap<String, Arc<TypeSchema>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a loader from a set of schemas
    pub fn from_schemas(schemas: impl IntoIterator<Item = TypeSchema>) -> Self {
        let mut loader = Self::new();
        for schema in schemas {
            loader.register(schema);
        }
        loader
    }

    /// Register a schema, replacing any schema previously registered under the same url
    pub fn register(&mut self, schema: TypeSchema) {
        let url = schema.identifier.url.clone();
        if self.schemas.insert(url.clone(), Arc::new(schema)).is_some() {
            debug!(%url, "replaced registered schema");
        }
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All registered schemas, sorted by url
    pub fn schemas(&self) -> Vec<Arc<TypeSchema>> {
        sorted_schemas(&self.schemas)
    }
}

impl SchemaLoader for InMemoryLoader {
    fn resolve(&self, identifier: &Identifier) -> Result<Arc<TypeSchema>> {
        self.schemas
            .get(&identifier.url)
            .cloned()
            .ok_or_else(|| SchemaError::not_found(identifier))
    }
}

fn sorted_schemas(map: &HashMap<String, Arc<TypeSchema>>) -> Vec<Arc<TypeSchema>> {
    let mut schemas: Vec<_> = map.values().cloned().collect();
    schemas.sort_by(|a, b| a.identifier.url.cmp(&b.identifier.url));
    schemas
}

// =============================================================================
// Directory loader
// =============================================================================

/// Configuration for directory loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip files matching these path prefixes
    pub skip_prefixes: Vec<String>,
    /// Only load files matching these path prefixes
    pub include_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
            include_prefixes: Vec::new(),
        }
    }
}

impl LoadConfig {
    fn accepts(&self, relative: &str) -> bool {
        if !self.include_prefixes.is_empty()
            && !self.include_prefixes.iter().any(|p| relative.starts_with(p))
        {
            return false;
        }
        !self.skip_prefixes.iter().any(|p| relative.starts_with(p))
    }
}

/// Loader over a directory of TypeSchema JSON documents.
///
/// Everything is read eagerly so resolution is a pure map lookup.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    schemas: HashMap<String, Arc<TypeSchema>>,
    bundle_hash: String,
}

impl DirectoryLoader {
    /// Load every `*.json` file under `schema_dir`.
    ///
    /// `schema_dir` must be an existing directory; unreadable entries below it
    /// are errors rather than skipped files.
    pub fn load(schema_dir: &Path, config: &LoadConfig) -> Result<Self> {
        if !schema_dir.is_dir() {
            return Err(SchemaError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("schema directory not found: {}", schema_dir.display()),
            )));
        }

        let mut schemas = HashMap::new();
        let mut hasher = Sha256::new();

        for entry in WalkDir::new(schema_dir).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }

            let relative = path
                .strip_prefix(schema_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            if !config.accepts(&relative) {
                continue;
            }

            let content = fs::read_to_string(path)?;
            hasher.update(content.as_bytes());

            let schema: TypeSchema = serde_json::from_str(&content).map_err(|e| {
                SchemaError::InvalidFormat(format!("{}: {}", path.display(), e))
            })?;

            let url = schema.identifier.url.clone();
            if schemas.insert(url.clone(), Arc::new(schema)).is_some() {
                warn!(%url, file = %relative, "duplicate schema url, later file wins");
            }
        }

        let bundle_hash = format!("{:x}", hasher.finalize());
        debug!(count = schemas.len(), %bundle_hash, dir = %schema_dir.display(), "loaded schemas");

        Ok(Self {
            schemas,
            bundle_hash,
        })
    }

    /// SHA-256 over the contents of every loaded file, in path order
    pub fn bundle_hash(&self) -> &str {
        &self.bundle_hash
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All loaded schemas, sorted by url
    pub fn schemas(&self) -> Vec<Arc<TypeSchema>> {
        sorted_schemas(&self.schemas)
    }

    /// Look up a schema by url
    pub fn get(&self, url: &str) -> Option<Arc<TypeSchema>> {
        self.schemas.get(url).cloned()
    }
}

impl SchemaLoader for DirectoryLoader {
    fn resolve(&self, identifier: &Identifier) -> Result<Arc<TypeSchema>> {
        self.get(&identifier.url)
            .ok_or_else(|| SchemaError::not_found(identifier))
    }
}
