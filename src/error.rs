//! Error types for schema loading, flattening and code generation

use thiserror::Error;

use crate::schema::Identifier;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema loading and flattening errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema not found: {url}")]
    SchemaNotFound { url: String },

    #[error("Cyclic inheritance at {url}: {}", path.join(" -> "))]
    CyclicInheritance { url: String, path: Vec<String> },

    #[error("Malformed schema {url}: {reason}")]
    MalformedSchema { url: String, reason: String },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub(crate) fn not_found(identifier: &Identifier) -> Self {
        SchemaError::SchemaNotFound {
            url: identifier.url.clone(),
        }
    }
}

/// Code generation errors.
///
/// Backends report these per field so a batch run can surface every
/// failure instead of stopping at the first one.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("{schema}: field '{field}' has unmapped primitive type '{}'", type_ref.name)]
    UnmappedPrimitive {
        schema: String,
        field: String,
        type_ref: Identifier,
    },

    #[error("{url}: flattening failed: {source}")]
    Flatten {
        url: String,
        #[source]
        source: SchemaError,
    },
}

impl CodegenError {
    /// Url of the type this error belongs to
    pub fn schema_url(&self) -> &str {
        match self {
            CodegenError::UnmappedPrimitive { schema, .. } => schema,
            CodegenError::Flatten { url, .. } => url,
        }
    }
}
