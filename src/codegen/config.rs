//! Render profiles
//!
//! Per-language rendering configuration: primitive type mappings, how optional
//! members are represented, and keyword escaping. Flattening is config-free;
//! only emission reads a profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Supported target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
}

/// Representation of optional members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalRepr {
    /// Rust: Option<T>
    Option,
    /// TypeScript: foo?: T
    QuestionMark,
    /// TypeScript: foo: T | undefined
    UnionUndefined,
}

/// Language-specific rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderProfile {
    pub language: Language,

    /// Primitive type name (as in `Identifier::name`) -> language type
    pub primitives: BTreeMap<String, String>,

    /// How to represent members that are not required
    pub optional: OptionalRepr,

    /// Prefix for names that collide with keywords
    pub keyword_escape: String,
}

// =============================================================================
// Default Profiles
// =============================================================================

/// FHIR primitives and their TypeScript / Rust renderings
const PRIMITIVES: &[(&str, &str, &str)] = &[
    ("base64Binary", "string", "String"),
    ("boolean", "boolean", "bool"),
    ("canonical", "string", "String"),
    ("code", "string", "String"),
    ("date", "string", "String"),
    ("dateTime", "string", "String"),
    ("decimal", "number", "f64"),
    ("id", "string", "String"),
    ("instant", "string", "String"),
    ("integer", "number", "i32"),
    ("integer64", "string", "i64"),
    ("markdown", "string", "String"),
    ("oid", "string", "String"),
    ("positiveInt", "number", "u32"),
    ("string", "string", "String"),
    ("time", "string", "String"),
    ("unsignedInt", "number", "u32"),
    ("uri", "string", "String"),
    ("url", "string", "String"),
    ("uuid", "string", "String"),
    ("xhtml", "string", "String"),
];

impl RenderProfile {
    /// Default TypeScript profile
    pub fn typescript() -> Self {
        Self {
            language: Language::TypeScript,
            primitives: PRIMITIVES
                .iter()
                .map(|(name, ts, _)| (name.to_string(), ts.to_string()))
                .collect(),
            optional: OptionalRepr::QuestionMark,
            keyword_escape: "_".to_string(),
        }
    }

    /// Default Rust profile
    pub fn rust() -> Self {
        Self {
            language: Language::Rust,
            primitives: PRIMITIVES
                .iter()
                .map(|(name, _, rust)| (name.to_string(), rust.to_string()))
                .collect(),
            optional: OptionalRepr::Option,
            keyword_escape: "r#".to_string(),
        }
    }

    /// Add or replace a primitive mapping
    pub fn with_primitive(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.primitives.insert(name.into(), target.into());
        self
    }
}

// =============================================================================
// Render Helpers
// =============================================================================

impl RenderProfile {
    /// Language type for a primitive, if mapped
    pub fn primitive_type(&self, name: &str) -> Option<&str> {
        self.primitives.get(name).map(String::as_str)
    }

    /// Escape a keyword if needed
    pub fn escape_keyword(&self, name: &str) -> String {
        let keywords = match self.language {
            Language::Rust => RUST_KEYWORDS,
            Language::TypeScript => TS_RESERVED_TYPE_NAMES,
        };

        if keywords.contains(&name) {
            format!("{}{}", self.keyword_escape, name)
        } else {
            name.to_string()
        }
    }

    /// Wrap a type to make it optional.
    ///
    /// `QuestionMark` leaves the type alone; the member itself is marked.
    pub fn wrap_optional(&self, type_str: &str) -> String {
        match self.optional {
            OptionalRepr::Option => format!("Option<{}>", type_str),
            OptionalRepr::QuestionMark => type_str.to_string(),
            OptionalRepr::UnionUndefined => format!("{} | undefined", type_str),
        }
    }

    /// Wrap a type in a collection
    pub fn wrap_array(&self, type_str: &str) -> String {
        match self.language {
            Language::Rust => format!("Vec<{}>", type_str),
            Language::TypeScript if type_str.contains(' ') => format!("({})[]", type_str),
            Language::TypeScript => format!("{}[]", type_str),
        }
    }

    /// Wrap a type in Box (Rust only, for recursion)
    pub fn wrap_box(&self, type_str: &str) -> String {
        match self.language {
            Language::Rust => format!("Box<{}>", type_str),
            Language::TypeScript => type_str.to_string(),
        }
    }
}

// =============================================================================
// Keywords
// =============================================================================

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
    "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Names TypeScript rejects as interface names
const TS_RESERVED_TYPE_NAMES: &[&str] = &[
    "any", "boolean", "never", "number", "object", "string", "symbol",
    "undefined", "unknown", "void",
];
