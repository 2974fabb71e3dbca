//! Flattening cache
//!
//! Memoizes flattened schemas by url for one generation run. A profile whose
//! base is itself a cached profile is built from that entry: only the profile's
//! own fields are merged on top, and the rest of the chain is not walked again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, trace};

use super::merge_fields;
use crate::error::{Result, SchemaError};
use crate::loader::SchemaLoader;
use crate::schema::{FieldDefinition, FlattenedSchema, Identifier, TypeSchema};

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Thread-safe flattening cache keyed by schema url.
///
/// Inputs are immutable for a run, so there is no invalidation. Concurrent
/// misses for the same url may both compute; the first insert wins and every
/// caller gets that value.
#[derive(Debug, Default)]
pub struct FlattenCache {
    entries: DashMap<String, Arc<FlattenedSchema>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// Structural root plus the merged fields of everything up to one level
struct ParentLevel {
    root: Identifier,
    fields: IndexMap<String, FieldDefinition>,
}

impl FlattenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `schema`, reusing previous results for it and for its constraint
    /// ancestors.
    ///
    /// The result equals `flatten(loader, schema)`. Errors are returned to the
    /// caller and never cached.
    pub fn flatten_cached<L>(&self, loader: &L, schema: &TypeSchema) -> Result<Arc<FlattenedSchema>>
    where
        L: SchemaLoader + ?Sized,
    {
        self.flatten_level(loader, schema, &mut Vec::new())
    }

    /// `path` holds the urls of the schemas currently being flattened, input first
    fn flatten_level<L>(&self, loader: &L, schema: &TypeSchema, path: &mut Vec<String>) -> Result<Arc<FlattenedSchema>>
    where
        L: SchemaLoader + ?Sized,
    {
        let url = schema.url();
        if path.iter().any(|p| p == url) {
            let mut cycle = path.clone();
            cycle.push(url.to_string());
            return Err(SchemaError::CyclicInheritance {
                url: cycle[0].clone(),
                path: cycle,
            });
        }

        if let Some(hit) = self.cached(url) {
            trace!(%url, "flatten cache hit");
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // Computed without holding a shard lock
        let flattened = match &schema.base {
            None => FlattenedSchema::from_root(schema),
            Some(base) => {
                path.push(url.to_string());
                let parent = self.parent_level(loader, base, path);
                path.pop();
                let parent = parent?;
                FlattenedSchema {
                    identifier: schema.identifier.clone(),
                    base: Some(parent.root),
                    fields: merge_fields([&parent.fields, &schema.fields]),
                }
            }
        };

        let stored = match self.entries.entry(url.to_string()) {
            Entry::Occupied(e) => Arc::clone(e.get()),
            Entry::Vacant(e) => Arc::clone(e.insert(Arc::new(flattened)).value()),
        };
        Ok(stored)
    }

    /// Everything a schema derived from `base` inherits.
    ///
    /// A structural `base` contributes only its own fields. A constraint `base`
    /// contributes its flattened form, taken from the cache when present.
    fn parent_level<L>(&self, loader: &L, base: &Identifier, path: &mut Vec<String>) -> Result<ParentLevel>
    where
        L: SchemaLoader + ?Sized,
    {
        if let Some(hit) = self.entries.get(&base.url).map(|e| Arc::clone(e.value())) {
            match (hit.identifier.is_constraint(), &hit.base) {
                (true, Some(root)) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(base = %base.url, "reused cached ancestor");
                    return Ok(ParentLevel {
                        root: root.clone(),
                        fields: hit.fields.clone(),
                    });
                }
                (true, None) => return Err(missing_base(&hit.identifier)),
                (false, None) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(ParentLevel {
                        root: hit.identifier.clone(),
                        fields: hit.fields.clone(),
                    });
                }
                // Cached fields of a structural type with its own base reach past it
                (false, Some(_)) => {}
            }
        }

        let resolved = loader.resolve(base)?;
        if resolved.identifier.kind.is_structural() {
            debug!(root = %resolved.identifier.url, "resolved structural root");
            return Ok(ParentLevel {
                root: resolved.identifier.clone(),
                fields: resolved.fields.clone(),
            });
        }
        if resolved.base.is_none() {
            return Err(missing_base(&resolved.identifier));
        }

        let flattened = self.flatten_level(loader, &resolved, path)?;
        let root = flattened.base.clone().ok_or_else(|| missing_base(&resolved.identifier))?;
        Ok(ParentLevel {
            root,
            fields: flattened.fields.clone(),
        })
    }

    fn cached(&self, url: &str) -> Option<Arc<FlattenedSchema>> {
        let hit = self.entries.get(url).map(|e| Arc::clone(e.value()))?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(hit)
    }

    /// Previously flattened schema for `url`, if any
    pub fn get(&self, url: &str) -> Option<Arc<FlattenedSchema>> {
        self.entries.get(url).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn missing_base(identifier: &Identifier) -> SchemaError {
    SchemaError::MalformedSchema {
        url: identifier.url.clone(),
        reason: "constraint has no base".to_string(),
    }
}
