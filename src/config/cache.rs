//! Field metadata cache.
//!
//! Discovery metadata (names, categories, kinds) only changes when the
//! document type changes, so it is computed once and reused while the type's
//! structural hash still matches. Values are never cached: every discovery
//! refreshes them from the live document.

use super::fields::{FieldDescriptor, discover_fields, discover_metadata, document_value};
use super::schema::{Reflect, structural_hash_of};
use crate::error::ConfigResult;
use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    /// Metadata-only descriptors (values stripped).
    descriptors: Vec<FieldDescriptor>,
    structural_hash: String,
    timestamp: DateTime<Utc>,
    valid: bool,
}

/// Thread-safe cache of field metadata, keyed by structural hash.
///
/// Concurrent readers share the lock; a refresh after a miss takes it
/// exclusively. The lock is only held to copy descriptors in or out.
#[derive(Debug, Default)]
pub struct FieldCache {
    entry: RwLock<Option<CacheEntry>>,
}

impl FieldCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metadata for `T`, or `None` when empty, invalidated, or cached
    /// for a different shape.
    pub fn get_cached_fields<T: Reflect>(&self) -> Option<Vec<FieldDescriptor>> {
        let live_hash = structural_hash_of::<T>();
        let guard = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        let entry = guard.as_ref()?;

        if !entry.valid || entry.structural_hash != live_hash {
            return None;
        }

        Some(entry.descriptors.iter().map(FieldDescriptor::without_value).collect())
    }

    /// Store metadata for `T`, dropping any values.
    pub fn set_cached_fields<T: Reflect>(&self, descriptors: &[FieldDescriptor]) {
        let entry = CacheEntry {
            descriptors: descriptors.iter().map(FieldDescriptor::without_value).collect(),
            structural_hash: structural_hash_of::<T>(),
            timestamp: Utc::now(),
            valid: true,
        };

        let mut guard = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(entry);
    }

    /// Mark the cached entry invalid.
    pub fn invalidate(&self) {
        let mut guard = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = guard.as_mut() {
            entry.valid = false;
        }
    }

    /// When the current entry was stored, if it is valid.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        let guard = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().filter(|e| e.valid).map(|e| e.timestamp)
    }

    /// Discover the fields of `document`, reusing cached metadata when possible.
    ///
    /// On a hit only the value tree is walked; on a miss the full shape is
    /// walked and its metadata cached.
    pub fn discover<T: Reflect>(&self, document: &T) -> ConfigResult<Vec<FieldDescriptor>> {
        if let Some(mut descriptors) = self.get_cached_fields::<T>() {
            let value = document_value(document)?;
            for descriptor in descriptors.iter_mut() {
                descriptor.refresh_value(&value);
            }
            return Ok(descriptors);
        }

        debug!("field cache miss, running full discovery");
        let descriptors = discover_fields(document)?;
        self.set_cached_fields::<T>(&descriptors);
        Ok(descriptors)
    }

    /// Metadata for `T`, reusing or filling the cache.
    pub fn metadata<T: Reflect>(&self) -> Vec<FieldDescriptor> {
        if let Some(descriptors) = self.get_cached_fields::<T>() {
            return descriptors;
        }

        let descriptors = discover_metadata::<T>();
        self.set_cached_fields::<T>(&descriptors);
        descriptors
    }
}
