//! Keyed storage shared by the tool, prompt and resource registries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::RegistrationError;

/// A descriptor that knows the key it is registered under.
pub trait Keyed {
    /// Capability kind, used in error messages ("tool", "prompt", "resource")
    const KIND: &'static str;

    /// Name of the key field, used in error messages
    const KEY_FIELD: &'static str;

    /// The registration key
    fn key(&self) -> &str;
}

struct Entry<D, H: ?Sized> {
    descriptor: D,
    handler: Arc<H>,
}

/// Registry mapping a key to its descriptor and handler.
///
/// Descriptor and handler live in the same entry so they are always inserted,
/// replaced and looked up together. Each registration is a single write-locked
/// insert; lookups clone out of a read lock and never hold it past return.
pub struct Registry<D, H: ?Sized> {
    entries: RwLock<HashMap<String, Entry<D, H>>>,
}

impl<D, H: ?Sized> Default for Registry<D, H> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<D, H: ?Sized> std::fmt::Debug for Registry<D, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        f.debug_struct("Registry").field("keys", &keys).finish()
    }
}

impl<D: Keyed + Clone, H: ?Sized> Registry<D, H> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor and its handler, replacing any previous entry under the same key.
    ///
    /// Returns the descriptor unchanged.
    pub fn register(&self, descriptor: D, handler: Arc<H>) -> Result<D, RegistrationError> {
        if descriptor.key().is_empty() {
            return Err(RegistrationError::EmptyKey {
                kind: D::KIND,
                field: D::KEY_FIELD,
            });
        }

        let key = descriptor.key().to_string();
        let previous = self.entries.write().insert(
            key.clone(),
            Entry {
                descriptor: descriptor.clone(),
                handler,
            },
        );

        if previous.is_some() {
            tracing::debug!(kind = D::KIND, key = %key, "Replaced existing registration");
        } else {
            tracing::trace!(kind = D::KIND, key = %key, "Registered capability");
        }

        Ok(descriptor)
    }

    /// Get a copy of the descriptor registered under `key`
    pub fn get(&self, key: &str) -> Option<D> {
        self.entries.read().get(key).map(|e| e.descriptor.clone())
    }

    /// Get the handler registered under `key`
    pub fn handler(&self, key: &str) -> Option<Arc<H>> {
        self.entries.read().get(key).map(|e| Arc::clone(&e.handler))
    }

    /// Get copies of every registered descriptor, sorted by key
    pub fn descriptors(&self) -> Vec<D> {
        self.filtered(|_| true)
    }

    /// Get copies of the descriptors matching `predicate`, sorted by key
    pub fn filtered(&self, predicate: impl Fn(&D) -> bool) -> Vec<D> {
        let entries = self.entries.read();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|k| entries.get(k))
            .filter(|e| predicate(&e.descriptor))
            .map(|e| e.descriptor.clone())
            .collect()
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of (descriptor, handler) pairs whose descriptor matches `predicate`
    pub(crate) fn entries_where(&self, predicate: impl Fn(&D) -> bool) -> Vec<(D, Arc<H>)> {
        let entries = self.entries.read();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|k| entries.get(k))
            .filter(|e| predicate(&e.descriptor))
            .map(|e| (e.descriptor.clone(), Arc::clone(&e.handler)))
            .collect()
    }
}
