//! Typed dependency registry.
//!
//! Shared services (settings store, token service, ...) are registered under a
//! string key before the dispatcher is built. Lookups are checked against the
//! type recorded at registration, so asking for the wrong type yields `None`
//! instead of a bad cast.
//!
//! The registry is moved into an `Arc` when handed to the dispatcher and is
//! read-only from then on.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::error::PipelineError;

struct Entry {
    type_id: TypeId,
    type_name: &'static str,
    handle: Arc<dyn Any + Send + Sync>,
}

/// String-keyed store of shared service handles.
#[derive(Default)]
pub struct DependencyRegistry {
    entries: HashMap<String, Entry>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` under `key`, replacing any previous binding.
    ///
    /// `T` may be unsized (`dyn Trait`); lookups must then use the same `T`.
    pub fn set<T>(&mut self, key: impl Into<String>, handle: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = key.into();
        let entry = Entry {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            handle: Arc::new(handle),
        };
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            tracing::debug!(key = %key, previous = previous.type_name, "Dependency replaced");
        }
    }

    /// Typed lookup. `None` when the key is absent or bound to another type.
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entry = self.entries.get(key)?;
        if entry.type_id != TypeId::of::<T>() {
            tracing::debug!(
                key = %key,
                registered = entry.type_name,
                requested = std::any::type_name::<T>(),
                "Dependency type mismatch"
            );
            return None;
        }
        entry.handle.downcast_ref::<Arc<T>>().map(Arc::clone)
    }

    /// Like [`get`](Self::get) but reports absence as an internal error.
    pub fn require<T>(&self, key: &str) -> Result<Arc<T>, PipelineError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>(key)
            .ok_or_else(|| PipelineError::internal(format!("Missing dependency: {key}")))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, e)| (k, e.type_name)))
            .finish()
    }
}
