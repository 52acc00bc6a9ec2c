//! Name → adapter registry.
//!
//! A [`Models`](crate::Models) context is constructed with a registry
//! handle; the process-wide instance behind [`AdapterRegistry::global`] is
//! only one such handle.

use crate::adapter::{Adapter, AdapterRef};
use crate::error::{ModelError, ModelResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

static GLOBAL: LazyLock<AdapterRegistry> = LazyLock::new(AdapterRegistry::new);

/// Shared map of adapter names to adapter instances. Clones share state.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Arc<RwLock<HashMap<String, Arc<dyn Adapter>>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static AdapterRegistry {
        &GLOBAL
    }

    /// Registers `adapter` under `name`, returning the adapter it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        adapter: Arc<dyn Adapter>,
    ) -> Option<Arc<dyn Adapter>> {
        let name = name.into();
        debug!("Registered adapter {}", name);
        self.adapters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, adapter)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Turns an adapter reference into an instance. Empty and unknown names
    /// fail with [`ModelError::AdapterLookupFailed`].
    pub fn resolve(&self, adapter: AdapterRef) -> ModelResult<Arc<dyn Adapter>> {
        match adapter {
            AdapterRef::Instance(adapter) => Ok(adapter),
            AdapterRef::Named(name) if name.is_empty() => Err(ModelError::AdapterLookupFailed(name)),
            AdapterRef::Named(name) => self
                .lookup(&name)
                .ok_or(ModelError::AdapterLookupFailed(name)),
        }
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

/// Registers an adapter in the process-wide registry.
pub fn register_adapter(
    name: impl Into<String>,
    adapter: Arc<dyn Adapter>,
) -> Option<Arc<dyn Adapter>> {
    AdapterRegistry::global().register(name, adapter)
}

/// Looks up an adapter in the process-wide registry.
pub fn lookup_adapter(name: &str) -> Option<Arc<dyn Adapter>> {
    AdapterRegistry::global().lookup(name)
}
