//! Storage adapters for thinmodel.
//!
//! Provides the reference [`MemoryAdapter`], an in-process store keyed by
//! kind and identity, and the query evaluation it uses.
//!
//! # Example
//!
//! ```
//! use thinmodel_model::{AdapterRegistry, Models};
//!
//! let models = Models::new(AdapterRegistry::new());
//! thinmodel_storage::install_default(&models);
//! assert_eq!(models.root().adapter().unwrap().name(), "memory");
//! ```

mod error;
pub mod evaluator;
mod memory;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryAdapter, MemoryAdapterConfig};

use std::sync::Arc;
use thinmodel_model::{Adapter, Models};
use tracing::debug;

/// Registers a [`MemoryAdapter`] as `"memory"` in the context's registry and
/// binds it to the root kind, so every kind without its own binding uses it.
pub fn install_default(models: &Models) -> Arc<MemoryAdapter> {
    let adapter = Arc::new(MemoryAdapter::new());
    models.registry().register(adapter.name(), adapter.clone());
    if models.root().use_adapter(adapter.clone()).is_ok() {
        debug!("Memory adapter bound to {}", models.root().name());
    }
    adapter
}
