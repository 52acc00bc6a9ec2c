use crate::kind::Kind;
use crate::registry::AdapterRegistry;
use crate::schema::FieldDecl;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// Configuration for a [`Models`] context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Name of the root kind every other kind descends from.
    pub root_kind: String,
    /// Registry name of the adapter bound to the root kind, inherited by
    /// every kind that does not bind its own.
    pub default_adapter: Option<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            root_kind: "Model".to_string(),
            default_adapter: None,
        }
    }
}

/// Schema/entity factory: owns the root kind and the adapter registry that
/// kinds resolve adapter names against.
#[derive(Debug)]
pub struct Models {
    root: Kind,
    registry: AdapterRegistry,
    kinds: RwLock<HashMap<String, Kind>>,
}

impl Models {
    /// A context with the default configuration.
    pub fn new(registry: AdapterRegistry) -> Self {
        Self::with_config(registry, ModelsConfig::default())
    }

    /// A context using the process-wide registry.
    pub fn global() -> Self {
        Self::new(AdapterRegistry::global().clone())
    }

    pub fn with_config(registry: AdapterRegistry, config: ModelsConfig) -> Self {
        let root = Kind::root(config.root_kind, registry.clone());
        if let Some(name) = config.default_adapter {
            if root.use_adapter(name.as_str()).is_err() {
                warn!("Default adapter {:?} is not registered; root kind left unbound", name);
            }
        }
        Self {
            root,
            registry,
            kinds: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Kind {
        &self.root
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Builds a new kind.
    ///
    /// `parent` is honoured only if it belongs to this context (it is the
    /// root or descends from it); otherwise the root is the parent. Because
    /// a kind exists only once this returns, it can never be its own
    /// ancestor.
    pub fn create<I, K, D>(&self, name: &str, fields: I, parent: Option<&Kind>) -> Kind
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<FieldDecl>,
    {
        let parent = match parent {
            Some(p) if p.ptr_eq(&self.root) || self.is_subclass(p) => p,
            Some(p) => {
                warn!(
                    "{} is not a kind of this context, {} will extend {}",
                    p.name(),
                    name,
                    self.root.name()
                );
                &self.root
            }
            None => &self.root,
        };

        let kind = Kind::derive(name, parent);
        for (field, decl) in fields {
            kind.define_property(field, decl);
        }
        debug!("Created kind {} extending {}", name, parent.name());

        self.kinds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), kind.clone());
        kind
    }

    /// Whether `candidate`'s ancestor chain reaches this context's root.
    pub fn is_subclass(&self, candidate: &Kind) -> bool {
        candidate.is_descendant_of(&self.root)
    }

    /// The most recently created kind with this name.
    pub fn kind(&self, name: &str) -> Option<Kind> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
