//! Entity kinds: named schemas with typed fields, methods and a bound
//! storage adapter.

use crate::adapter::{Adapter, AdapterRef, Found, FoundItems};
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::query::Query;
use crate::registry::AdapterRegistry;
use crate::schema::{Accessor, FieldDecl, Method, PropertySpec};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thinmodel_types::KindId;
use tracing::{debug, warn};

/// A named entity schema.
///
/// Cheap to clone: all clones share the same declarations and adapter
/// binding. Parent links form a tree rooted at the owning
/// [`Models`](crate::Models) context's root kind.
#[derive(Clone)]
pub struct Kind {
    inner: Arc<KindInner>,
}

struct KindInner {
    id: KindId,
    name: String,
    parent: Option<Kind>,
    registry: AdapterRegistry,
    state: RwLock<KindState>,
}

#[derive(Default)]
struct KindState {
    properties: BTreeMap<String, PropertySpec>,
    methods: BTreeMap<String, Method>,
    adapter: Option<Arc<dyn Adapter>>,
}

impl Kind {
    pub(crate) fn root(name: impl Into<String>, registry: AdapterRegistry) -> Self {
        Self::build_kind(name.into(), None, registry)
    }

    pub(crate) fn derive(name: impl Into<String>, parent: &Kind) -> Self {
        let registry = parent.inner.registry.clone();
        Self::build_kind(name.into(), Some(parent.clone()), registry)
    }

    fn build_kind(name: String, parent: Option<Kind>, registry: AdapterRegistry) -> Self {
        Self {
            inner: Arc::new(KindInner {
                id: KindId::new(),
                name,
                parent,
                registry,
                state: RwLock::new(KindState::default()),
            }),
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, KindState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, KindState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> KindId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&Kind> {
        self.inner.parent.as_ref()
    }

    /// True for a context's root kind.
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Whether both handles refer to the same kind.
    pub fn ptr_eq(&self, other: &Kind) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// This kind followed by each ancestor, ending at the root.
    pub fn lineage(&self) -> impl Iterator<Item = &Kind> {
        std::iter::successors(Some(self), |k| k.parent())
    }

    /// Whether `ancestor` appears strictly above this kind in its chain.
    pub fn is_descendant_of(&self, ancestor: &Kind) -> bool {
        self.lineage().skip(1).any(|k| k.ptr_eq(ancestor))
    }

    // ── Declarations ─────────────────────────────────────────────

    /// Adds a field or method to this kind, shadowing any ancestor entry of
    /// the same name. Redefining an own name replaces it.
    pub fn define_property(&self, name: impl Into<String>, decl: impl Into<FieldDecl>) {
        let name = name.into();
        let decl = decl.into();
        let mut state = self.state_mut();
        match decl {
            FieldDecl::Method(method) => {
                state.properties.remove(&name);
                debug!("Defined method {}.{}", self.name(), name);
                state.methods.insert(name, method);
            }
            decl => {
                if let Some(spec) = decl.to_spec() {
                    state.methods.remove(&name);
                    debug!("Defined property {}.{}: {}", self.name(), name, spec.type_tag);
                    state.properties.insert(name, spec);
                }
            }
        }
    }

    /// Property specs declared directly on this kind.
    pub fn own_properties(&self) -> BTreeMap<String, PropertySpec> {
        self.state().properties.clone()
    }

    /// Effective property set: the union over the whole ancestor chain, the
    /// most derived declaration winning.
    pub fn properties(&self) -> BTreeMap<String, PropertySpec> {
        let chain: Vec<&Kind> = self.lineage().collect();
        let mut effective = BTreeMap::new();
        for kind in chain.into_iter().rev() {
            let state = kind.state();
            for name in state.methods.keys() {
                effective.remove(name);
            }
            for (name, spec) in &state.properties {
                effective.insert(name.clone(), spec.clone());
            }
        }
        effective
    }

    /// The effective spec for one field.
    pub fn property(&self, name: &str) -> Option<PropertySpec> {
        for kind in self.lineage() {
            let state = kind.state();
            if let Some(spec) = state.properties.get(name) {
                return Some(spec.clone());
            }
            if state.methods.contains_key(name) {
                return None;
            }
        }
        None
    }

    /// The effective method for one name.
    pub fn method(&self, name: &str) -> Option<Method> {
        for kind in self.lineage() {
            let state = kind.state();
            if let Some(method) = state.methods.get(name) {
                return Some(Arc::clone(method));
            }
            if state.properties.contains_key(name) {
                return None;
            }
        }
        None
    }

    /// Type-checked accessor for a declared field.
    pub fn accessor(&self, name: &str) -> Option<Accessor> {
        self.property(name).map(|spec| Accessor::new(name, spec))
    }

    // ── Instances ────────────────────────────────────────────────

    /// A fresh, empty instance of this kind.
    pub fn instantiate(&self) -> Entity {
        Entity::new(self.clone())
    }

    /// An instance seeded with initial values. Each value goes through the
    /// same type-checked write as a later `set`; rejected values are
    /// dropped with a diagnostic.
    pub fn build<I, K, V>(&self, fields: I) -> Entity
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut entity = self.instantiate();
        if let Err(e) = entity.set_many(fields) {
            debug!("Initial values for {} partially rejected: {}", self.name(), e);
        }
        entity
    }

    // ── Storage ──────────────────────────────────────────────────

    /// Binds an adapter to this kind, by registry name or directly.
    ///
    /// Descendants use this binding unless they bind their own. On failure
    /// the current binding is left unchanged.
    pub fn use_adapter(&self, adapter: impl Into<AdapterRef>) -> ModelResult<()> {
        match self.inner.registry.resolve(adapter.into()) {
            Ok(adapter) => {
                debug!("{} now uses adapter {}", self.name(), adapter.name());
                self.state_mut().adapter = Some(adapter);
                Ok(())
            }
            Err(e) => {
                warn!("Error using adapter for {}: {}", self.name(), e);
                Err(e)
            }
        }
    }

    /// Adapter bound directly to this kind.
    pub fn own_adapter(&self) -> Option<Arc<dyn Adapter>> {
        self.state().adapter.clone()
    }

    /// Adapter in effect: this kind's own binding or the nearest ancestor's.
    pub fn adapter(&self) -> Option<Arc<dyn Adapter>> {
        self.lineage().find_map(Kind::own_adapter)
    }

    /// The effective adapter if it is configured.
    pub(crate) fn ready_adapter(&self) -> ModelResult<Arc<dyn Adapter>> {
        self.adapter()
            .filter(|a| a.is_configured())
            .ok_or_else(|| ModelError::AdapterNotReady {
                kind: self.name().to_string(),
            })
    }

    /// Runs a query against the bound adapter.
    ///
    /// The query's `kind` is overwritten with this kind's name. Unless the
    /// query selects a projection, raw records are converted into entities
    /// of this kind.
    pub async fn find(&self, mut query: Query) -> ModelResult<Found> {
        query.kind = self.name().to_string();
        let adapter = self.ready_adapter().inspect_err(|_| {
            warn!("Storage adapter not ready for {}", self.name());
        })?;

        let output = adapter.query(&query).await?;
        debug!(
            "Query on {} via {} returned {} records",
            self.name(),
            adapter.name(),
            output.records.len()
        );

        let results = if query.select.is_empty() {
            FoundItems::Entities(
                output
                    .records
                    .into_iter()
                    .map(|record| adapter.to_model(record, self))
                    .collect(),
            )
        } else {
            FoundItems::Records(output.records)
        };

        Ok(Found {
            results,
            cursor: output.cursor,
        })
    }

    /// Every stored entity of this kind.
    pub async fn find_all(&self) -> ModelResult<Found> {
        self.find(Query::new()).await
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Kind {}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kind")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .field("parent", &self.parent().map(Kind::name))
            .finish()
    }
}
