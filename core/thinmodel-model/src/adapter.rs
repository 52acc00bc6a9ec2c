use crate::entity::Entity;
use crate::error::ModelResult;
use crate::kind::Kind;
use crate::query::{Cursor, Query};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thinmodel_types::EntityId;
use tracing::debug;

/// A backend-native record, as stored by an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: String,
    pub id: EntityId,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Snapshot of an entity's current field values.
    pub fn snapshot(entity: &Entity, id: EntityId) -> Self {
        Self {
            kind: entity.kind().name().to_string(),
            id,
            fields: entity.fields().clone(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Raw result of [`Adapter::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub records: Vec<Record>,
    /// Continuation token, present when more results remain.
    pub cursor: Option<Cursor>,
}

/// Results of [`Kind::find`](crate::Kind::find).
#[derive(Debug, Clone)]
pub enum FoundItems {
    /// Full records converted into entities.
    Entities(Vec<Entity>),
    /// Projections, returned as-is when the query selected fields.
    Records(Vec<Record>),
}

#[derive(Debug, Clone)]
pub struct Found {
    pub results: FoundItems,
    pub cursor: Option<Cursor>,
}

impl Found {
    /// Converted entities; empty for projection queries.
    pub fn entities(&self) -> &[Entity] {
        match &self.results {
            FoundItems::Entities(entities) => entities,
            FoundItems::Records(_) => &[],
        }
    }

    /// Projected records; empty for entity queries.
    pub fn records(&self) -> &[Record] {
        match &self.results {
            FoundItems::Entities(_) => &[],
            FoundItems::Records(records) => records,
        }
    }

    pub fn into_entities(self) -> Vec<Entity> {
        match self.results {
            FoundItems::Entities(entities) => entities,
            FoundItems::Records(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.results {
            FoundItems::Entities(entities) => entities.len(),
            FoundItems::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pluggable storage backend.
///
/// Every operation resolves exactly once. The model layer checks
/// [`is_configured`](Adapter::is_configured) before calling any of them.
/// Backend failures without a matching `ModelError` variant go through
/// [`ModelError::Storage`](crate::ModelError::Storage).
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether the backend is ready (connected, initialized).
    fn is_configured(&self) -> bool;

    /// Filters, sorts and paginates records of `query.kind`.
    async fn query(&self, query: &Query) -> ModelResult<QueryOutput>;

    /// Writes the entity's current fields under its kind and identity,
    /// assigning an identity first if it has none.
    async fn persist(&self, entity: &mut Entity) -> ModelResult<()>;

    /// Repopulates the entity from the record stored under its identity.
    async fn retrieve(&self, entity: &mut Entity) -> ModelResult<()>;

    /// Deletes the record stored under the entity's kind and identity.
    async fn remove(&self, entity: &Entity) -> ModelResult<()>;

    /// Converts a raw record into a clean entity of `kind`.
    fn to_model(&self, record: Record, kind: &Kind) -> Entity {
        let mut entity = kind.instantiate();
        if let Err(e) = entity.set_many(record.fields) {
            debug!("Record {} of {} did not fully load: {}", record.id, record.kind, e);
        }
        entity.set_id(record.id);
        entity.mark_clean();
        entity
    }
}

/// What [`Kind::use_adapter`](crate::Kind::use_adapter) accepts.
#[derive(Clone)]
pub enum AdapterRef {
    /// Looked up in the adapter registry.
    Named(String),
    /// Bound directly.
    Instance(Arc<dyn Adapter>),
}

impl fmt::Debug for AdapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Instance(adapter) => f.debug_tuple("Instance").field(&adapter.name()).finish(),
        }
    }
}

impl From<&str> for AdapterRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for AdapterRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Arc<dyn Adapter>> for AdapterRef {
    fn from(adapter: Arc<dyn Adapter>) -> Self {
        Self::Instance(adapter)
    }
}

impl<A: Adapter + 'static> From<Arc<A>> for AdapterRef {
    fn from(adapter: Arc<A>) -> Self {
        Self::Instance(adapter)
    }
}
