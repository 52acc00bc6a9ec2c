//! In-process reference adapter.

use crate::error::{StorageError, StorageResult};
use crate::evaluator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thinmodel_model::{
    Adapter, Cursor, Entity, ModelResult, Query, QueryOutput, Record, Value,
};
use thinmodel_types::EntityId;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const CURSOR_PREFIX: &str = "offset:";

/// Configuration for a [`MemoryAdapter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryAdapterConfig {
    /// Registry and diagnostic name.
    pub name: String,
    /// First identity assigned per kind.
    pub first_id: u64,
    /// Increment between assigned identities.
    pub id_step: u64,
}

impl Default for MemoryAdapterConfig {
    fn default() -> Self {
        Self {
            name: "memory".to_string(),
            first_id: 1,
            id_step: 1,
        }
    }
}

#[derive(Debug)]
struct KindStore {
    records: BTreeMap<EntityId, BTreeMap<String, Value>>,
    /// `None` once the sequence has passed `u64::MAX`.
    next_id: Option<u64>,
}

impl KindStore {
    fn new(first_id: u64) -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: Some(first_id),
        }
    }

    /// Moves the sequence past a caller-assigned numeric id.
    fn skip_past(&mut self, n: u64, step: u64) {
        if self.next_id.is_some_and(|next| n >= next) {
            self.next_id = n.checked_add(step);
        }
    }

    fn assign(&mut self, kind: &str, step: u64) -> StorageResult<EntityId> {
        let id = self
            .next_id
            .ok_or_else(|| StorageError::IdentityExhausted(kind.to_string()))?;
        self.next_id = id.checked_add(step);
        Ok(EntityId::Number(id))
    }
}

/// Stores shallow snapshots of entity fields keyed by `(kind, identity)`.
///
/// Always configured. Concurrent writes to the same key are last write
/// wins.
///
/// Buckets are keyed by kind *name*. Kinds of the same name from two
/// [`Models`](thinmodel_model::Models) contexts sharing one adapter share
/// records too, and entity-typed fields stored by one context fail the
/// other's type check on load. Give each context its own adapter.
#[derive(Debug)]
pub struct MemoryAdapter {
    config: MemoryAdapterConfig,
    store: RwLock<HashMap<String, KindStore>>,
}

impl MemoryAdapter {
    /// Creates an adapter named `"memory"` assigning ids 1, 2, 3, ...
    pub fn new() -> Self {
        Self::with_config(MemoryAdapterConfig::default())
    }

    pub fn with_config(mut config: MemoryAdapterConfig) -> Self {
        config.first_id = config.first_id.max(1);
        config.id_step = config.id_step.max(1);
        Self {
            config,
            store: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MemoryAdapterConfig {
        &self.config
    }

    /// Number of records stored for a kind.
    pub async fn len(&self, kind: &str) -> usize {
        self.store
            .read()
            .await
            .get(kind)
            .map_or(0, |bucket| bucket.records.len())
    }

    /// Drops every record and resets identity counters.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    /// Reads a raw record without going through an entity.
    pub async fn record(&self, kind: &str, id: &EntityId) -> Option<Record> {
        let store = self.store.read().await;
        let fields = store.get(kind)?.records.get(id)?;
        Some(Record {
            kind: kind.to_string(),
            id: id.clone(),
            fields: fields.clone(),
        })
    }

    fn require_id(entity: &Entity) -> StorageResult<EntityId> {
        entity
            .id()
            .cloned()
            .ok_or_else(|| StorageError::MissingIdentity(entity.kind().name().to_string()))
    }

    async fn run_query(&self, query: &Query) -> StorageResult<QueryOutput> {
        let mut records: Vec<Record> = {
            let store = self.store.read().await;
            let Some(bucket) = store.get(&query.kind) else {
                return Ok(QueryOutput::default());
            };
            bucket
                .records
                .iter()
                .map(|(id, fields)| Record {
                    kind: query.kind.clone(),
                    id: id.clone(),
                    fields: fields.clone(),
                })
                .filter(|record| evaluator::matches(record, &query.filters))
                .collect()
        };

        if let Some(sort) = &query.sort {
            evaluator::sort(&mut records, sort);
        }
        if !query.group.is_empty() {
            records = evaluator::distinct_on(records, &query.group);
        }

        let range = query.cursor.as_ref();
        let start = match range.and_then(|c| c.start.as_ref()) {
            Some(cursor) => decode_cursor(cursor)?,
            None => query.offset.unwrap_or(0),
        };
        let total = match range.and_then(|c| c.end.as_ref()) {
            Some(cursor) => decode_cursor(cursor)?.min(records.len()),
            None => records.len(),
        };
        let stop = query
            .limit
            .map_or(total, |limit| start.saturating_add(limit).min(total));

        // An empty page (`limit(0)`) makes no progress, so it never hands
        // out a cursor.
        let cursor = (start < stop && stop < total).then(|| encode_cursor(stop));
        let page: Vec<Record> = records
            .into_iter()
            .take(stop)
            .skip(start)
            .map(|record| {
                if query.select.is_empty() {
                    record
                } else {
                    evaluator::project(record, &query.select)
                }
            })
            .collect();

        Ok(QueryOutput {
            records: page,
            cursor,
        })
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_cursor(offset: usize) -> Cursor {
    Cursor::new(format!("{CURSOR_PREFIX}{offset}"))
}

/// Accepts tokens issued by [`encode_cursor`] and bare offsets.
fn decode_cursor(cursor: &Cursor) -> StorageResult<usize> {
    let token = cursor.as_str();
    token
        .strip_prefix(CURSOR_PREFIX)
        .unwrap_or(token)
        .parse()
        .map_err(|_| StorageError::InvalidCursor(token.to_string()))
}

#[async_trait]
impl Adapter for MemoryAdapter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn query(&self, query: &Query) -> ModelResult<QueryOutput> {
        let output = self.run_query(query).await?;
        debug!(
            "Memory query on {} matched {} records",
            query.kind,
            output.records.len()
        );
        Ok(output)
    }

    async fn persist(&self, entity: &mut Entity) -> ModelResult<()> {
        let kind = entity.kind().name().to_string();
        let mut store = self.store.write().await;
        let bucket = store
            .entry(kind.clone())
            .or_insert_with(|| KindStore::new(self.config.first_id));

        let id = match entity.id().cloned() {
            Some(id) => {
                if let Some(n) = id.as_number() {
                    bucket.skip_past(n, self.config.id_step);
                }
                id
            }
            None => {
                let id = bucket.assign(&kind, self.config.id_step)?;
                entity.set_id(id.clone());
                id
            }
        };

        debug!("Persisted {} {}", kind, id);
        bucket.records.insert(id, entity.fields().clone());
        Ok(())
    }

    async fn retrieve(&self, entity: &mut Entity) -> ModelResult<()> {
        let id = Self::require_id(entity)?;
        let kind = entity.kind().name().to_string();
        let fields = {
            let store = self.store.read().await;
            store
                .get(&kind)
                .and_then(|bucket| bucket.records.get(&id))
                .cloned()
                .ok_or_else(|| StorageError::NotFound {
                    kind: kind.clone(),
                    id: id.clone(),
                })?
        };

        let stale: Vec<String> = entity
            .fields()
            .keys()
            .filter(|name| !fields.contains_key(*name))
            .cloned()
            .collect();
        for name in stale {
            if let Err(e) = entity.set(&name, Value::Null) {
                debug!("Could not clear {}.{}: {}", kind, name, e);
            }
        }
        if let Err(e) = entity.set_many(fields) {
            warn!("Stored {} {} no longer matches its kind: {}", kind, id, e);
        }
        debug!("Retrieved {} {}", kind, id);
        Ok(())
    }

    async fn remove(&self, entity: &Entity) -> ModelResult<()> {
        let id = Self::require_id(entity)?;
        let kind = entity.kind().name();
        let mut store = self.store.write().await;
        store
            .get_mut(kind)
            .and_then(|bucket| bucket.records.remove(&id))
            .ok_or_else(|| StorageError::NotFound {
                kind: kind.to_string(),
                id: id.clone(),
            })?;
        debug!("Removed {} {}", kind, id);
        Ok(())
    }
}
