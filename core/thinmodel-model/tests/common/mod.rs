//! Shared test helpers for model tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thinmodel_model::{
    Adapter, AdapterRegistry, Entity, EntityId, FieldDecl, Kind, ModelError, ModelResult, Models,
    Query, QueryOutput, Record, TypeTag, Value,
};

/// Minimal adapter that records every call and keeps records in a Vec.
pub struct StubAdapter {
    name: String,
    configured: AtomicBool,
    next_id: AtomicU64,
    pub calls: Mutex<Vec<String>>,
    pub records: Mutex<Vec<Record>>,
}

impl StubAdapter {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            configured: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Adapter for StubAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn query(&self, query: &Query) -> ModelResult<QueryOutput> {
        self.log(format!("query:{}", query.kind));
        let records = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind == query.kind)
            .map(|r| {
                let mut r = r.clone();
                if !query.select.is_empty() {
                    r.fields.retain(|k, _| query.select.contains(k));
                }
                r
            })
            .collect();
        Ok(QueryOutput {
            records,
            cursor: None,
        })
    }

    async fn persist(&self, entity: &mut Entity) -> ModelResult<()> {
        self.log(format!("persist:{}", entity.kind().name()));
        if entity.id().is_none() {
            entity.set_id(self.next_id.fetch_add(1, Ordering::SeqCst));
        }
        let id = entity.id().cloned().unwrap();
        let mut records = self.records.lock().unwrap();
        records.retain(|r| !(r.kind == entity.kind().name() && r.id == id));
        records.push(Record::snapshot(entity, id));
        Ok(())
    }

    async fn retrieve(&self, entity: &mut Entity) -> ModelResult<()> {
        self.log(format!("retrieve:{}", entity.kind().name()));
        let id = entity.id().cloned().ok_or_else(|| ModelError::MissingIdentity {
            kind: entity.kind().name().to_string(),
        })?;
        let record = self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.kind == entity.kind().name() && r.id == id)
            .cloned()
            .ok_or_else(|| ModelError::NotFound {
                kind: entity.kind().name().to_string(),
                id: id.clone(),
            })?;
        entity.set_many(record.fields)
    }

    async fn remove(&self, entity: &Entity) -> ModelResult<()> {
        self.log(format!("remove:{}", entity.kind().name()));
        let id = entity.id().cloned().ok_or_else(|| ModelError::MissingIdentity {
            kind: entity.kind().name().to_string(),
        })?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !(r.kind == entity.kind().name() && r.id == id));
        if records.len() == before {
            return Err(ModelError::NotFound {
                kind: entity.kind().name().to_string(),
                id,
            });
        }
        Ok(())
    }
}

pub fn make_models() -> Models {
    Models::new(AdapterRegistry::new())
}

/// `Person { name: text, age: number, greet() }` plus a self-referential
/// `parent: Person` field.
pub fn make_person(models: &Models) -> Kind {
    let person = models.create(
        "Person",
        [
            ("name", FieldDecl::from(TypeTag::text())),
            ("age", TypeTag::number().into()),
            (
                "greet",
                FieldDecl::method(|e, _| {
                    Value::from(format!(
                        "Hi, my name is {} and I'm {} years old.",
                        e.text("name").unwrap_or("nobody"),
                        e.number("age").unwrap_or_default()
                    ))
                }),
            ),
        ],
        None,
    );
    person.define_property("parent", &person);
    person
}

pub fn record(kind: &str, id: u64, fields: &[(&str, Value)]) -> Record {
    Record {
        kind: kind.to_string(),
        id: EntityId::Number(id),
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    }
}
