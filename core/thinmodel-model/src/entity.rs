use crate::error::{ModelError, ModelResult};
use crate::kind::Kind;
use crate::value::Value;
use std::collections::BTreeMap;
use thinmodel_types::EntityId;
use tracing::{debug, warn};

/// A concrete object of a kind.
///
/// Field writes go through the kind's type-checked accessors. Storage
/// operations delegate to the adapter in effect for the kind.
#[derive(Debug, Clone)]
pub struct Entity {
    kind: Kind,
    fields: BTreeMap<String, Value>,
    id: Option<EntityId>,
    dirty: bool,
}

impl Entity {
    pub(crate) fn new(kind: Kind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
            id: None,
            dirty: false,
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Current identity; adapter-assigned on first persist unless set.
    pub fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    /// Assigns an identity. Empty identities (`0`, `""`) are ignored.
    pub fn set_id(&mut self, id: impl Into<EntityId>) -> Option<&EntityId> {
        let id = id.into();
        if id.is_set() {
            self.id = Some(id);
        } else {
            debug!("Ignoring empty identity for {}", self.kind.name());
        }
        self.id.as_ref()
    }

    /// True once any field was written since creation or the last
    /// successful put/get.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// All fields currently holding a value.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub(crate) fn store(&mut self, name: &str, value: Value) {
        if value.is_null() {
            self.fields.remove(name);
        } else {
            self.fields.insert(name.to_string(), value);
        }
        self.dirty = true;
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Value of one field, `None` if absent.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Follows a dotted path through nested entities and objects
    /// (e.g., `"parent.name"`).
    pub fn path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.value(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Entity(e) => e.value(segment)?,
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Extract a text value at `path`.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.path(path).and_then(Value::as_str)
    }

    /// Extract a numeric value at `path`.
    pub fn number(&self, path: &str) -> Option<f64> {
        self.path(path).and_then(Value::as_f64)
    }

    /// Extract a boolean value at `path`.
    pub fn boolean(&self, path: &str) -> Option<bool> {
        self.path(path).and_then(Value::as_bool)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Writes one field through its accessor. `Value::Null` clears it.
    ///
    /// Rejected writes leave the previous value in place and are reported
    /// both as a warning and as the returned error.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let Some(accessor) = self.kind.accessor(name) else {
            warn!("{} has no property {}, ignoring", self.kind.name(), name);
            return Err(ModelError::UnknownField {
                kind: self.kind.name().to_string(),
                field: name.to_string(),
            });
        };
        accessor.write(self, value.into())
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        let _ = self.set(name, value);
        self
    }

    /// Applies every entry through [`set`](Self::set). All valid entries
    /// are written even if some are rejected; the first rejection is
    /// returned.
    pub fn set_many<I, K, V>(&mut self, fields: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut first_error = None;
        for (name, value) in fields {
            if let Err(e) = self.set(name.as_ref(), value) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Applies a JSON object's members through [`set`](Self::set).
    pub fn set_json(&mut self, json: serde_json::Value) -> ModelResult<()> {
        match json {
            serde_json::Value::Object(map) => {
                self.set_many(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
            other => Err(ModelError::InvalidFields(format!(
                "expected a JSON object of fields, got {other}"
            ))),
        }
    }

    // ── Behaviour ────────────────────────────────────────────────

    /// Invokes a method declared on the kind or one of its ancestors.
    pub fn call(&self, method: &str, args: &[Value]) -> ModelResult<Value> {
        let f = self.kind.method(method).ok_or_else(|| ModelError::UnknownMethod {
            kind: self.kind.name().to_string(),
            method: method.to_string(),
        })?;
        Ok(f(self, args))
    }

    /// Names of required fields that currently hold no value.
    pub fn missing_required(&self) -> Vec<String> {
        self.kind
            .properties()
            .into_iter()
            .filter(|(name, spec)| spec.required && !self.fields.contains_key(name))
            .map(|(name, _)| name)
            .collect()
    }

    /// True iff every required field holds a value. Types are not
    /// rechecked; they were enforced at write time.
    pub fn validate(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// `{"kind": .., "id": .., "data": {..}}`.
    pub fn to_json(&self) -> serde_json::Value {
        let data: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::json!({
            "kind": self.kind.name(),
            "id": self.id,
            "data": data,
        })
    }

    // ── Storage ──────────────────────────────────────────────────

    /// Reloads this entity from storage by its identity.
    pub async fn get(&mut self) -> ModelResult<()> {
        let adapter = self.kind.ready_adapter()?;
        adapter.retrieve(self).await?;
        self.dirty = false;
        Ok(())
    }

    /// Persists this entity. Requires a configured adapter and a passing
    /// [`validate`](Self::validate); otherwise nothing is written.
    pub async fn put(&mut self) -> ModelResult<()> {
        let adapter = self.kind.ready_adapter().inspect_err(|_| {
            warn!("Storage adapter not ready for {}", self.kind.name());
        })?;
        let missing = self.missing_required();
        if !missing.is_empty() {
            warn!(
                "{} failed validation, missing required: {}",
                self.kind.name(),
                missing.join(", ")
            );
            return Err(ModelError::ValidationFailed {
                kind: self.kind.name().to_string(),
                missing,
            });
        }
        adapter.persist(self).await?;
        self.dirty = false;
        Ok(())
    }

    /// Removes this entity's stored record.
    pub async fn del(&self) -> ModelResult<()> {
        let adapter = self.kind.ready_adapter().inspect_err(|_| {
            warn!("Storage adapter not ready for {}", self.kind.name());
        })?;
        adapter.remove(self).await
    }
}

/// Same kind, identity and field values; the dirty flag is ignored.
impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id && self.fields == other.fields
    }
}
