//! Runtime field values.

use crate::entity::Entity;
use crate::schema::TypeTag;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thinmodel_types::PrimitiveType;

/// Integers up to this magnitude survive an `f64` round trip.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A value held in an entity field.
///
/// `Null` is the absence value: it passes every type check and clears the
/// field it is written to.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateTime<Utc>),
    Collection(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Entity(Box<Entity>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The primitive marker this value satisfies, or `None` for `Null` and
    /// entity values.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Self::Null | Self::Entity(_) => None,
            Self::Bool(_) => Some(PrimitiveType::Boolean),
            Self::Number(_) => Some(PrimitiveType::Number),
            Self::Text(_) => Some(PrimitiveType::Text),
            Self::Date(_) => Some(PrimitiveType::Date),
            Self::Collection(_) => Some(PrimitiveType::Collection),
            Self::Object(_) => Some(PrimitiveType::Object),
        }
    }

    /// Name of the runtime type, for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Entity(e) => e.kind().name().to_string(),
            other => other
                .primitive_type()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// Whether this value may be stored in a field declared as `tag`.
    ///
    /// Entity values match only their exact kind; a descendant kind is a
    /// different runtime type.
    pub fn matches(&self, tag: &TypeTag) -> bool {
        match (self, tag) {
            (Self::Null, _) => true,
            (Self::Entity(e), TypeTag::Kind(kind)) => e.kind().id() == kind.id,
            (Self::Entity(_), TypeTag::Primitive(_)) => false,
            (other, TypeTag::Primitive(p)) => other.primitive_type() == Some(*p),
            (_, TypeTag::Kind(_)) => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Self::Collection(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Converts to JSON. Whole numbers in the safe integer range become JSON
    /// integers; dates become RFC 3339 strings; nested entities become their
    /// `to_json` form.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                Json::from(*n as i64)
            }
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Self::Text(s) => Json::String(s.clone()),
            Self::Date(d) => Json::String(d.to_rfc3339()),
            Self::Collection(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Object(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Entity(e) => e.to_json(),
        }
    }
}

/// Values of the same primitive type are ordered; everything else
/// (including `Null`, collections and entities) is incomparable.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Collection(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Object(map)
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Self::Entity(Box::new(e))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::Collection(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
