use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::kind::Kind;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thinmodel_types::{KindId, PrimitiveType};
use tracing::warn;

/// Reference to an entity kind used as a field type.
///
/// Holds the kind's id rather than the kind itself so self-referential
/// fields (`Person.parent: Person`) do not form ownership cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindRef {
    pub id: KindId,
    pub name: String,
}

/// Declared type of a field: a primitive marker or another entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Primitive(PrimitiveType),
    Kind(KindRef),
}

impl TypeTag {
    pub const fn boolean() -> Self {
        Self::Primitive(PrimitiveType::Boolean)
    }

    pub const fn number() -> Self {
        Self::Primitive(PrimitiveType::Number)
    }

    pub const fn text() -> Self {
        Self::Primitive(PrimitiveType::Text)
    }

    pub const fn date() -> Self {
        Self::Primitive(PrimitiveType::Date)
    }

    pub const fn collection() -> Self {
        Self::Primitive(PrimitiveType::Collection)
    }

    pub const fn object() -> Self {
        Self::Primitive(PrimitiveType::Object)
    }

    /// Type tag naming an entity kind.
    pub fn kind(kind: &Kind) -> Self {
        Self::Kind(KindRef {
            id: kind.id(),
            name: kind.name().to_string(),
        })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{p}"),
            Self::Kind(k) => f.write_str(&k.name),
        }
    }
}

impl From<PrimitiveType> for TypeTag {
    fn from(p: PrimitiveType) -> Self {
        Self::Primitive(p)
    }
}

impl From<&Kind> for TypeTag {
    fn from(kind: &Kind) -> Self {
        Self::kind(kind)
    }
}

/// Declared type and constraints of one field.
///
/// `indexed` is informational: the model layer never reads it, backends
/// that maintain secondary indexes may.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub indexed: bool,
}

impl PropertySpec {
    /// An optional, unindexed field of the given type.
    pub fn new(type_tag: impl Into<TypeTag>) -> Self {
        Self {
            type_tag: type_tag.into(),
            required: false,
            indexed: false,
        }
    }

    /// Marks the field as required at persist time.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as indexed.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// An instance method attached to a kind.
pub type Method = Arc<dyn Fn(&Entity, &[Value]) -> Value + Send + Sync>;

/// One entry of a kind declaration.
#[derive(Clone)]
pub enum FieldDecl {
    /// Plain type marker: optional, unindexed.
    Type(TypeTag),
    /// Full property specification.
    Spec(PropertySpec),
    /// Instance method; no type checking, no property spec.
    Method(Method),
}

impl FieldDecl {
    /// Wraps a closure as a method declaration.
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&Entity, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self::Method(Arc::new(f))
    }

    /// The property spec this declaration produces, or `None` for methods.
    pub fn to_spec(&self) -> Option<PropertySpec> {
        match self {
            Self::Type(tag) => Some(PropertySpec::new(tag.clone())),
            Self::Spec(spec) => Some(spec.clone()),
            Self::Method(_) => None,
        }
    }
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(tag) => f.debug_tuple("Type").field(tag).finish(),
            Self::Spec(spec) => f.debug_tuple("Spec").field(spec).finish(),
            Self::Method(_) => f.write_str("Method(..)"),
        }
    }
}

impl From<TypeTag> for FieldDecl {
    fn from(tag: TypeTag) -> Self {
        Self::Type(tag)
    }
}

impl From<PrimitiveType> for FieldDecl {
    fn from(p: PrimitiveType) -> Self {
        Self::Type(p.into())
    }
}

impl From<PropertySpec> for FieldDecl {
    fn from(spec: PropertySpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<&Kind> for FieldDecl {
    fn from(kind: &Kind) -> Self {
        Self::Type(TypeTag::kind(kind))
    }
}

/// Type-checked read/write capability for one declared field.
#[derive(Debug, Clone)]
pub struct Accessor {
    name: String,
    spec: PropertySpec,
}

impl Accessor {
    pub(crate) fn new(name: impl Into<String>, spec: PropertySpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &PropertySpec {
        &self.spec
    }

    /// Current value, or `None` if the field was never set or was cleared.
    pub fn read<'e>(&self, entity: &'e Entity) -> Option<&'e Value> {
        entity.fields().get(&self.name)
    }

    /// Stores `value` if it matches the declared type, marking the entity
    /// dirty. On mismatch the previous value is kept.
    pub fn write(&self, entity: &mut Entity, value: Value) -> ModelResult<()> {
        if !value.matches(&self.spec.type_tag) {
            warn!(
                "Tried to set invalid property type for {}.{} ({} is not {}), ignoring",
                entity.kind().name(),
                self.name,
                value.type_name(),
                self.spec.type_tag
            );
            return Err(ModelError::TypeMismatch {
                field: self.name.clone(),
                expected: self.spec.type_tag.to_string(),
                found: value.type_name(),
            });
        }
        entity.store(&self.name, value);
        Ok(())
    }
}
