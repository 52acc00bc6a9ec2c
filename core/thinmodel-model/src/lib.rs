//! Entity model for thinmodel.
//!
//! Declares entity kinds with typed fields and methods, instantiates and
//! validates entities, and routes their storage operations through an
//! interchangeable adapter:
//! - [`Models`] — the factory context (root kind + adapter registry)
//! - [`Kind`] — a named schema with inheritance, accessors and `find`
//! - [`Entity`] — one instance: type-checked fields, identity, get/put/del
//! - [`Adapter`] — the contract every storage backend implements
//! - [`Query`] — passive filter/sort/pagination/projection descriptor
//!
//! # Example
//!
//! ```
//! use thinmodel_model::{AdapterRegistry, FieldDecl, Models, TypeTag, Value};
//!
//! let models = Models::new(AdapterRegistry::new());
//! let person = models.create(
//!     "Person",
//!     [("name", FieldDecl::from(TypeTag::text())), ("age", TypeTag::number().into())],
//!     None,
//! );
//!
//! let mut arthur = person.build([("name", Value::from("Arthur")), ("age", Value::from(42))]);
//! assert_eq!(arthur.text("name"), Some("Arthur"));
//!
//! assert!(arthur.set("age", "Ron").is_err());
//! assert_eq!(arthur.number("age"), Some(42.0));
//! ```

mod adapter;
mod entity;
mod error;
mod kind;
mod models;
pub mod query;
pub mod registry;
mod schema;
mod value;

pub use adapter::{Adapter, AdapterRef, Found, FoundItems, QueryOutput, Record};
pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use kind::Kind;
pub use models::{Models, ModelsConfig};
pub use query::{Comparator, Cursor, CursorRange, Direction, Filter, Query, Sort};
pub use registry::{lookup_adapter, register_adapter, AdapterRegistry};
pub use schema::{Accessor, FieldDecl, KindRef, Method, PropertySpec, TypeTag};
pub use thinmodel_types::{EntityId, KindId, PrimitiveType};
pub use value::Value;
