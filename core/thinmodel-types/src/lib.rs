//! Core type definitions for thinmodel.
//!
//! This crate defines the small, storage-agnostic types shared by the
//! schema layer and every adapter:
//! - Entity identities (numeric or textual, adapter-assigned)
//! - Kind identifiers (UUID v7)
//! - Primitive field type markers
//!
//! Values, kinds and entities themselves live in `thinmodel-model`.

mod ids;
mod primitive;

pub use ids::{EntityId, KindId};
pub use primitive::PrimitiveType;

/// Errors raised while parsing type markers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown primitive type: {0}")]
    UnknownPrimitive(String),
}
