//! In-memory schema model.

pub mod field;
pub mod schema;
pub mod types;

pub use field::{is_identifier, is_reserved, Field, FieldSet, FieldSetKind, RESERVED_NAMES};
pub use schema::{
    CompositeType, EnumType, Resource, ResourceState, Schema, SchemaBuilder, TypeKind,
};
pub use types::{Primitive, TypeFlags, TypeInfo};
