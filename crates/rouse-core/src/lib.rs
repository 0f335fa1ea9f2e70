//! Core data model for rouse: dynamic config values, schemas, and the
//! error taxonomy shared by every other crate in the workspace.

pub mod error;
pub mod schema;
pub mod value;

pub use error::WakeError;
pub use schema::{FieldKind, FieldSchema, Schema, StructSchema, coerce_str, coerce_value};
pub use value::{Value, parse_literal};
