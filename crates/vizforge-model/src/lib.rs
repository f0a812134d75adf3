//! `vizforge-model` defines the in-memory model for generated workbooks.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the TWB markup encoders (`vizforge-twb`)
//! - schema-inference front ends that map tabular input onto [`Column`]s
//! - config/IPC boundaries via `serde`
//!
//! Nothing in here performs I/O; all validation surfaces synchronously
//! through the error types each module defines.

mod calc;
mod column;
mod datasource;
mod field_ref;
mod geo;
mod worksheet;

pub use calc::{CalculatedField, CALC_ID_PREFIX};
pub use column::{Classification, Column, DataType, InvalidFieldSpec, Role};
pub use datasource::{Datasource, NameCollisionError, DEFAULT_EXTRACT_PATH};
pub use field_ref::{Derivation, FieldRefParseError, FieldReference, TypeTag};
pub use geo::{semantic_role, ConfigurationError};
pub use worksheet::{
    Aggregation, DependencyColumn, FieldKind, MarkType, Shelf, ShelfAssignment, WorksheetSpec,
};
