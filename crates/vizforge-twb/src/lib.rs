//! TWB workbook markup encoding for `vizforge-model` specs.
//!
//! The crate lowers the declarative model into the consuming application's
//! workbook dialect:
//!
//! - [`schema::encode_datasource`]: column and calculated-field declarations
//!   for one datasource.
//! - [`worksheet::encode_worksheet`]: per-worksheet shelf bindings, field
//!   instances and dependency declarations.
//! - [`Dashboard`]: the zone-tree layout engine and its markup.
//! - [`Workbook`]: the document assembler producing the full workbook XML.
//! - [`package`]: TWBX archive packaging (workbook + collaborator-produced
//!   extract bytes).
//!
//! The dialect is attribute-positional and unvalidated on the consuming
//! side, so every encoder here fails fast on structural mistakes (missing
//! dependency declarations, axis fields on KPI cards, out-of-range zones)
//! instead of deferring them to a silently broken render.

pub mod document;
pub mod layout;
pub mod package;
pub mod schema;
pub mod worksheet;
mod xml;

use thiserror::Error;

use vizforge_model::{ConfigurationError, InvalidFieldSpec, NameCollisionError};

pub use document::Workbook;
pub use layout::{Dashboard, LayoutError, ZoneId, GRID_MAX};
pub use package::{write_twbx, write_twbx_to_writer, ExtractPart, PackageError};
pub use worksheet::MissingDependencyError;

/// Umbrella error for workbook encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    FieldSpec(#[from] InvalidFieldSpec),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    MissingDependency(#[from] MissingDependencyError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),
}
