use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CalculatedField, Column};

/// Default location of the paired binary extract inside the packaged archive.
pub const DEFAULT_EXTRACT_PATH: &str = "Data/Extract.hyper";

/// A name that must be unique within its scope was registered twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameCollisionError {
    #[error("datasource {datasource:?} already has a column named {name:?}")]
    Column { datasource: String, name: String },
    #[error("datasource {datasource:?} already has a calculated field {caption:?} (id {id})")]
    CalculatedField {
        datasource: String,
        caption: String,
        id: String,
    },
    #[error("workbook already has a datasource named {0:?}")]
    Datasource(String),
    #[error("workbook already has a worksheet named {0:?}")]
    Worksheet(String),
    #[error("workbook already has a dashboard named {0:?}")]
    Dashboard(String),
}

/// An ordered collection of columns (regular and calculated) paired with one
/// binary extract.
///
/// The generated name follows the `federated.<7 hex>` convention the
/// consuming application uses for extract-backed connections. Registration
/// order is emission order, so repeated encodes stay byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    name: String,
    pub caption: String,
    /// Relative path of the paired extract inside the packaged archive. The
    /// extract itself is produced and written by a collaborator.
    pub extract_path: String,
    columns: Vec<Column>,
    calculated_fields: Vec<CalculatedField>,
}

impl Datasource {
    /// Create a datasource with a freshly generated `federated.` name.
    pub fn new(caption: impl Into<String>) -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Datasource::with_name(format!("federated.{}", &uuid[..7]), caption)
    }

    /// Create a datasource with an explicit name. Callers that persist or
    /// diff generated workbooks use this to keep names deterministic.
    pub fn with_name(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Datasource {
            name: name.into(),
            caption: caption.into(),
            extract_path: DEFAULT_EXTRACT_PATH.to_string(),
            columns: Vec::new(),
            calculated_fields: Vec::new(),
        }
    }

    pub fn with_extract_path(mut self, path: impl Into<String>) -> Self {
        self.extract_path = path.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a column. Column names are unique per datasource.
    pub fn add_column(&mut self, column: Column) -> Result<(), NameCollisionError> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(NameCollisionError::Column {
                datasource: self.name.clone(),
                name: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Register a calculated field.
    ///
    /// Captions must be unique so worksheets can refer to fields
    /// unambiguously, and generated identifiers must be unique too: a
    /// collision between freshly minted ids is astronomically unlikely but
    /// rejected rather than silently overwritten.
    pub fn add_calculated_field(
        &mut self,
        field: CalculatedField,
    ) -> Result<(), NameCollisionError> {
        if self
            .calculated_fields
            .iter()
            .any(|f| f.caption == field.caption || f.id() == field.id())
        {
            return Err(NameCollisionError::CalculatedField {
                datasource: self.name.clone(),
                id: field.id().to_string(),
                caption: field.caption,
            });
        }
        self.calculated_fields.push(field);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn calculated_fields(&self) -> &[CalculatedField] {
        &self.calculated_fields
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a calculated field by its user-facing caption.
    pub fn calculated_field(&self, caption: &str) -> Option<&CalculatedField> {
        self.calculated_fields.iter().find(|f| f.caption == caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Aggregation, Classification, DataType, Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn generated_name_uses_federated_convention() {
        let ds = Datasource::new("Superstore");
        let suffix = ds.name().strip_prefix("federated.").unwrap();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ds.extract_path, DEFAULT_EXTRACT_PATH);
    }

    #[test]
    fn duplicate_column_name_collides() {
        let mut ds = Datasource::with_name("federated.0abc123", "Superstore");
        ds.add_column(Column::text("Category")).unwrap();
        let err = ds.add_column(
            Column::new(
                "Category",
                DataType::Integer,
                Role::Measure,
                Classification::Quantitative,
            )
            .with_aggregation(Aggregation::Sum),
        );
        assert_eq!(
            err,
            Err(NameCollisionError::Column {
                datasource: "federated.0abc123".to_string(),
                name: "Category".to_string(),
            })
        );
        assert_eq!(ds.columns().len(), 1);
    }

    #[test]
    fn duplicate_calculated_field_collides() {
        let mut ds = Datasource::with_name("federated.0abc123", "Superstore");
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])");
        ds.add_calculated_field(calc.clone()).unwrap();
        // Same instance registered again: collides on both caption and id.
        assert!(matches!(
            ds.add_calculated_field(calc),
            Err(NameCollisionError::CalculatedField { .. })
        ));
        // Fresh field reusing the caption collides too.
        assert!(matches!(
            ds.add_calculated_field(CalculatedField::new("Profit Ratio", "0")),
            Err(NameCollisionError::CalculatedField { .. })
        ));
        assert_eq!(ds.calculated_fields().len(), 1);
    }

    #[test]
    fn lookup_by_caption_and_name() {
        let mut ds = Datasource::with_name("federated.0abc123", "Superstore");
        ds.add_column(Column::real_measure("Sales")).unwrap();
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])");
        let id = calc.id().to_string();
        ds.add_calculated_field(calc).unwrap();

        assert_eq!(ds.column("Sales").unwrap().name, "Sales");
        assert_eq!(ds.calculated_field("Profit Ratio").unwrap().id(), id);
        assert!(ds.column("Profit").is_none());
    }
}
