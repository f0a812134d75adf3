use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::worksheet::{Aggregation, Shelf};
use crate::TypeTag;

/// A field specification used a value outside the recognized enumerations,
/// or combined a mark type with shelves it cannot carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFieldSpec {
    #[error("unrecognized datatype: {0:?}")]
    UnknownDataType(String),
    #[error("unrecognized role: {0:?}")]
    UnknownRole(String),
    #[error("unrecognized classification: {0:?}")]
    UnknownClassification(String),
    #[error("unrecognized aggregation: {0:?}")]
    UnknownAggregation(String),
    #[error("unrecognized mark type: {0:?}")]
    UnknownMarkType(String),
    /// A `Text`-mark worksheet is a single centered value; putting fields on
    /// the rows or columns shelf turns it into an axis-bearing chart.
    #[error("worksheet {worksheet:?} uses the Text mark but places a field on the {shelf} shelf")]
    AxisShelfOnTextMark { worksheet: String, shelf: Shelf },
}

/// Storage datatype of a column, in the workbook dialect's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Free-form text; declared as `string`.
    #[serde(rename = "string")]
    Text,
    #[serde(rename = "real")]
    Real,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "boolean")]
    Boolean,
}

impl DataType {
    /// The token emitted in `datatype` attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Text => "string",
            DataType::Real => "real",
            DataType::Integer => "integer",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Boolean => "boolean",
        }
    }
}

impl FromStr for DataType {
    type Err = InvalidFieldSpec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(DataType::Text),
            "real" => Ok(DataType::Real),
            "integer" => Ok(DataType::Integer),
            "date" => Ok(DataType::Date),
            "datetime" => Ok(DataType::DateTime),
            "boolean" => Ok(DataType::Boolean),
            other => Err(InvalidFieldSpec::UnknownDataType(other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a column slices the data (dimension) or is aggregated (measure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Dimension,
    Measure,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Dimension => "dimension",
            Role::Measure => "measure",
        }
    }
}

impl FromStr for Role {
    type Err = InvalidFieldSpec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dimension" => Ok(Role::Dimension),
            "measure" => Ok(Role::Measure),
            other => Err(InvalidFieldSpec::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistical classification of a column; determines the 2-char type key
/// embedded in field-instance names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Nominal,
    Ordinal,
    Quantitative,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Nominal => "nominal",
            Classification::Ordinal => "ordinal",
            Classification::Quantitative => "quantitative",
        }
    }

    /// The type key used in field-instance names (`nk` / `ok` / `qk`).
    pub fn type_tag(self) -> TypeTag {
        match self {
            Classification::Nominal => TypeTag::Nominal,
            Classification::Ordinal => TypeTag::Ordinal,
            Classification::Quantitative => TypeTag::Quantitative,
        }
    }
}

impl FromStr for Classification {
    type Err = InvalidFieldSpec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nominal" => Ok(Classification::Nominal),
            "ordinal" => Ok(Classification::Ordinal),
            "quantitative" => Ok(Classification::Quantitative),
            other => Err(InvalidFieldSpec::UnknownClassification(other.to_string())),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field in a datasource, mapped 1:1 onto a column of the paired extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Field name; unique within its datasource and identical to the extract
    /// column name.
    pub name: String,
    /// User-facing caption; `None` means "same as name".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub datatype: DataType,
    pub role: Role,
    pub classification: Classification,
    /// Key into the fixed geographic-role table (see [`crate::semantic_role`]).
    /// Resolved at encode time; an unrecognized key fails the encode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_role: Option<String>,
    /// Default aggregation advertised on dependency declarations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        datatype: DataType,
        role: Role,
        classification: Classification,
    ) -> Self {
        Column {
            name: name.into(),
            caption: None,
            datatype,
            role,
            classification,
            geo_role: None,
            aggregation: None,
        }
    }

    /// A text dimension (`string` / `dimension` / `nominal`).
    pub fn text(name: impl Into<String>) -> Self {
        Column::new(name, DataType::Text, Role::Dimension, Classification::Nominal)
    }

    /// A real-valued measure (`real` / `measure` / `quantitative`), summed by
    /// default.
    pub fn real_measure(name: impl Into<String>) -> Self {
        Column::new(name, DataType::Real, Role::Measure, Classification::Quantitative)
            .with_aggregation(Aggregation::Sum)
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_geo_role(mut self, geo_role: impl Into<String>) -> Self {
        self.geo_role = Some(geo_role.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Caption to display, falling back to the field name.
    pub fn display_caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.name)
    }
}
