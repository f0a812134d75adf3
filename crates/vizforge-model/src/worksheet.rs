use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CalculatedField, Classification, Column, DataType, Derivation, InvalidFieldSpec, Role};

/// Mark type drawn for every row of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkType {
    Automatic,
    Bar,
    Line,
    Area,
    Circle,
    Square,
    /// Text marks render a value instead of a glyph; with no axis fields this
    /// is the KPI / big-number card.
    Text,
    Map,
    Polygon,
    Shape,
    Pie,
    GanttBar,
}

impl MarkType {
    /// The token emitted in `<mark class='…' />`.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkType::Automatic => "Automatic",
            MarkType::Bar => "Bar",
            MarkType::Line => "Line",
            MarkType::Area => "Area",
            MarkType::Circle => "Circle",
            MarkType::Square => "Square",
            MarkType::Text => "Text",
            MarkType::Map => "Map",
            MarkType::Polygon => "Polygon",
            MarkType::Shape => "Shape",
            MarkType::Pie => "Pie",
            MarkType::GanttBar => "GanttBar",
        }
    }
}

impl FromStr for MarkType {
    type Err = InvalidFieldSpec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Automatic" => Ok(MarkType::Automatic),
            "Bar" => Ok(MarkType::Bar),
            "Line" => Ok(MarkType::Line),
            "Area" => Ok(MarkType::Area),
            "Circle" => Ok(MarkType::Circle),
            "Square" => Ok(MarkType::Square),
            "Text" => Ok(MarkType::Text),
            "Map" => Ok(MarkType::Map),
            "Polygon" => Ok(MarkType::Polygon),
            "Shape" => Ok(MarkType::Shape),
            "Pie" => Ok(MarkType::Pie),
            "GanttBar" => Ok(MarkType::GanttBar),
            other => Err(InvalidFieldSpec::UnknownMarkType(other.to_string())),
        }
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistical aggregation requested for one shelf appearance of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    None,
    Sum,
    Avg,
    Count,
    CountD,
    Min,
    Max,
    Median,
    /// Returns the value when all rows agree, `*` otherwise.
    Attr,
}

impl Aggregation {
    /// Capitalized form used in `aggregation` attributes.
    pub fn as_attr(self) -> &'static str {
        match self {
            Aggregation::None => "None",
            Aggregation::Sum => "Sum",
            Aggregation::Avg => "Avg",
            Aggregation::Count => "Count",
            Aggregation::CountD => "Countd",
            Aggregation::Min => "Min",
            Aggregation::Max => "Max",
            Aggregation::Median => "Median",
            Aggregation::Attr => "Attr",
        }
    }
}

impl FromStr for Aggregation {
    type Err = InvalidFieldSpec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Aggregation::None),
            "Sum" => Ok(Aggregation::Sum),
            "Avg" => Ok(Aggregation::Avg),
            "Count" => Ok(Aggregation::Count),
            "Countd" => Ok(Aggregation::CountD),
            "Min" => Ok(Aggregation::Min),
            "Max" => Ok(Aggregation::Max),
            "Median" => Ok(Aggregation::Median),
            "Attr" => Ok(Aggregation::Attr),
            other => Err(InvalidFieldSpec::UnknownAggregation(other.to_string())),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_attr())
    }
}

/// A binding slot on the worksheet that a field reference is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shelf {
    Rows,
    Columns,
    Color,
    Size,
    /// Emitted as the `text` encoding.
    Label,
    /// Level-of-detail; emitted as the `lod` encoding.
    Detail,
}

impl Shelf {
    pub fn as_str(self) -> &'static str {
        match self {
            Shelf::Rows => "rows",
            Shelf::Columns => "columns",
            Shelf::Color => "color",
            Shelf::Size => "size",
            Shelf::Label => "label",
            Shelf::Detail => "detail",
        }
    }
}

impl fmt::Display for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The field side of a shelf assignment: a raw column referenced by name, or
/// a registered calculated field referenced by internal identifier.
///
/// Carrying the pre-aggregated flag here makes the derivation rule an
/// exhaustive match instead of a convention callers must remember.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Column { name: String },
    Calculated { id: String, preaggregated: bool },
}

impl FieldKind {
    /// The key used in field references and dependency lookups.
    pub fn key(&self) -> &str {
        match self {
            FieldKind::Column { name } => name,
            FieldKind::Calculated { id, .. } => id,
        }
    }
}

/// Binds one field appearance to a shelf within a worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShelfAssignment {
    pub shelf: Shelf,
    pub field: FieldKind,
    pub aggregation: Aggregation,
}

impl ShelfAssignment {
    /// Assign a raw column.
    pub fn column(shelf: Shelf, name: impl Into<String>, aggregation: Aggregation) -> Self {
        ShelfAssignment {
            shelf,
            field: FieldKind::Column { name: name.into() },
            aggregation,
        }
    }

    /// Assign a registered calculated field. The pre-aggregated flag travels
    /// with the assignment so the encoder cannot lose it.
    pub fn calculated(shelf: Shelf, field: &CalculatedField, aggregation: Aggregation) -> Self {
        ShelfAssignment {
            shelf,
            field: FieldKind::Calculated {
                id: field.id().to_string(),
                preaggregated: field.preaggregated,
            },
            aggregation,
        }
    }

    /// Resolve the derivation tag for this appearance.
    ///
    /// A pre-aggregated calculated field is always `User`, whatever
    /// aggregation the caller asked for: its formula already aggregates, and
    /// wrapping it again renders a wrong number with no diagnostic.
    /// Dimensions are never aggregated.
    pub fn derivation(&self, role: Role) -> Derivation {
        match &self.field {
            FieldKind::Calculated {
                preaggregated: true,
                ..
            } => Derivation::User,
            _ if role == Role::Dimension => Derivation::None,
            _ => self.aggregation.into(),
        }
    }
}

/// Type information for one column a worksheet depends on.
///
/// Worksheets must re-declare every column they touch; the consuming
/// application does not resolve them from the datasource section, and a
/// missing declaration renders an empty worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyColumn {
    /// Column name, or a calculated field's internal identifier.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub datatype: DataType,
    pub role: Role,
    pub classification: Classification,
    /// Emitted as an `aggregation` attribute when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    /// Geographic-role key, resolved through the fixed table at encode time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_role: Option<String>,
}

impl DependencyColumn {
    pub fn new(
        name: impl Into<String>,
        datatype: DataType,
        role: Role,
        classification: Classification,
    ) -> Self {
        DependencyColumn {
            name: name.into(),
            caption: None,
            datatype,
            role,
            classification,
            aggregation: None,
            geo_role: None,
        }
    }

    /// Dependency declaration for a datasource column, carrying over its
    /// caption, aggregation hint and geographic role.
    pub fn from_column(column: &Column) -> Self {
        DependencyColumn {
            name: column.name.clone(),
            caption: column.caption.clone(),
            datatype: column.datatype,
            role: column.role,
            classification: column.classification,
            aggregation: column.aggregation,
            geo_role: column.geo_role.clone(),
        }
    }

    /// Dependency declaration for a calculated field. The declaration names
    /// the internal identifier and keeps the caption for display.
    pub fn from_calculated(field: &CalculatedField) -> Self {
        DependencyColumn {
            name: field.id().to_string(),
            caption: Some(field.caption.clone()),
            datatype: field.datatype,
            role: field.role,
            classification: field.classification,
            aggregation: (field.role == Role::Measure).then_some(Aggregation::Sum),
            geo_role: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn with_geo_role(mut self, geo_role: impl Into<String>) -> Self {
        self.geo_role = Some(geo_role.into());
        self
    }

    pub fn display_caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.name)
    }
}

/// Declarative description of one worksheet: a mark type plus shelf
/// assignments against a named datasource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetSpec {
    /// Unique across the workbook; dashboards reference worksheets by name.
    pub name: String,
    /// Name of the datasource the shelves bind against.
    pub datasource: String,
    pub mark: MarkType,
    /// Shelf order is emission order within each shelf.
    pub assignments: Vec<ShelfAssignment>,
    /// Every column referenced by an assignment must appear here.
    pub dependencies: Vec<DependencyColumn>,
}

impl WorksheetSpec {
    pub fn new(name: impl Into<String>, datasource: impl Into<String>, mark: MarkType) -> Self {
        WorksheetSpec {
            name: name.into(),
            datasource: datasource.into(),
            mark,
            assignments: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn assign(&mut self, assignment: ShelfAssignment) -> &mut Self {
        self.assignments.push(assignment);
        self
    }

    pub fn depends_on(&mut self, column: DependencyColumn) -> &mut Self {
        self.dependencies.push(column);
        self
    }

    /// Assignments bound to one shelf, in declaration order.
    pub fn shelf(&self, shelf: Shelf) -> impl Iterator<Item = &ShelfAssignment> {
        self.assignments.iter().filter(move |a| a.shelf == shelf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mark_type_tokens_round_trip() {
        for mark in [
            MarkType::Automatic,
            MarkType::Bar,
            MarkType::Text,
            MarkType::GanttBar,
        ] {
            assert_eq!(mark.as_str().parse::<MarkType>().unwrap(), mark);
        }
        assert_eq!(
            "Sparkline".parse::<MarkType>(),
            Err(InvalidFieldSpec::UnknownMarkType("Sparkline".to_string()))
        );
    }

    #[test]
    fn dimension_assignments_derive_none() {
        let a = ShelfAssignment::column(Shelf::Rows, "Category", Aggregation::Sum);
        assert_eq!(a.derivation(Role::Dimension), Derivation::None);
    }

    #[test]
    fn measure_assignments_map_their_aggregation() {
        let a = ShelfAssignment::column(Shelf::Columns, "Sales", Aggregation::Avg);
        assert_eq!(a.derivation(Role::Measure), Derivation::Avg);
    }

    #[test]
    fn preaggregated_calc_is_always_user() {
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])").preaggregated();
        for agg in [Aggregation::Sum, Aggregation::Avg, Aggregation::Count] {
            let a = ShelfAssignment::calculated(Shelf::Columns, &calc, agg);
            assert_eq!(a.derivation(Role::Measure), Derivation::User);
        }
    }

    #[test]
    fn plain_calc_maps_its_aggregation() {
        let calc = CalculatedField::new("Unit Price", "[Sales]/[Quantity]");
        let a = ShelfAssignment::calculated(Shelf::Columns, &calc, Aggregation::Avg);
        assert_eq!(a.derivation(Role::Measure), Derivation::Avg);
        assert_eq!(a.field.key(), calc.id());
    }

    #[test]
    fn dependency_from_calculated_names_the_id() {
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])").preaggregated();
        let dep = DependencyColumn::from_calculated(&calc);
        assert_eq!(dep.name, calc.id());
        assert_eq!(dep.display_caption(), "Profit Ratio");
        assert_eq!(dep.aggregation, Some(Aggregation::Sum));
    }

    #[test]
    fn shelf_filter_preserves_order() {
        let mut ws = WorksheetSpec::new("Sheet 1", "federated.0abc123", MarkType::Bar);
        ws.assign(ShelfAssignment::column(
            Shelf::Rows,
            "Category",
            Aggregation::None,
        ))
        .assign(ShelfAssignment::column(
            Shelf::Rows,
            "Sub-Category",
            Aggregation::None,
        ))
        .assign(ShelfAssignment::column(
            Shelf::Columns,
            "Sales",
            Aggregation::Sum,
        ));
        let rows: Vec<_> = ws.shelf(Shelf::Rows).map(|a| a.field.key()).collect();
        assert_eq!(rows, vec!["Category", "Sub-Category"]);
    }
}
