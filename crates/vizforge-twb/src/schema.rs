//! Schema Encoder: datasource column-declaration markup.
//!
//! Emits one `<datasource>` element with its `hyper` connection, regular
//! column declarations in registration order, then calculated-field
//! declarations. Emission is pure over the model, so repeated encodes are
//! byte-identical.

use vizforge_model::{semantic_role, CalculatedField, Column, Datasource};

use crate::xml::escape_xml;
use crate::EncodeError;

/// Dialect schema version stamped on datasources and the workbook root.
pub const SCHEMA_VERSION: &str = "18.1";

/// Encode the `<datasource>` fragment for the datasources section.
pub fn encode_datasource(ds: &Datasource) -> Result<String, EncodeError> {
    let mut columns = String::new();
    for column in ds.columns() {
        columns.push_str(&column_xml(column)?);
        columns.push('\n');
    }
    for calc in ds.calculated_fields() {
        columns.push_str(&calculated_column_xml(calc));
        columns.push('\n');
    }

    Ok(format!(
        "    <datasource caption='{caption}' inline='true' name='{name}' version='{SCHEMA_VERSION}'>
      <connection class='hyper' dbname='{dbname}' default-settings='yes' sslmode='' username='tableau'>
        <relation name='Extract' table='[public].[Extract]' type='table' />
      </connection>
{columns}    </datasource>",
        caption = escape_xml(&ds.caption),
        name = escape_xml(ds.name()),
        dbname = escape_xml(&ds.extract_path),
    ))
}

fn column_xml(column: &Column) -> Result<String, EncodeError> {
    // Unrecognized geographic roles fail here rather than being dropped:
    // a silently missing semantic-role produces an unmappable field.
    let geo_attr = match column.geo_role.as_deref() {
        Some(key) => format!(" semantic-role='{}'", semantic_role(key)?),
        None => String::new(),
    };
    Ok(format!(
        "      <column caption='{caption}' datatype='{datatype}' name='[{name}]' role='{role}' type='{class}'{geo_attr} />",
        caption = escape_xml(column.display_caption()),
        datatype = column.datatype.as_str(),
        name = escape_xml(&column.name),
        role = column.role.as_str(),
        class = column.classification.as_str(),
    ))
}

fn calculated_column_xml(calc: &CalculatedField) -> String {
    let format_attr = match calc.default_format.as_deref() {
        Some(fmt) => format!(" default-format='{}'", escape_xml(fmt)),
        None => String::new(),
    };
    format!(
        "      <column caption='{caption}' datatype='{datatype}' name='{name}' role='{role}' type='{class}'{format_attr}>
        <calculation class='tableau' formula='{formula}' />
      </column>",
        caption = escape_xml(&calc.caption),
        datatype = calc.datatype.as_str(),
        name = escape_xml(&calc.bracket_name()),
        role = calc.role.as_str(),
        class = calc.classification.as_str(),
        formula = escape_xml(&calc.formula),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vizforge_model::{Aggregation, Column, ConfigurationError, Datasource};

    fn sample_datasource() -> Datasource {
        let mut ds = Datasource::with_name("federated.0abc123", "Superstore");
        ds.add_column(Column::text("Category")).unwrap();
        ds.add_column(
            Column::real_measure("Sales").with_aggregation(Aggregation::Sum),
        )
        .unwrap();
        ds.add_column(Column::text("State").with_geo_role("State"))
            .unwrap();
        ds
    }

    #[test]
    fn encodes_columns_in_registration_order() {
        let xml = encode_datasource(&sample_datasource()).unwrap();
        assert!(xml.starts_with(
            "    <datasource caption='Superstore' inline='true' name='federated.0abc123' version='18.1'>"
        ));
        assert!(xml.contains("dbname='Data/Extract.hyper'"));
        let category = xml.find("name='[Category]'").unwrap();
        let sales = xml.find("name='[Sales]'").unwrap();
        let state = xml.find("name='[State]'").unwrap();
        assert!(category < sales && sales < state);
    }

    #[test]
    fn geographic_role_resolves_to_semantic_role() {
        let xml = encode_datasource(&sample_datasource()).unwrap();
        assert!(xml.contains(
            "<column caption='State' datatype='string' name='[State]' role='dimension' type='nominal' semantic-role='[State].[Name]' />"
        ));
    }

    #[test]
    fn unrecognized_geographic_role_fails_encode() {
        let mut ds = Datasource::with_name("federated.0abc123", "Superstore");
        ds.add_column(Column::text("Home").with_geo_role("Planet"))
            .unwrap();
        match encode_datasource(&ds) {
            Err(EncodeError::Configuration(ConfigurationError(key))) => {
                assert_eq!(key, "Planet")
            }
            other => panic!("expected ConfigurationError, got {other:?}"),
        }
    }

    #[test]
    fn calculated_field_declaration_nests_the_formula() {
        let mut ds = sample_datasource();
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])")
            .with_default_format("p0.0%")
            .preaggregated();
        let id = calc.id().to_string();
        ds.add_calculated_field(calc).unwrap();

        let xml = encode_datasource(&ds).unwrap();
        assert!(xml.contains(&format!(
            "<column caption='Profit Ratio' datatype='real' name='[{id}]' role='measure' type='quantitative' default-format='p0.0%'>"
        )));
        assert!(xml.contains(
            "<calculation class='tableau' formula='SUM([Profit])/SUM([Sales])' />"
        ));
    }

    #[test]
    fn formula_text_is_escaped() {
        let mut ds = sample_datasource();
        ds.add_calculated_field(CalculatedField::new(
            "Big Categories",
            "IF [Sales] > 100 THEN 'big' ELSE 'small' END",
        ))
        .unwrap();
        let xml = encode_datasource(&ds).unwrap();
        assert!(xml.contains(
            "formula='IF [Sales] &gt; 100 THEN &apos;big&apos; ELSE &apos;small&apos; END'"
        ));
    }

    #[test]
    fn repeated_encodes_are_byte_identical() {
        let ds = sample_datasource();
        assert_eq!(
            encode_datasource(&ds).unwrap(),
            encode_datasource(&ds).unwrap()
        );
    }
}
