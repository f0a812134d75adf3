//! Worksheet Encoder: per-worksheet shelf bindings and dependency markup.
//!
//! This is the rule-heavy part of the dialect. Every shelf appearance is
//! lowered to a field-instance reference whose derivation tag, field key and
//! type key must all agree with the dependency declarations, or the
//! consuming application renders the sheet wrong without any diagnostic.

use std::collections::HashMap;

use thiserror::Error;

use vizforge_model::{
    semantic_role, DependencyColumn, FieldReference, InvalidFieldSpec, MarkType, Shelf,
    WorksheetSpec,
};

use crate::xml::escape_xml;
use crate::EncodeError;

/// A shelf assignment referenced a column the worksheet never declared as a
/// dependency. The consuming application would accept the markup and render
/// an empty worksheet, so this is rejected at encode time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("worksheet {worksheet:?} places {field:?} on the {shelf} shelf but does not declare it as a dependency")]
pub struct MissingDependencyError {
    pub worksheet: String,
    pub field: String,
    pub shelf: Shelf,
}

/// Encode the `<worksheet>` fragment for the worksheets section.
pub fn encode_worksheet(spec: &WorksheetSpec) -> Result<String, EncodeError> {
    // A Text mark with axis fields is an axis-bearing chart, not a KPI card.
    if spec.mark == MarkType::Text {
        if let Some(a) = spec
            .assignments
            .iter()
            .find(|a| matches!(a.shelf, Shelf::Rows | Shelf::Columns))
        {
            return Err(InvalidFieldSpec::AxisShelfOnTextMark {
                worksheet: spec.name.clone(),
                shelf: a.shelf,
            }
            .into());
        }
    }

    // Dependencies are declared once per column, whatever the reuse count;
    // the first declaration wins for lookups.
    let mut by_name: HashMap<&str, &DependencyColumn> = HashMap::new();
    for dep in &spec.dependencies {
        by_name.entry(dep.name.as_str()).or_insert(dep);
    }

    let mut references: Vec<(Shelf, FieldReference)> = Vec::new();
    for assignment in &spec.assignments {
        let key = assignment.field.key();
        let dep = by_name.get(key).copied().ok_or_else(|| {
            MissingDependencyError {
                worksheet: spec.name.clone(),
                field: key.to_string(),
                shelf: assignment.shelf,
            }
        })?;
        let reference = FieldReference::new(
            assignment.derivation(dep.role),
            key,
            dep.classification.type_tag(),
        );
        references.push((assignment.shelf, reference));
    }

    let mut dep_columns = String::new();
    for dep in &spec.dependencies {
        dep_columns.push_str(&dependency_column_xml(dep)?);
        dep_columns.push('\n');
    }

    // Two shelves using the same derivation share one instance declaration.
    let mut instances = String::new();
    let mut seen = Vec::new();
    for (_, reference) in &references {
        let name = reference.instance_name();
        if seen.contains(&name) {
            continue;
        }
        instances.push_str(&column_instance_xml(reference, &by_name));
        instances.push('\n');
        seen.push(name);
    }

    let rows = shelf_refs(&references, Shelf::Rows, &spec.datasource);
    let cols = shelf_refs(&references, Shelf::Columns, &spec.datasource);
    let encodings = encodings_xml(&references, &spec.datasource);

    // The view's datasource alias drops the `federated.` prefix.
    let ds_caption = spec
        .datasource
        .rsplit('.')
        .next()
        .unwrap_or(spec.datasource.as_str());

    Ok(format!(
        "    <worksheet name='{name}'>
      <table>
        <view>
          <datasources>
            <datasource caption='{ds_caption}' name='{datasource}' />
          </datasources>
          <datasource-dependencies datasource='{datasource}'>
{dep_columns}{instances}          </datasource-dependencies>
          <aggregation value='true' />
        </view>
        <style />
        <panes>
          <pane selection-relaxation-option='selection-relaxation-allow'>
            <view>
              <breakdown value='auto' />
            </view>
            <mark class='{mark}' />{encodings}
          </pane>
        </panes>
        <rows>{rows}</rows>
        <cols>{cols}</cols>
      </table>
    </worksheet>",
        name = escape_xml(&spec.name),
        ds_caption = escape_xml(ds_caption),
        datasource = escape_xml(&spec.datasource),
        mark = spec.mark.as_str(),
    ))
}

/// One `<column>` declaration inside `datasource-dependencies`.
fn dependency_column_xml(dep: &DependencyColumn) -> Result<String, EncodeError> {
    let agg_attr = match dep.aggregation {
        Some(agg) => format!(" aggregation='{}'", agg.as_attr()),
        None => String::new(),
    };
    let geo_attr = match dep.geo_role.as_deref() {
        Some(key) => format!(" semantic-role='{}'", semantic_role(key)?),
        None => String::new(),
    };
    Ok(format!(
        "          <column caption='{caption}' datatype='{datatype}' name='[{name}]' role='{role}' type='{class}'{agg_attr}{geo_attr} />",
        caption = escape_xml(dep.display_caption()),
        datatype = dep.datatype.as_str(),
        name = escape_xml(&dep.name),
        role = dep.role.as_str(),
        class = dep.classification.as_str(),
    ))
}

fn column_instance_xml(
    reference: &FieldReference,
    deps: &HashMap<&str, &DependencyColumn>,
) -> String {
    let class = deps
        .get(reference.field_key.as_str())
        .map(|dep| dep.classification.as_str())
        .unwrap_or("nominal");
    format!(
        "            <column-instance column='[{key}]' derivation='{derivation}' name='{instance}' pivot='key' type='{class}' />",
        key = escape_xml(&reference.field_key),
        derivation = reference.derivation.as_attr(),
        instance = escape_xml(&reference.instance_name()),
    )
}

fn shelf_refs(references: &[(Shelf, FieldReference)], shelf: Shelf, datasource: &str) -> String {
    // Multiple fields on one shelf are space-separated; the consuming
    // application parses the shelf as a single combined expression.
    references
        .iter()
        .filter(|(s, _)| *s == shelf)
        .map(|(_, r)| r.qualified(datasource))
        .collect::<Vec<_>>()
        .join(" ")
}

fn encodings_xml(references: &[(Shelf, FieldReference)], datasource: &str) -> String {
    let mut lines = Vec::new();
    for (shelf, element) in [
        (Shelf::Color, "color"),
        (Shelf::Size, "size"),
        (Shelf::Detail, "lod"),
        (Shelf::Label, "text"),
    ] {
        for (_, reference) in references.iter().filter(|(s, _)| *s == shelf) {
            lines.push(format!(
                "              <{element} column='{}' />",
                reference.qualified(datasource)
            ));
        }
    }
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "\n            <encodings>\n{}\n            </encodings>",
        lines.join("\n")
    )
}
