//! Document assembler: the full workbook XML envelope.

use vizforge_model::{Datasource, NameCollisionError, WorksheetSpec};

use crate::layout::Dashboard;
use crate::schema::{encode_datasource, SCHEMA_VERSION};
use crate::worksheet::encode_worksheet;
use crate::xml::escape_xml;
use crate::EncodeError;

/// Build string stamped on the workbook root. The consuming application
/// uses it only to pick a compatibility profile.
const SOURCE_BUILD: &str = "2022.3.0 (20223.22.1005.1835)";

/// A complete workbook: datasources, worksheets and dashboards.
///
/// Names are unique per section; collisions are rejected at registration so
/// assembly itself cannot fail on them.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    datasources: Vec<Datasource>,
    worksheets: Vec<WorksheetSpec>,
    dashboards: Vec<Dashboard>,
}

impl Workbook {
    pub fn new() -> Self {
        Workbook::default()
    }

    pub fn add_datasource(&mut self, datasource: Datasource) -> Result<(), NameCollisionError> {
        if self.datasources.iter().any(|d| d.name() == datasource.name()) {
            return Err(NameCollisionError::Datasource(datasource.name().to_string()));
        }
        self.datasources.push(datasource);
        Ok(())
    }

    pub fn add_worksheet(&mut self, worksheet: WorksheetSpec) -> Result<(), NameCollisionError> {
        if self.worksheets.iter().any(|w| w.name == worksheet.name) {
            return Err(NameCollisionError::Worksheet(worksheet.name));
        }
        self.worksheets.push(worksheet);
        Ok(())
    }

    pub fn add_dashboard(&mut self, dashboard: Dashboard) -> Result<(), NameCollisionError> {
        if self.dashboards.iter().any(|d| d.name() == dashboard.name()) {
            return Err(NameCollisionError::Dashboard(dashboard.name().to_string()));
        }
        self.dashboards.push(dashboard);
        Ok(())
    }

    pub fn datasources(&self) -> &[Datasource] {
        &self.datasources
    }

    pub fn worksheets(&self) -> &[WorksheetSpec] {
        &self.worksheets
    }

    pub fn dashboards(&self) -> &[Dashboard] {
        &self.dashboards
    }

    /// Assemble the complete workbook document.
    pub fn to_xml(&self) -> Result<String, EncodeError> {
        let mut out = String::new();
        out.push_str("<?xml version='1.0' encoding='utf-8' ?>\n");
        out.push_str(&format!(
            "<workbook source-build='{SOURCE_BUILD}' source-platform='win' version='{SCHEMA_VERSION}' xmlns:user='http://www.tableausoftware.com/xml/user'>\n"
        ));
        out.push_str(
            "  <preferences>
    <preference name='ui.encoding.shelf.height' value='24' />
    <preference name='ui.shelf.height' value='26' />
  </preferences>\n",
        );

        out.push_str("  <datasources>\n");
        for ds in &self.datasources {
            out.push_str(&encode_datasource(ds)?);
            out.push('\n');
        }
        out.push_str("  </datasources>\n");

        out.push_str("  <worksheets>\n");
        for ws in &self.worksheets {
            out.push_str(&encode_worksheet(ws)?);
            out.push('\n');
        }
        out.push_str("  </worksheets>\n");

        if !self.dashboards.is_empty() {
            out.push_str("  <dashboards>\n");
            for dashboard in &self.dashboards {
                out.push_str(&dashboard.to_xml());
                out.push('\n');
            }
            out.push_str("  </dashboards>\n");
        }

        // One window entry so the document opens on a worksheet instead of
        // an empty canvas.
        let active = self
            .worksheets
            .first()
            .map(|w| w.name.as_str())
            .unwrap_or("Sheet 1");
        out.push_str(&format!(
            "  <windows source-height='30'>
    <window class='worksheet' name='{active}'>
      <cards>
        <edge name='left'>
          <strip size='160'>
            <card type='pages' />
            <card type='filters' />
            <card type='marks' />
          </strip>
        </edge>
        <edge name='top'>
          <strip size='2147483647'>
            <card type='columns' />
          </strip>
          <strip size='2147483647'>
            <card type='rows' />
          </strip>
        </edge>
      </cards>
    </window>
  </windows>\n",
            active = escape_xml(active)
        ));
        out.push_str("</workbook>\n");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vizforge_model::{
        Aggregation, Column, DependencyColumn, MarkType, Shelf, ShelfAssignment,
    };

    fn sample_workbook() -> Workbook {
        let mut ds = Datasource::with_name("federated.0abc123", "Superstore");
        ds.add_column(Column::text("Category")).unwrap();
        ds.add_column(Column::real_measure("Sales")).unwrap();

        let mut ws = WorksheetSpec::new("Sales by Category", ds.name(), MarkType::Bar);
        ws.assign(ShelfAssignment::column(
            Shelf::Rows,
            "Category",
            Aggregation::None,
        ))
        .assign(ShelfAssignment::column(
            Shelf::Columns,
            "Sales",
            Aggregation::Sum,
        ))
        .depends_on(DependencyColumn::from_column(&Column::text("Category")))
        .depends_on(DependencyColumn::from_column(&Column::real_measure("Sales")));

        let mut wb = Workbook::new();
        wb.add_datasource(ds).unwrap();
        wb.add_worksheet(ws).unwrap();
        wb
    }

    #[test]
    fn envelope_carries_the_dialect_version() {
        let xml = sample_workbook().to_xml().unwrap();
        assert!(xml.starts_with("<?xml version='1.0' encoding='utf-8' ?>\n<workbook "));
        assert!(xml.contains("version='18.1'"));
        assert!(xml.contains("xmlns:user='http://www.tableausoftware.com/xml/user'"));
        assert!(xml.ends_with("</workbook>\n"));
    }

    #[test]
    fn sections_appear_in_document_order() {
        let xml = sample_workbook().to_xml().unwrap();
        let prefs = xml.find("<preferences>").unwrap();
        let datasources = xml.find("<datasources>").unwrap();
        let worksheets = xml.find("<worksheets>").unwrap();
        let windows = xml.find("<windows").unwrap();
        assert!(prefs < datasources && datasources < worksheets && worksheets < windows);
        // No dashboards registered, no dashboards section.
        assert!(!xml.contains("<dashboards>"));
    }

    #[test]
    fn first_worksheet_becomes_the_active_window() {
        let xml = sample_workbook().to_xml().unwrap();
        assert!(xml.contains("<window class='worksheet' name='Sales by Category'>"));
    }

    #[test]
    fn empty_workbook_falls_back_to_a_default_window() {
        let xml = Workbook::new().to_xml().unwrap();
        assert!(xml.contains("<window class='worksheet' name='Sheet 1'>"));
    }

    #[test]
    fn dashboard_section_emits_when_present() {
        let mut wb = sample_workbook();
        let mut dash = Dashboard::new("Overview");
        dash.add_worksheet_zone("Sales by Category", 0, 0, 100_000, 100_000, None)
            .unwrap();
        wb.add_dashboard(dash).unwrap();
        let xml = wb.to_xml().unwrap();
        assert!(xml.contains("<dashboards>\n    <dashboard name='Overview'>"));
    }

    #[test]
    fn duplicate_section_names_collide() {
        let mut wb = sample_workbook();
        assert_eq!(
            wb.add_worksheet(WorksheetSpec::new(
                "Sales by Category",
                "federated.0abc123",
                MarkType::Line,
            )),
            Err(NameCollisionError::Worksheet("Sales by Category".to_string()))
        );
        let dash = Dashboard::new("Overview");
        wb.add_dashboard(dash.clone()).unwrap();
        assert_eq!(
            wb.add_dashboard(dash),
            Err(NameCollisionError::Dashboard("Overview".to_string()))
        );
        assert_eq!(
            wb.add_datasource(Datasource::with_name("federated.0abc123", "Again")),
            Err(NameCollisionError::Datasource("federated.0abc123".to_string()))
        );
    }
}
