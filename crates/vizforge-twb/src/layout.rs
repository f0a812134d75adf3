//! Dashboard layout: a zone tree on a fixed 0..=100000 coordinate grid.
//!
//! Zones are positioned in grid units independent of the dashboard's pixel
//! size, so the same layout scales to any canvas. The consuming application
//! does not validate coordinates, so out-of-range values are rejected here.

use thiserror::Error;

use crate::xml::escape_xml;

/// Upper bound of the layout grid on both axes.
pub const GRID_MAX: u32 = 100_000;

/// Zone ids start at 4; lower ids are reserved by the consuming application.
const FIRST_ZONE_ID: ZoneId = 4;

/// Identifier of a zone within one dashboard.
pub type ZoneId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("zone {name} coordinate {value} exceeds the grid maximum {GRID_MAX}")]
    CoordinateOutOfRange { name: &'static str, value: u32 },
    #[error("zone {0} does not exist in this dashboard")]
    UnknownParent(ZoneId),
    #[error("zone {0} is not a container and cannot hold children")]
    NotAContainer(ZoneId),
}

/// What a zone renders.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ZoneKind {
    /// Layout container; the only kind that may hold children.
    Container,
    /// Hosts the named worksheet.
    Worksheet(String),
    Text,
    Blank,
    /// Quick-filter card for the given field reference.
    Filter(String),
}

impl ZoneKind {
    fn type_v2(&self) -> &'static str {
        match self {
            ZoneKind::Container => "layout-basic",
            ZoneKind::Worksheet(_) => "worksheet",
            ZoneKind::Text => "text",
            ZoneKind::Blank => "blank",
            ZoneKind::Filter(_) => "filter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Zone {
    id: ZoneId,
    kind: ZoneKind,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    children: Vec<ZoneId>,
}

/// A dashboard: pixel canvas size plus the zone tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    name: String,
    /// Canvas size in pixels, unlike zone coordinates.
    width: u32,
    height: u32,
    zones: Vec<Zone>,
    roots: Vec<ZoneId>,
}

impl Dashboard {
    pub fn new(name: impl Into<String>) -> Self {
        Dashboard {
            name: name.into(),
            width: 1400,
            height: 900,
            zones: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a container zone; returns its id for use as a parent.
    pub fn add_container(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        parent: Option<ZoneId>,
    ) -> Result<ZoneId, LayoutError> {
        self.add_zone(ZoneKind::Container, x, y, w, h, parent)
    }

    /// Add a zone hosting the named worksheet.
    pub fn add_worksheet_zone(
        &mut self,
        worksheet: impl Into<String>,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        parent: Option<ZoneId>,
    ) -> Result<ZoneId, LayoutError> {
        self.add_zone(ZoneKind::Worksheet(worksheet.into()), x, y, w, h, parent)
    }

    pub fn add_text_zone(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        parent: Option<ZoneId>,
    ) -> Result<ZoneId, LayoutError> {
        self.add_zone(ZoneKind::Text, x, y, w, h, parent)
    }

    pub fn add_blank_zone(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        parent: Option<ZoneId>,
    ) -> Result<ZoneId, LayoutError> {
        self.add_zone(ZoneKind::Blank, x, y, w, h, parent)
    }

    /// Add a quick-filter card for a qualified field reference.
    pub fn add_filter_zone(
        &mut self,
        field_ref: impl Into<String>,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        parent: Option<ZoneId>,
    ) -> Result<ZoneId, LayoutError> {
        self.add_zone(ZoneKind::Filter(field_ref.into()), x, y, w, h, parent)
    }

    fn add_zone(
        &mut self,
        kind: ZoneKind,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        parent: Option<ZoneId>,
    ) -> Result<ZoneId, LayoutError> {
        for (name, value) in [("x", x), ("y", y), ("w", w), ("h", h)] {
            if value > GRID_MAX {
                return Err(LayoutError::CoordinateOutOfRange { name, value });
            }
        }
        let id = FIRST_ZONE_ID + self.zones.len() as ZoneId;
        if let Some(parent_id) = parent {
            let parent_zone = self
                .zone_mut(parent_id)
                .ok_or(LayoutError::UnknownParent(parent_id))?;
            if parent_zone.kind != ZoneKind::Container {
                return Err(LayoutError::NotAContainer(parent_id));
            }
            parent_zone.children.push(id);
        } else {
            self.roots.push(id);
        }
        self.zones.push(Zone {
            id,
            kind,
            x,
            y,
            w,
            h,
            children: Vec::new(),
        });
        Ok(id)
    }

    fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id.checked_sub(FIRST_ZONE_ID)? as usize)
    }

    fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(id.checked_sub(FIRST_ZONE_ID)? as usize)
    }

    /// Encode the `<dashboard>` fragment for the dashboards section.
    pub fn to_xml(&self) -> String {
        let mut zones = String::new();
        for id in &self.roots {
            self.zone_xml(*id, 8, &mut zones);
        }
        format!(
            "    <dashboard name='{name}'>
      <style />
      <size maxheight='{h}' maxwidth='{w}' minheight='{h}' minwidth='{w}' />
      <zones>
{zones}      </zones>
    </dashboard>",
            name = escape_xml(&self.name),
            w = self.width,
            h = self.height,
        )
    }

    fn zone_xml(&self, id: ZoneId, indent: usize, out: &mut String) {
        let Some(zone) = self.zone(id) else { return };
        let pad = " ".repeat(indent);
        let name_attr = match &zone.kind {
            ZoneKind::Worksheet(name) => format!(" name='{}'", escape_xml(name)),
            _ => String::new(),
        };
        let param_attr = match &zone.kind {
            ZoneKind::Filter(field) => format!(" param='{}'", escape_xml(field)),
            _ => String::new(),
        };
        let attrs = format!(
            "h='{h}' id='{id}'{name_attr}{param_attr} type-v2='{ty}' w='{w}' x='{x}' y='{y}'",
            h = zone.h,
            id = zone.id,
            ty = zone.kind.type_v2(),
            w = zone.w,
            x = zone.x,
            y = zone.y,
        );
        if zone.children.is_empty() {
            out.push_str(&format!("{pad}<zone {attrs} />\n"));
        } else {
            out.push_str(&format!("{pad}<zone {attrs}>\n"));
            for child in &zone.children {
                self.zone_xml(*child, indent + 2, out);
            }
            out.push_str(&format!("{pad}</zone>\n"));
        }
    }
}

/// Lay out the named worksheets as one row of equal-width tiles.
///
/// Division truncates, so the last tile absorbs the remainder and the row
/// always spans the full grid width.
pub fn kpi_row(
    dashboard: &mut Dashboard,
    worksheets: &[&str],
    y: u32,
    h: u32,
    parent: Option<ZoneId>,
) -> Result<Vec<ZoneId>, LayoutError> {
    if worksheets.is_empty() {
        return Ok(Vec::new());
    }
    let tile_w = GRID_MAX / worksheets.len() as u32;
    let mut ids = Vec::with_capacity(worksheets.len());
    for (i, name) in worksheets.iter().enumerate() {
        let x = tile_w * i as u32;
        let w = if i + 1 == worksheets.len() {
            GRID_MAX - x
        } else {
            tile_w
        };
        ids.push(dashboard.add_worksheet_zone(*name, x, y, w, h, parent)?);
    }
    Ok(ids)
}

/// Two worksheets side by side, splitting the grid width evenly.
pub fn two_column_split(
    dashboard: &mut Dashboard,
    left: &str,
    right: &str,
    y: u32,
    h: u32,
    parent: Option<ZoneId>,
) -> Result<(ZoneId, ZoneId), LayoutError> {
    let half = GRID_MAX / 2;
    let l = dashboard.add_worksheet_zone(left, 0, y, half, h, parent)?;
    let r = dashboard.add_worksheet_zone(right, half, y, GRID_MAX - half, h, parent)?;
    Ok((l, r))
}

/// One worksheet spanning the full grid width.
pub fn full_width(
    dashboard: &mut Dashboard,
    worksheet: &str,
    y: u32,
    h: u32,
    parent: Option<ZoneId>,
) -> Result<ZoneId, LayoutError> {
    dashboard.add_worksheet_zone(worksheet, 0, y, GRID_MAX, h, parent)
}

/// The stock overview arrangement: a KPI strip, a two-chart middle band and
/// a full-width detail chart, all under one root container.
pub fn overview_layout(
    dashboard: &mut Dashboard,
    kpis: &[&str],
    middle_left: &str,
    middle_right: &str,
    bottom: &str,
) -> Result<ZoneId, LayoutError> {
    let root = dashboard.add_container(0, 0, GRID_MAX, GRID_MAX, None)?;
    kpi_row(dashboard, kpis, 0, 15_000, Some(root))?;
    two_column_split(
        dashboard,
        middle_left,
        middle_right,
        15_000,
        45_000,
        Some(root),
    )?;
    full_width(dashboard, bottom, 60_000, 40_000, Some(root))?;
    Ok(root)
}
