// Dashboard domain model
use super::record::Reading;
use super::regression::{FitLine, RegressionResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// The result of one refresh tick. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub tick: u64,
    pub generated_at: DateTime<Utc>,
    pub interval_secs: i64,
    pub axis: Vec<NaiveDateTime>,
    pub views: Vec<ViewSnapshot>,
}

impl DashboardSnapshot {
    pub fn view(&self, id: &str) -> Option<&ViewSnapshot> {
        self.views.iter().find(|v| v.id == id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub id: String,
    pub title: String,
    pub grid: GridAssignment,
}

/// Zero-based cell coordinates, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridPosition {
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridAssignment {
    pub rows: usize,
    pub columns: usize,
    pub panels: Vec<Panel>,
}

impl GridAssignment {
    pub fn panel_at(&self, row: usize, column: usize) -> Option<&Panel> {
        self.panels
            .iter()
            .find(|p| p.position == GridPosition { row, column })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub position: GridPosition,
    pub title: String,
    pub content: PanelContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelContent {
    Series { traces: Vec<Trace> },
    Regression(RegressionPanel),
}

/// A line trace aligned to the snapshot's axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub values: Vec<Reading>,
    pub show_legend: bool,
    pub legend_group: Option<String>,
    pub legend_group_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionPanel {
    pub x_variable: String,
    pub y_variable: String,
    pub scatter: Vec<(f64, f64)>,
    pub fit: Option<FitOverlay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FitOverlay {
    pub result: RegressionResult,
    pub line: FitLine,
    pub annotation: Annotation,
}

/// Text placed at a position relative to the panel domain, `(0, 0)` bottom-left.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
}
