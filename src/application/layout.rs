// Grid layout composition - Plot targets to fixed panel positions
use crate::application::regression::{complete_pairs, fit, fit_line};
use crate::domain::dashboard::{
    Annotation, FitOverlay, GridAssignment, GridPosition, Panel, PanelContent, RegressionPanel,
    Trace, ViewSnapshot,
};
use crate::domain::dataset::Dataset;
use crate::domain::record::Reading;
use std::collections::HashMap;
use thiserror::Error;

/// Relative position of the fit annotation inside a regression panel (top-left).
pub const ANNOTATION_X: f64 = 0.05;
pub const ANNOTATION_Y: f64 = 0.95;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("view '{view}' has an empty {rows}x{columns} grid")]
    EmptyGrid {
        view: String,
        rows: usize,
        columns: usize,
    },
    #[error("view '{view}' has an oversized {rows}x{columns} grid")]
    GridTooLarge {
        view: String,
        rows: usize,
        columns: usize,
    },
    #[error("view '{view}' has {targets} plot targets but only {capacity} panels")]
    CapacityExceeded {
        view: String,
        targets: usize,
        capacity: usize,
    },
    #[error("view '{view}': variable '{variable}' belongs to groups '{first}' and '{second}'")]
    OverlappingGroups {
        view: String,
        variable: String,
        first: String,
        second: String,
    },
    #[error("group '{group}' has no members")]
    EmptyGroup { group: String },
}

/// Variables rendered together in one panel under a single legend entry.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableGroup {
    pub name: String,
    pub title: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlotTarget {
    Variable { key: String, title: String },
    Group { group: VariableGroup, title: String },
    Regression { x: String, y: String, title: String },
}

impl PlotTarget {
    pub fn title(&self) -> &str {
        match self {
            PlotTarget::Variable { title, .. }
            | PlotTarget::Group { title, .. }
            | PlotTarget::Regression { title, .. } => title,
        }
    }
}

/// Places one view's targets row-major on a fixed grid.
///
/// All placement invariants are checked in [`GridLayoutComposer::new`]: the
/// targets fit the grid, and no variable is shared between two groups. After
/// construction, composing a snapshot cannot fail.
#[derive(Debug, Clone)]
pub struct GridLayoutComposer {
    view_id: String,
    view_title: String,
    rows: usize,
    columns: usize,
    placements: Vec<(GridPosition, PlotTarget)>,
}

impl GridLayoutComposer {
    pub fn new(
        view_id: impl Into<String>,
        view_title: impl Into<String>,
        rows: usize,
        columns: usize,
        targets: Vec<PlotTarget>,
    ) -> Result<Self, LayoutError> {
        let view_id = view_id.into();

        if rows == 0 || columns == 0 {
            return Err(LayoutError::EmptyGrid {
                view: view_id,
                rows,
                columns,
            });
        }

        let Some(capacity) = rows.checked_mul(columns) else {
            return Err(LayoutError::GridTooLarge {
                view: view_id,
                rows,
                columns,
            });
        };
        if targets.len() > capacity {
            return Err(LayoutError::CapacityExceeded {
                view: view_id,
                targets: targets.len(),
                capacity,
            });
        }

        check_groups(&view_id, &targets)?;

        let placements = targets
            .into_iter()
            .enumerate()
            .map(|(i, target)| {
                let position = GridPosition {
                    row: i / columns,
                    column: i % columns,
                };
                (position, target)
            })
            .collect();

        Ok(Self {
            view_id,
            view_title: view_title.into(),
            rows,
            columns,
            placements,
        })
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn view_title(&self) -> &str {
        &self.view_title
    }

    pub fn placements(&self) -> &[(GridPosition, PlotTarget)] {
        &self.placements
    }

    pub fn compose(&self, dataset: &Dataset) -> ViewSnapshot {
        let panels = self
            .placements
            .iter()
            .map(|(position, target)| Panel {
                position: *position,
                title: target.title().to_string(),
                content: self.panel_content(target, dataset),
            })
            .collect();

        ViewSnapshot {
            id: self.view_id.clone(),
            title: self.view_title.clone(),
            grid: GridAssignment {
                rows: self.rows,
                columns: self.columns,
                panels,
            },
        }
    }

    fn panel_content(&self, target: &PlotTarget, dataset: &Dataset) -> PanelContent {
        match target {
            PlotTarget::Variable { key, .. } => PanelContent::Series {
                traces: vec![Trace {
                    name: key.clone(),
                    values: self.column_or_gap(dataset, key),
                    show_legend: true,
                    legend_group: None,
                    legend_group_title: None,
                }],
            },
            PlotTarget::Group { group, .. } => PanelContent::Series {
                traces: group
                    .members
                    .iter()
                    .enumerate()
                    .map(|(i, member)| Trace {
                        name: member.clone(),
                        values: self.column_or_gap(dataset, member),
                        show_legend: i == 0,
                        legend_group: Some(group.name.clone()),
                        legend_group_title: Some(group.title.clone()),
                    })
                    .collect(),
            },
            PlotTarget::Regression { x, y, .. } => {
                PanelContent::Regression(self.regression_panel(dataset, x, y))
            }
        }
    }

    fn regression_panel(&self, dataset: &Dataset, x: &str, y: &str) -> RegressionPanel {
        let scatter = match (dataset.column(x), dataset.column(y)) {
            (Some(xs), Some(ys)) => complete_pairs(xs, ys),
            _ => {
                tracing::warn!(
                    "View '{}': regression {} vs {} has no source column",
                    self.view_id,
                    x,
                    y
                );
                Vec::new()
            }
        };

        let fit = match fit(&scatter) {
            Ok(result) => Some(FitOverlay {
                line: fit_line(&result, &scatter),
                annotation: Annotation {
                    text: result.equation_label(),
                    x: ANNOTATION_X,
                    y: ANNOTATION_Y,
                },
                result,
            }),
            Err(e) => {
                tracing::debug!("View '{}': no fit for {} vs {}: {}", self.view_id, x, y, e);
                None
            }
        };

        RegressionPanel {
            x_variable: x.to_string(),
            y_variable: y.to_string(),
            scatter,
            fit,
        }
    }

    fn column_or_gap(&self, dataset: &Dataset, key: &str) -> Vec<Reading> {
        match dataset.column(key) {
            Some(column) => column.to_vec(),
            None => {
                tracing::warn!(
                    "View '{}': variable '{}' not in source, rendering empty",
                    self.view_id,
                    key
                );
                vec![None; dataset.len()]
            }
        }
    }
}

fn check_groups(view: &str, targets: &[PlotTarget]) -> Result<(), LayoutError> {
    let mut owner: HashMap<&str, &str> = HashMap::new();

    for target in targets {
        let PlotTarget::Group { group, .. } = target else {
            continue;
        };
        if group.members.is_empty() {
            return Err(LayoutError::EmptyGroup {
                group: group.name.clone(),
            });
        }
        for member in &group.members {
            if let Some(first) = owner.insert(member.as_str(), group.name.as_str()) {
                return Err(LayoutError::OverlappingGroups {
                    view: view.to_string(),
                    variable: member.clone(),
                    first: first.to_string(),
                    second: group.name.clone(),
                });
            }
        }
    }

    Ok(())
}
