use crate::application::ingest::{DEFAULT_TIMESTAMP_FORMATS, IngestSettings};
use crate::application::layout::{GridLayoutComposer, LayoutError, PlotTarget, VariableGroup};
use crate::application::reindex::DEFAULT_MAX_AXIS_POINTS;
use crate::application::validity::{ValidityFilter, ValidityRule};
use chrono::TimeDelta;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("invalid bind address '{0}'")]
    InvalidBind(String),
    #[error("delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(String),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("{field} = {secs} is out of range")]
    IntervalOutOfRange { field: &'static str, secs: u64 },
    #[error("rule for '{variable}' has invalid bounds [{lower}, {upper}]")]
    InvalidBounds {
        variable: String,
        lower: f64,
        upper: f64,
    },
    #[error("more than one rule for '{0}'")]
    DuplicateRule(String),
    #[error("group '{0}' is defined more than once")]
    DuplicateGroup(String),
    #[error("view '{0}' is defined more than once")]
    DuplicateView(String),
    #[error("view '{view}' references unknown group '{group}'")]
    UnknownGroup { view: String, group: String },
    #[error("no views configured")]
    NoViews,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub source: SourceSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub views: Vec<ViewConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    /// Local path or http(s) URL
    pub location: String,
    #[serde(default)]
    pub skip_rows: Vec<usize>,
    pub delimiter: Option<String>,
    pub timestamp_column: Option<String>,
    pub timestamp_formats: Option<Vec<String>>,
    pub ignored_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineSettings {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Inferred from the data when absent
    pub sampling_interval_secs: Option<u64>,
    #[serde(default = "default_max_axis_points")]
    pub max_axis_points: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            sampling_interval_secs: None,
            max_axis_points: default_max_axis_points(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    pub variable: String,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupConfig {
    pub name: String,
    pub title: Option<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    pub id: String,
    pub title: String,
    #[serde(default = "default_grid_side")]
    pub rows: usize,
    #[serde(default = "default_grid_side")]
    pub columns: usize,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetConfig {
    Variable {
        key: String,
        title: Option<String>,
    },
    Group {
        group: String,
        title: Option<String>,
    },
    Regression {
        x: String,
        y: String,
        title: Option<String>,
    },
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_max_axis_points() -> usize {
    DEFAULT_MAX_AXIS_POINTS
}

fn default_grid_side() -> usize {
    4
}

/// Static configuration after every startup check has passed.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub bind: SocketAddr,
    pub source_location: String,
    pub ingest: IngestSettings,
    pub refresh_interval: Duration,
    pub sampling_interval: Option<TimeDelta>,
    pub max_axis_points: usize,
    pub filter: ValidityFilter,
    pub composers: Vec<GridLayoutComposer>,
}

/// Loads `config/dashboard.*`, then `FLUXDASH__`-prefixed environment overrides.
pub fn load_dashboard_config() -> Result<ValidatedConfig, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(
            config::Environment::with_prefix("FLUXDASH")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<DashboardConfig>()?.validate()
}

pub fn parse_dashboard_config(toml: &str) -> Result<ValidatedConfig, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    settings.try_deserialize::<DashboardConfig>()?.validate()
}

impl DashboardConfig {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let bind: SocketAddr = self
            .server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))?;

        if self.pipeline.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("pipeline.refresh_interval_secs"));
        }
        if self.pipeline.sampling_interval_secs == Some(0) {
            return Err(ConfigError::ZeroInterval("pipeline.sampling_interval_secs"));
        }
        if self.pipeline.max_axis_points == 0 {
            return Err(ConfigError::ZeroInterval("pipeline.max_axis_points"));
        }

        let ingest = ingest_settings(&self.source)?;
        let filter = validity_filter(&self.rules)?;
        let composers = composers(&self.groups, &self.views)?;

        let sampling_interval = self
            .pipeline
            .sampling_interval_secs
            .map(|secs| {
                i64::try_from(secs)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .ok_or(ConfigError::IntervalOutOfRange {
                        field: "pipeline.sampling_interval_secs",
                        secs,
                    })
            })
            .transpose()?;

        Ok(ValidatedConfig {
            bind,
            source_location: self.source.location,
            ingest,
            refresh_interval: Duration::from_secs(self.pipeline.refresh_interval_secs),
            sampling_interval,
            max_axis_points: self.pipeline.max_axis_points,
            filter,
            composers,
        })
    }
}

fn ingest_settings(source: &SourceSettings) -> Result<IngestSettings, ConfigError> {
    let delimiter = match source.delimiter.as_deref() {
        None => b',',
        Some(d) if d.len() == 1 && d.is_ascii() => d.as_bytes()[0],
        Some("\\t") => b'\t',
        Some(other) => return Err(ConfigError::InvalidDelimiter(other.to_string())),
    };

    let defaults = IngestSettings::default();
    Ok(IngestSettings {
        skip_rows: source.skip_rows.iter().copied().collect(),
        delimiter,
        timestamp_column: source
            .timestamp_column
            .clone()
            .unwrap_or(defaults.timestamp_column),
        timestamp_formats: source.timestamp_formats.clone().unwrap_or_else(|| {
            DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect()
        }),
        ignored_columns: source
            .ignored_columns
            .clone()
            .unwrap_or(defaults.ignored_columns),
    })
}

fn validity_filter(rules: &[RuleConfig]) -> Result<ValidityFilter, ConfigError> {
    let mut by_variable = BTreeMap::new();

    for rule in rules {
        if !rule.lower.is_finite() || !rule.upper.is_finite() || rule.lower > rule.upper {
            return Err(ConfigError::InvalidBounds {
                variable: rule.variable.clone(),
                lower: rule.lower,
                upper: rule.upper,
            });
        }
        let previous = by_variable.insert(
            rule.variable.clone(),
            ValidityRule::new(rule.lower, rule.upper),
        );
        if previous.is_some() {
            return Err(ConfigError::DuplicateRule(rule.variable.clone()));
        }
    }

    Ok(ValidityFilter::new(by_variable))
}

fn composers(
    groups: &[GroupConfig],
    views: &[ViewConfig],
) -> Result<Vec<GridLayoutComposer>, ConfigError> {
    let mut registry: HashMap<&str, VariableGroup> = HashMap::new();
    for group in groups {
        let resolved = VariableGroup {
            name: group.name.clone(),
            title: group.title.clone().unwrap_or_else(|| group.name.clone()),
            members: group.members.clone(),
        };
        if registry.insert(group.name.as_str(), resolved).is_some() {
            return Err(ConfigError::DuplicateGroup(group.name.clone()));
        }
    }

    if views.is_empty() {
        return Err(ConfigError::NoViews);
    }

    let mut seen_views = HashSet::new();
    let mut composers = Vec::with_capacity(views.len());

    for view in views {
        if !seen_views.insert(view.id.as_str()) {
            return Err(ConfigError::DuplicateView(view.id.clone()));
        }

        let targets = view
            .targets
            .iter()
            .map(|target| resolve_target(&view.id, target, &registry))
            .collect::<Result<Vec<_>, _>>()?;

        composers.push(GridLayoutComposer::new(
            view.id.clone(),
            view.title.clone(),
            view.rows,
            view.columns,
            targets,
        )?);
    }

    Ok(composers)
}

fn resolve_target(
    view: &str,
    target: &TargetConfig,
    registry: &HashMap<&str, VariableGroup>,
) -> Result<PlotTarget, ConfigError> {
    let resolved = match target {
        TargetConfig::Variable { key, title } => PlotTarget::Variable {
            key: key.clone(),
            title: title.clone().unwrap_or_else(|| key.clone()),
        },
        TargetConfig::Group { group, title } => {
            let group = registry
                .get(group.as_str())
                .cloned()
                .ok_or_else(|| ConfigError::UnknownGroup {
                    view: view.to_string(),
                    group: group.clone(),
                })?;
            let title = title.clone().unwrap_or_else(|| group.title.clone());
            PlotTarget::Group { group, title }
        }
        TargetConfig::Regression { x, y, title } => PlotTarget::Regression {
            x: x.clone(),
            y: y.clone(),
            title: title.clone().unwrap_or_else(|| format!("{} vs {}", x, y)),
        },
    };

    Ok(resolved)
}
