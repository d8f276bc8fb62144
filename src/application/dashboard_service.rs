// Dashboard service - One full recompute of the pipeline per tick
use crate::application::dedupe::deduplicate;
use crate::application::ingest::RecordIngestor;
use crate::application::layout::GridLayoutComposer;
use crate::application::record_source::{RecordSource, SourceError};
use crate::application::reindex::{GridReindexer, ReindexError};
use crate::application::validity::ValidityFilter;
use crate::domain::dashboard::DashboardSnapshot;
use crate::infrastructure::config::ValidatedConfig;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Reindex(#[from] ReindexError),
}

#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn RecordSource>,
    ingestor: RecordIngestor,
    reindexer: GridReindexer,
    filter: ValidityFilter,
    composers: Vec<GridLayoutComposer>,
}

impl DashboardService {
    pub fn new(source: Arc<dyn RecordSource>, config: &ValidatedConfig) -> Self {
        Self {
            source,
            ingestor: RecordIngestor::new(config.ingest.clone()),
            reindexer: GridReindexer::new(config.sampling_interval, config.max_axis_points),
            filter: config.filter.clone(),
            composers: config.composers.clone(),
        }
    }

    pub fn composers(&self) -> &[GridLayoutComposer] {
        &self.composers
    }

    /// Fetches the source and rebuilds every view from scratch.
    pub async fn recompute(&self, tick: u64) -> Result<DashboardSnapshot, PipelineError> {
        let raw = self.source.fetch().await?;
        self.build_snapshot(&raw, tick)
    }

    /// The synchronous part of a tick: ingest, dedupe, reindex, filter, compose.
    pub fn build_snapshot(&self, raw: &str, tick: u64) -> Result<DashboardSnapshot, PipelineError> {
        let ingested = self.ingestor.ingest(raw)?;
        if ingested.records.is_empty() {
            return Err(SourceError::Empty {
                location: self.source.location().to_string(),
            }
            .into());
        }

        let records = deduplicate(ingested.records);
        let dataset = self.reindexer.reindex(ingested.schema, records)?;
        let dataset = self.filter.apply(dataset);

        let views = self
            .composers
            .iter()
            .map(|composer| composer.compose(&dataset))
            .collect();

        Ok(DashboardSnapshot {
            tick,
            generated_at: Utc::now(),
            interval_secs: dataset.axis().interval().num_seconds(),
            axis: dataset.axis().points().to_vec(),
            views,
        })
    }
}
