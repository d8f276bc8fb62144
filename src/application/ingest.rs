// Record ingestion - Delimited logger text to typed records
use crate::application::record_source::SourceError;
use crate::domain::record::{RawRecord, Reading, Schema};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use std::collections::BTreeSet;

pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Per-source parsing settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Zero-based row indices that are not data; the first row left over is the header.
    pub skip_rows: BTreeSet<usize>,
    pub delimiter: u8,
    pub timestamp_column: String,
    pub timestamp_formats: Vec<String>,
    /// Columns that are neither the timestamp nor numeric variables.
    pub ignored_columns: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            skip_rows: BTreeSet::new(),
            delimiter: b',',
            timestamp_column: "TIMESTAMP".to_string(),
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            ignored_columns: vec!["TIMESTAMP_START".to_string(), "TIMESTAMP_END".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestedRecords {
    pub schema: Schema,
    /// In file order; unsorted and possibly with repeated timestamps.
    pub records: Vec<RawRecord>,
    /// Rows whose timestamp matched none of the configured formats.
    pub dropped_rows: usize,
    /// Rows the delimited reader itself rejected.
    pub unreadable_rows: usize,
}

#[derive(Debug, Clone)]
pub struct RecordIngestor {
    settings: IngestSettings,
}

impl RecordIngestor {
    pub fn new(settings: IngestSettings) -> Self {
        Self { settings }
    }

    pub fn ingest(&self, raw: &str) -> Result<IngestedRecords, SourceError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.settings.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let mut rows = reader
            .records()
            .enumerate()
            .filter(|(index, _)| !self.settings.skip_rows.contains(index))
            .map(|(_, row)| row);

        let header = rows.next().ok_or(SourceError::MissingHeader {
            skipped: self.settings.skip_rows.len(),
        })??;

        let header: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
        let timestamp_index = header
            .iter()
            .position(|h| *h == self.settings.timestamp_column)
            .ok_or_else(|| SourceError::MissingTimestampColumn {
                column: self.settings.timestamp_column.clone(),
            })?;

        // (source index, name) for every numeric variable column
        let variables: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter(|(index, name)| {
                *index != timestamp_index && !self.settings.ignored_columns.contains(name)
            })
            .map(|(index, name)| (index, name.clone()))
            .collect();

        let mut records = Vec::new();
        let mut dropped_rows = 0;
        let mut unreadable_rows = 0;

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::debug!("Dropping unreadable row: {}", e);
                    unreadable_rows += 1;
                    continue;
                }
            };

            let Some(timestamp) = row
                .get(timestamp_index)
                .and_then(|raw| self.parse_timestamp(raw))
            else {
                dropped_rows += 1;
                continue;
            };

            let values = variables
                .iter()
                .map(|(index, _)| row.get(*index).and_then(parse_reading))
                .collect();
            records.push(RawRecord::new(timestamp, values));
        }

        if dropped_rows > 0 {
            tracing::warn!(
                "Dropped {} rows with unparseable timestamps in column '{}'",
                dropped_rows,
                self.settings.timestamp_column
            );
        }
        if unreadable_rows > 0 {
            tracing::warn!("Dropped {} unreadable rows", unreadable_rows);
        }

        let schema = Schema::new(variables.into_iter().map(|(_, name)| name).collect());
        tracing::debug!(
            "Ingested {} records across {} variables",
            records.len(),
            schema.len()
        );

        Ok(IngestedRecords {
            schema,
            records,
            dropped_rows,
            unreadable_rows,
        })
    }

    fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim().trim_matches('"');
        self.settings
            .timestamp_formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }
}

/// Numeric coercion; anything unparseable or non-finite is missing.
fn parse_reading(raw: &str) -> Reading {
    raw.trim()
        .trim_matches('"')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
