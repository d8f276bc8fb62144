// Deduplication - One record per timestamp, first occurrence wins
use crate::domain::record::RawRecord;
use std::collections::HashSet;

/// Keeps the first record for every timestamp, in original order. Later rows
/// with a repeated timestamp are discarded whole, never merged.
pub fn deduplicate(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let unique: Vec<RawRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.timestamp))
        .collect();

    if unique.len() < before {
        tracing::debug!(
            "Discarded {} records with duplicate timestamps",
            before - unique.len()
        );
    }

    unique
}
