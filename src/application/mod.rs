// Application layer - Pipeline steps and the refresh use case
pub mod dashboard_service;
pub mod dedupe;
pub mod ingest;
pub mod layout;
pub mod record_source;
pub mod refresh;
pub mod regression;
pub mod reindex;
pub mod validity;
