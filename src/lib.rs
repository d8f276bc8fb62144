// Flux dashboard - Logger ingestion, normalization and grid composition
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
