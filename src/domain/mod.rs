// Domain layer - Records, datasets and dashboard snapshot models
pub mod dashboard;
pub mod dataset;
pub mod record;
pub mod regression;
