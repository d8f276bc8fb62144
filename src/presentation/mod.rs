// Presentation layer - HTTP handlers over published snapshots
pub mod app_state;
pub mod handlers;
