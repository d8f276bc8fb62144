// Main entry point - Dependency injection, refresh loop and server setup
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use flux_dashboard::application::dashboard_service::DashboardService;
use flux_dashboard::application::record_source::{RecordSource, SourceError};
use flux_dashboard::application::refresh::RefreshCycle;
use flux_dashboard::infrastructure::config::load_dashboard_config;
use flux_dashboard::infrastructure::file_source::FileSource;
use flux_dashboard::infrastructure::http_source::HttpSource;
use flux_dashboard::presentation::app_state::{AppState, ViewSummary};
use flux_dashboard::presentation::handlers::{
    get_snapshot, get_view, health_check, list_views, stream_view,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configuration errors are fatal: nothing runs on a layout that failed validation
    let config = load_dashboard_config()?;

    // Create the pipeline (application layer)
    let source = open_source(&config.source_location)?;
    let service = DashboardService::new(source, &config);
    let views = service
        .composers()
        .iter()
        .map(|c| ViewSummary {
            id: c.view_id().to_string(),
            title: c.view_title().to_string(),
        })
        .collect();

    // Refresh loop publishes a fresh snapshot per tick
    let (cycle, snapshots) = RefreshCycle::new(service, config.refresh_interval);
    tokio::spawn(cycle.run());

    let state = Arc::new(AppState { snapshots, views });

    // Build router (presentation layer)
    // JSON bodies are compressed in the response builders, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/views", get(list_views))
        .route("/views/:id", get(get_view))
        .route("/views/:id/stream", get(stream_view))
        .route("/snapshot", get(get_snapshot))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        "Starting flux-dashboard on {} (source {}, refresh every {:?})",
        config.bind,
        config.source_location,
        config.refresh_interval
    );

    axum::serve(tokio::net::TcpListener::bind(config.bind).await?, router).await?;

    Ok(())
}

fn open_source(location: &str) -> Result<Arc<dyn RecordSource>, SourceError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(location)?))
    } else {
        Ok(Arc::new(FileSource::new(location)))
    }
}
