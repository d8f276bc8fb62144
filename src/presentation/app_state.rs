// Application state for HTTP handlers
use crate::application::refresh::SnapshotReceiver;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ViewSummary {
    pub id: String,
    pub title: String,
}

#[derive(Clone)]
pub struct AppState {
    pub snapshots: SnapshotReceiver,
    pub views: Vec<ViewSummary>,
}
