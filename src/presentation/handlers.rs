// HTTP request handlers
use crate::domain::dashboard::{DashboardSnapshot, ViewSnapshot};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::{AppState, ViewSummary};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

/// One view together with the axis its traces are aligned to.
#[derive(Serialize)]
pub struct ViewPayload<'a> {
    pub tick: u64,
    pub generated_at: DateTime<Utc>,
    pub interval_secs: i64,
    pub axis: &'a [NaiveDateTime],
    pub view: &'a ViewSnapshot,
}

impl<'a> ViewPayload<'a> {
    fn from_snapshot(snapshot: &'a DashboardSnapshot, id: &str) -> Option<Self> {
        snapshot.view(id).map(|view| Self {
            tick: snapshot.tick,
            generated_at: snapshot.generated_at,
            interval_secs: snapshot.interval_secs,
            axis: &snapshot.axis,
            view,
        })
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List configured views; available before the first tick completes
pub async fn list_views(State(state): State<Arc<AppState>>) -> Json<Vec<ViewSummary>> {
    Json(state.views.clone())
}

/// The whole latest snapshot
pub async fn get_snapshot(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = latest(&state) else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    match json_response(snapshot.as_ref(), accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// One view of the latest snapshot
pub async fn get_view(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    if !state.views.iter().any(|v| v.id == id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let Some(snapshot) = latest(&state) else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    let Some(payload) = ViewPayload::from_snapshot(&snapshot, &id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match json_response(&payload, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Server-sent events: the current view, then one event per published snapshot
pub async fn stream_view(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    if !state.views.iter().any(|v| v.id == id) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut snapshots = state.snapshots.clone();
    let stream = async_stream::stream! {
        loop {
            let current = snapshots.borrow_and_update().clone();
            if let Some(event) = current.and_then(|snapshot| view_event(&snapshot, &id)) {
                yield Ok::<Event, Infallible>(event);
            }
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn latest(state: &AppState) -> Option<Arc<DashboardSnapshot>> {
    state.snapshots.borrow().clone()
}

fn view_event(snapshot: &DashboardSnapshot, id: &str) -> Option<Event> {
    let payload = ViewPayload::from_snapshot(snapshot, id)?;
    match Event::default().event("snapshot").json_data(&payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!(
                "Failed to encode view '{}' for tick {}: {}",
                id,
                snapshot.tick,
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::tests::{RAW, service};
    use crate::application::refresh::{RefreshCycle, SnapshotReceiver};
    use axum::body::BodyDataStream;
    use futures::StreamExt;
    use std::time::Duration;

    fn state_for(snapshots: SnapshotReceiver) -> Arc<AppState> {
        Arc::new(AppState {
            snapshots,
            views: vec![ViewSummary {
                id: "tab1".to_string(),
                title: "FLUX MET VAR I".to_string(),
            }],
        })
    }

    #[tokio::test]
    async fn test_view_unavailable_before_first_tick() {
        let (_cycle, receiver) = RefreshCycle::new(service(vec![]), Duration::from_secs(60));
        let response = get_view(
            Path("tab1".to_string()),
            HeaderMap::new(),
            State(state_for(receiver)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_view_is_not_found() {
        let (_cycle, receiver) = RefreshCycle::new(service(vec![]), Duration::from_secs(60));
        let response = get_view(
            Path("tab9".to_string()),
            HeaderMap::new(),
            State(state_for(receiver)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_view_after_tick() {
        let (mut cycle, receiver) =
            RefreshCycle::new(service(vec![Some(RAW)]), Duration::from_secs(60));
        assert!(cycle.run_once().await);

        let response = get_view(
            Path("tab1".to_string()),
            HeaderMap::new(),
            State(state_for(receiver)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["tick"], 1);
        assert_eq!(json["axis"].as_array().unwrap().len(), 4);
        assert_eq!(json["view"]["grid"]["panels"][0]["content"]["kind"], "series");
        assert_eq!(json["view"]["grid"]["panels"][2]["content"]["kind"], "regression");
    }

    #[tokio::test]
    async fn test_snapshot_unavailable_until_first_tick() {
        let (mut cycle, receiver) =
            RefreshCycle::new(service(vec![Some(RAW)]), Duration::from_secs(60));
        let state = state_for(receiver);

        let response = get_snapshot(HeaderMap::new(), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        assert!(cycle.run_once().await);
        let response = get_snapshot(HeaderMap::new(), State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["tick"], 1);
        assert_eq!(json["interval_secs"], 3600);
        assert_eq!(json["views"][0]["id"], "tab1");
    }

    /// Reads body chunks until one complete SSE event has arrived.
    async fn next_event(body: &mut BodyDataStream) -> String {
        let mut event = String::new();
        while !event.ends_with("\n\n") {
            let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
                .await
                .expect("timed out waiting for event")
                .expect("stream ended")
                .unwrap();
            event.push_str(std::str::from_utf8(&chunk).unwrap());
        }
        event
    }

    #[tokio::test]
    async fn test_stream_sends_event_per_published_snapshot() {
        let (mut cycle, receiver) =
            RefreshCycle::new(service(vec![Some(RAW), Some(RAW)]), Duration::from_secs(60));

        let response = stream_view(Path("tab1".to_string()), State(state_for(receiver))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let mut body = response.into_body().into_data_stream();

        assert!(cycle.run_once().await);
        let first = next_event(&mut body).await;
        assert!(first.starts_with("event: snapshot\n"));
        assert!(first.contains("\"tick\":1,"));
        assert!(first.contains("\"id\":\"tab1\""));

        assert!(cycle.run_once().await);
        let second = next_event(&mut body).await;
        assert!(second.starts_with("event: snapshot\n"));
        assert!(second.contains("\"tick\":2,"));
    }

    #[tokio::test]
    async fn test_stream_unknown_view_is_not_found() {
        let (_cycle, receiver) = RefreshCycle::new(service(vec![]), Duration::from_secs(60));
        let response = stream_view(Path("tab9".to_string()), State(state_for(receiver))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
