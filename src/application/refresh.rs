// Refresh cycle - Timer-driven recompute and snapshot publication
use crate::application::dashboard_service::DashboardService;
use crate::domain::dashboard::DashboardSnapshot;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Latest published snapshot; `None` until the first tick succeeds.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<DashboardSnapshot>>>;

pub struct RefreshCycle {
    service: DashboardService,
    interval: Duration,
    publisher: watch::Sender<Option<Arc<DashboardSnapshot>>>,
    tick: u64,
}

impl RefreshCycle {
    pub fn new(service: DashboardService, interval: Duration) -> (Self, SnapshotReceiver) {
        let (publisher, receiver) = watch::channel(None);
        let cycle = Self {
            service,
            interval,
            publisher,
            tick: 0,
        };
        (cycle, receiver)
    }

    /// Runs one tick to completion. A failed tick leaves the previous snapshot published.
    pub async fn run_once(&mut self) -> bool {
        self.tick += 1;
        let started = Instant::now();

        match self.service.recompute(self.tick).await {
            Ok(snapshot) => {
                tracing::info!(
                    "Tick {} published {} views over {} points in {}ms",
                    self.tick,
                    snapshot.views.len(),
                    snapshot.axis.len(),
                    started.elapsed().as_millis()
                );
                self.publisher.send_replace(Some(Arc::new(snapshot)));
                true
            }
            Err(e) => {
                tracing::error!("Tick {} failed, keeping previous snapshot: {}", self.tick, e);
                false
            }
        }
    }

    /// Ticks until every receiver is gone. Ticks never overlap: a slow tick
    /// delays the next one instead of running concurrently with it.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if self.publisher.is_closed() {
                tracing::info!("No snapshot consumers left, stopping refresh cycle");
                break;
            }
            self.run_once().await;
        }
    }
}
