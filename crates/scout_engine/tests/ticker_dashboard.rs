use std::sync::{Arc, Mutex};
use std::time::Duration;

use scout_core::{CompanyTile, Deal, JobHandle, JobSnapshot, ScrapeRequest, TargetBroadcast, TaskId};
use scout_engine::{
    ClientError, ClientErrorKind, DashboardView, FixedIncrement, JobClient, ProgressTicker,
};

#[tokio::test(start_paused = true)]
async fn ticker_fires_per_period_until_stopped() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handle = ProgressTicker::start(
        Duration::from_millis(800),
        Box::new(FixedIncrement(0.5)),
        Arc::new(move |increment: f64| sink.lock().unwrap().push(increment)),
    );

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(seen.lock().unwrap().is_empty());
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(*seen.lock().unwrap(), vec![0.5, 0.5, 0.5]);

    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_ticker() {
    let seen = Arc::new(Mutex::new(0usize));
    let sink = seen.clone();
    let handle = ProgressTicker::start(
        Duration::from_millis(100),
        Box::new(FixedIncrement(1.0)),
        Arc::new(move |_: f64| *sink.lock().unwrap() += 1),
    );
    tokio::time::sleep(Duration::from_millis(250)).await;
    drop(handle);
    let count = *seen.lock().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*seen.lock().unwrap(), count);
}

/// Answers heatmap requests with one tile named after the requested target.
#[derive(Default)]
struct HeatmapBackend {
    requests: Mutex<Vec<String>>,
    fail_next: Mutex<bool>,
}

#[async_trait::async_trait]
impl JobClient for HeatmapBackend {
    async fn submit(&self, _request: &ScrapeRequest) -> Result<JobHandle, ClientError> {
        Err(ClientError::new(ClientErrorKind::Transport, "unused"))
    }

    async fn poll_once(&self, _task_id: &TaskId) -> Result<JobSnapshot, ClientError> {
        Err(ClientError::new(ClientErrorKind::Transport, "unused"))
    }

    async fn fetch_aggregate_results(&self) -> Result<Vec<Deal>, ClientError> {
        Ok(Vec::new())
    }

    async fn fetch_deals(&self, _limit: usize) -> Result<Vec<Deal>, ClientError> {
        Ok(Vec::new())
    }

    async fn fetch_heatmap(&self, targets: &str) -> Result<Vec<CompanyTile>, ClientError> {
        self.requests.lock().unwrap().push(targets.to_string());
        if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
            return Err(ClientError::new(ClientErrorKind::HttpStatus(500), "down"));
        }
        Ok(vec![CompanyTile {
            name: if targets.is_empty() { "all".to_string() } else { targets.to_string() },
            score: 5.0,
            ..CompanyTile::default()
        }])
    }
}

#[tokio::test]
async fn dashboard_follows_published_target() {
    let backend = Arc::new(HeatmapBackend::default());
    let broadcast = TargetBroadcast::new();
    let mut view = DashboardView::spawn(backend.clone(), &broadcast);

    // The subscription replays the empty initial target.
    assert!(view.changed().await);
    assert_eq!(view.loaded_target(), Some(String::new()));
    assert_eq!(view.tiles()[0].name, "all");

    broadcast.publish("ICEYE");
    assert!(view.changed().await);
    assert_eq!(view.loaded_target(), Some("ICEYE".to_string()));
    assert_eq!(view.tiles()[0].name, "ICEYE");

    // Republishing the same target does not reload.
    broadcast.publish("ICEYE");
    broadcast.publish("Planet");
    assert!(view.changed().await);
    assert_eq!(view.loaded_target(), Some("Planet".to_string()));
    assert_eq!(
        *backend.requests.lock().unwrap(),
        vec![String::new(), "ICEYE".to_string(), "Planet".to_string()]
    );
}

#[tokio::test]
async fn failed_load_keeps_previous_tiles() {
    let backend = Arc::new(HeatmapBackend::default());
    let broadcast = TargetBroadcast::new();
    broadcast.publish("ICEYE");
    let mut view = DashboardView::spawn(backend.clone(), &broadcast);
    assert!(view.changed().await);

    *backend.fail_next.lock().unwrap() = true;
    broadcast.publish("Planet");
    assert!(view.changed().await);
    let snapshot = view.snapshot();
    assert_eq!(snapshot.target, Some("ICEYE".to_string()));
    assert_eq!(snapshot.tiles[0].name, "ICEYE");
    assert!(snapshot.error.is_some());

    broadcast.publish("Planet");
    assert!(view.changed().await);
    assert_eq!(view.loaded_target(), Some("Planet".to_string()));
    assert_eq!(view.snapshot().error, None);
    assert_eq!(broadcast.subscriber_count(), 1);
    drop(view);
    assert_eq!(broadcast.subscriber_count(), 0);
}
