//! Read-only heatmap view that follows the published search target.

use std::sync::Arc;

use scout_core::{CompanyTile, Subscription, TargetBroadcast};
use scout_logging::{scout_debug, scout_warn};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::JobClient;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    /// Target the tiles were loaded for; `None` before the first load.
    pub target: Option<String>,
    pub tiles: Vec<CompanyTile>,
    /// Set when the latest load failed; the previous tiles are kept.
    pub error: Option<String>,
}

pub struct DashboardView {
    snapshot: watch::Receiver<DashboardSnapshot>,
    cancel: CancellationToken,
    _subscription: Subscription,
}

impl DashboardView {
    /// Subscribes to `broadcast` and reloads the heatmap whenever a new
    /// target is published. Must be called inside a tokio runtime.
    pub fn spawn(client: Arc<dyn JobClient>, broadcast: &TargetBroadcast) -> Self {
        let (target_tx, target_rx) = mpsc::unbounded_channel::<String>();
        let (snapshot_tx, snapshot) = watch::channel(DashboardSnapshot::default());
        let cancel = CancellationToken::new();

        tokio::spawn(reload_loop(client, target_rx, snapshot_tx, cancel.clone()));
        let subscription = broadcast.subscribe(move |target| {
            let _ = target_tx.send(target.to_string());
        });

        Self {
            snapshot,
            cancel,
            _subscription: subscription,
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn tiles(&self) -> Vec<CompanyTile> {
        self.snapshot.borrow().tiles.clone()
    }

    pub fn loaded_target(&self) -> Option<String> {
        self.snapshot.borrow().target.clone()
    }

    /// Waits for the next reload to land. Returns `false` once the view has
    /// shut down.
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn reload_loop(
    client: Arc<dyn JobClient>,
    mut targets: mpsc::UnboundedReceiver<String>,
    snapshot: watch::Sender<DashboardSnapshot>,
    cancel: CancellationToken,
) {
    let mut last_requested: Option<String> = None;
    loop {
        let mut target = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = targets.recv() => match next {
                Some(target) => target,
                None => return,
            },
        };
        // Only the newest of a burst of publishes is worth loading.
        while let Ok(newer) = targets.try_recv() {
            target = newer;
        }
        if last_requested.as_deref() == Some(target.as_str()) {
            scout_debug!("Heatmap already loaded for {:?}", target);
            continue;
        }
        last_requested = Some(target.clone());

        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = client.fetch_heatmap(&target) => result,
        };
        match loaded {
            Ok(tiles) => {
                scout_debug!("Heatmap for {:?}: {} tiles", target, tiles.len());
                snapshot.send_replace(DashboardSnapshot {
                    target: Some(target),
                    tiles,
                    error: None,
                });
            }
            Err(err) => {
                scout_warn!("Heatmap load for {:?} failed: {}", target, err);
                // Allow the same target to be retried on the next publish.
                last_requested = None;
                snapshot.send_modify(|current| current.error = Some(err.to_string()));
            }
        }
    }
}
