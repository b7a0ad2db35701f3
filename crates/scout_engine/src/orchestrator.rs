//! Effect runner around the pure core.
//!
//! Every message goes through `scout_core::update`; the effects it returns
//! are executed here. Background tasks (poll loop, progress ticker) only ever
//! talk back by sending tagged messages into the orchestrator's queue, so
//! state is mutated from one place.

use std::mem;
use std::sync::Arc;

use scout_core::{
    update, AppState, AppViewModel, Effect, Msg, Notification, NotificationKind, RunId,
    ScrapeRequest, TargetBroadcast,
};
use scout_logging::{scout_debug, scout_error, scout_info, with_run};
use tokio::sync::mpsc;

use crate::poller::{JobPoller, PollEvent, PollHandle, PollSink};
use crate::ticker::{IncrementSource, ProgressTicker, RandomIncrements, TickerHandle};
use crate::{ClientSettings, JobClient};

/// Receives every user-facing notification, exactly once per event.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        scout_info!("{}", notification);
    }
}

type IncrementFactory = Box<dyn Fn() -> Box<dyn IncrementSource> + Send + Sync>;

pub struct Orchestrator {
    state: AppState,
    poller: JobPoller,
    broadcast: TargetBroadcast,
    notifier: Arc<dyn Notifier>,
    settings: ClientSettings,
    increments: IncrementFactory,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
    job: Option<PollHandle>,
    ticker: Option<TickerHandle>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn JobClient>,
        settings: ClientSettings,
        broadcast: TargetBroadcast,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(),
            poller: JobPoller::new(client, &settings),
            broadcast,
            notifier,
            settings,
            increments: Box::new(|| Box::new(RandomIncrements::new())),
            tx,
            rx,
            job: None,
            ticker: None,
        }
    }

    /// Replaces the random progress increments, e.g. with a fixed step.
    pub fn with_increments<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn IncrementSource> + Send + Sync + 'static,
    {
        self.increments = Box::new(factory);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    pub fn broadcast(&self) -> &TargetBroadcast {
        &self.broadcast
    }

    /// Applies one message and runs the resulting effects.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Replaces the form with `request` and presses start.
    pub fn start(&mut self, request: ScrapeRequest) {
        self.dispatch(Msg::FormReplaced(request));
        self.dispatch(Msg::StartClicked);
    }

    /// Waits for the next message from a background task and applies it.
    pub async fn next_message(&mut self) {
        if let Some(msg) = self.rx.recv().await {
            self.dispatch(msg);
        }
    }

    /// Processes background messages until no run is active.
    pub async fn run_until_settled(&mut self) -> AppViewModel {
        while self.state.is_running() {
            self.next_message().await;
        }
        self.view()
    }

    /// Applies every message already queued, without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.dispatch(msg);
            applied += 1;
        }
        applied
    }

    /// Tears down the running job and ticker. Nothing is applied afterwards.
    pub fn dispose(&mut self) {
        self.dispatch(Msg::Disposed);
        while self.rx.try_recv().is_ok() {}
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::CancelJob => {
                if let Some(job) = self.job.take() {
                    scout_debug!("Cancelling poll loop");
                    job.cancel();
                }
            }
            Effect::StopProgress => {
                if let Some(ticker) = self.ticker.take() {
                    ticker.stop();
                }
            }
            Effect::PublishTargets(targets) => self.broadcast.publish(targets),
            Effect::SubmitJob { run, request } => self.submit(run, request),
            Effect::StartProgress { run } => self.start_progress(run),
            Effect::Notify(notification) => {
                if notification.kind == NotificationKind::Error {
                    scout_error!("{}", notification.message);
                }
                self.notifier.notify(&notification);
            }
        }
    }

    fn submit(&mut self, run: RunId, request: ScrapeRequest) {
        let sink = Arc::new(RunSink {
            run,
            tx: self.tx.clone(),
        });
        let started = with_run(run, || {
            scout_info!(
                "Submitting {} page(s) over {} source(s)",
                request.max_pages,
                request.sources.len()
            );
            self.poller.start(request, sink)
        });
        match started {
            Ok(handle) => self.job = Some(handle),
            Err(err) => {
                let _ = self.tx.send(Msg::SubmitFailed {
                    run,
                    message: err.to_string(),
                });
            }
        }
    }

    fn start_progress(&mut self, run: RunId) {
        if !self.settings.simulate_progress {
            return;
        }
        let tx = self.tx.clone();
        let sink = move |increment: f64| {
            let _ = tx.send(Msg::ProgressTick { run, increment });
        };
        let ticker = with_run(run, || {
            ProgressTicker::start(
                self.settings.progress_interval,
                (self.increments)(),
                Arc::new(sink),
            )
        });
        self.ticker = Some(ticker);
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            job.cancel();
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

/// Tags poll events with the run that produced them.
struct RunSink {
    run: RunId,
    tx: mpsc::UnboundedSender<Msg>,
}

impl PollSink for RunSink {
    fn emit(&self, event: PollEvent) {
        let run = self.run;
        let msg = match event {
            PollEvent::Submitted(handle) => Msg::JobSubmitted {
                run,
                task_id: handle.task_id,
            },
            PollEvent::StillRunning(status) => Msg::JobStillRunning { run, status },
            PollEvent::SubmitFailed(err) => Msg::SubmitFailed {
                run,
                message: err.to_string(),
            },
            PollEvent::Finished(outcome) => Msg::JobFinished { run, outcome },
        };
        let _ = self.tx.send(msg);
    }
}
