//! Drives one remote job from submission to a terminal status.
//!
//! `JobPoller::start` validates the request, then spawns a task that submits
//! it and polls the job at a fixed interval. The returned [`PollHandle`] is
//! the only way to stop it; once cancelled the task makes no further calls
//! and emits nothing.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use scout_core::{
    JobHandle, JobLifecycle, JobOutcome, JobStatus, PollVerdict, ScrapeRequest, SubmitRejected,
    TaskId,
};
use scout_logging::{scout_debug, scout_error, scout_info, scout_warn, spawn_in_run};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ClientError, ClientSettings, JobClient};

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Backend accepted the job.
    Submitted(JobHandle),
    /// A poll returned a non-terminal status.
    StillRunning(JobStatus),
    /// Submission failed; no job exists.
    SubmitFailed(ClientError),
    /// Terminal outcome. Always the last event.
    Finished(JobOutcome),
}

impl PollEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollEvent::SubmitFailed(_) | PollEvent::Finished(_))
    }
}

pub trait PollSink: Send + Sync {
    fn emit(&self, event: PollEvent);
}

pub struct ChannelPollSink {
    tx: mpsc::UnboundedSender<PollEvent>,
}

impl ChannelPollSink {
    pub fn new(tx: mpsc::UnboundedSender<PollEvent>) -> Self {
        Self { tx }
    }
}

impl PollSink for ChannelPollSink {
    fn emit(&self, event: PollEvent) {
        let _ = self.tx.send(event);
    }
}

/// The poll loop as an asynchronous sequence. Ends after the terminal event,
/// or immediately once the owning handle is cancelled.
pub struct PollEvents {
    rx: mpsc::UnboundedReceiver<PollEvent>,
    cancel: CancellationToken,
}

impl Stream for PollEvents {
    type Item = PollEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    joined: bool,
}

impl PollHandle {
    /// Stops the loop. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once the loop task has returned, for any reason.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop task to return.
    pub async fn finished(&mut self) {
        if self.joined {
            return;
        }
        let result = (&mut self.task).await;
        self.joined = true;
        if let Err(err) = result {
            scout_error!("Poll task ended abnormally: {}", err);
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Clone)]
pub struct JobPoller {
    client: Arc<dyn JobClient>,
    poll_interval: Duration,
    max_poll_errors: Option<u32>,
}

impl JobPoller {
    pub fn new(client: Arc<dyn JobClient>, settings: &ClientSettings) -> Self {
        Self {
            client,
            poll_interval: settings.poll_interval,
            max_poll_errors: settings.max_poll_errors,
        }
    }

    /// Validates `request` and spawns the poll loop on the current tokio
    /// runtime. An invalid request is rejected before any network call. The
    /// loop logs under the caller's active run.
    pub fn start(
        &self,
        request: ScrapeRequest,
        sink: Arc<dyn PollSink>,
    ) -> Result<PollHandle, SubmitRejected> {
        let mut lifecycle = JobLifecycle::Idle;
        lifecycle.begin_submit(&request)?;

        let cancel = CancellationToken::new();
        let mut run = PollRun {
            client: self.client.clone(),
            poll_interval: self.poll_interval,
            max_poll_errors: self.max_poll_errors,
            cancel: cancel.clone(),
            sink,
            lifecycle,
        };
        let task = spawn_in_run(async move { run.drive(request).await });
        Ok(PollHandle {
            cancel,
            task,
            joined: false,
        })
    }

    /// Like [`JobPoller::start`], exposing the events as a stream.
    pub fn start_stream(
        &self,
        request: ScrapeRequest,
    ) -> Result<(PollHandle, PollEvents), SubmitRejected> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.start(request, Arc::new(ChannelPollSink::new(tx)))?;
        let events = PollEvents {
            rx,
            cancel: handle.cancel.clone(),
        };
        Ok((handle, events))
    }
}

struct PollRun {
    client: Arc<dyn JobClient>,
    poll_interval: Duration,
    max_poll_errors: Option<u32>,
    cancel: CancellationToken,
    sink: Arc<dyn PollSink>,
    lifecycle: JobLifecycle,
}

impl PollRun {
    /// Runs one job and leaves the machine `Idle` again once it reached a
    /// terminal state.
    async fn drive(&mut self, request: ScrapeRequest) {
        self.run_job(&request).await;
        if self.lifecycle.reset().is_ok() {
            scout_debug!("Job lifecycle back to idle");
        }
    }

    async fn run_job(&mut self, request: &ScrapeRequest) {
        let submitted = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            result = self.client.submit(request) => result,
        };
        if self.cancel.is_cancelled() {
            return;
        }

        let handle = match submitted {
            Ok(handle) => handle,
            Err(err) => {
                scout_warn!("Submit failed: {}", err);
                let _ = self.lifecycle.submit_failed();
                self.sink.emit(PollEvent::SubmitFailed(err));
                return;
            }
        };
        if let Err(err) = self.lifecycle.submitted(&handle) {
            scout_error!("Poll loop out of sync: {}", err);
            return;
        }
        scout_info!("Job {} accepted with status {:?}", handle.task_id, handle.status);
        let task_id = handle.task_id.clone();
        self.sink.emit(PollEvent::Submitted(handle));

        if let Some(outcome) = self.poll_until_terminal(&task_id).await {
            scout_info!("Job {} finished: {}", task_id, describe(&outcome));
            self.sink.emit(PollEvent::Finished(outcome));
        }
    }

    /// Returns the terminal outcome, or `None` when cancelled.
    async fn poll_until_terminal(&mut self, task_id: &TaskId) -> Option<JobOutcome> {
        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        // A slow response pushes the next poll back instead of bunching them.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_errors: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                _ = ticker.tick() => {}
            }
            let polled = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                result = self.client.poll_once(task_id) => result,
            };
            if self.cancel.is_cancelled() {
                return None;
            }

            match polled {
                Ok(snapshot) => {
                    consecutive_errors = 0;
                    match self.lifecycle.observe(snapshot) {
                        Ok(PollVerdict::Continue(status)) => {
                            scout_debug!("Job {} still {:?}", task_id, status);
                            self.sink.emit(PollEvent::StillRunning(status));
                        }
                        Ok(PollVerdict::Terminal(outcome)) => return Some(outcome),
                        Err(err) => {
                            scout_error!("Poll loop out of sync: {}", err);
                            return None;
                        }
                    }
                }
                Err(err) => {
                    consecutive_errors += 1;
                    if err.is_transient() {
                        scout_warn!(
                            "Poll of job {} failed ({} in a row): {}",
                            task_id,
                            consecutive_errors,
                            err
                        );
                    } else {
                        scout_error!(
                            "Poll of job {} rejected ({} in a row): {}",
                            task_id,
                            consecutive_errors,
                            err
                        );
                    }
                    if self.max_poll_errors.is_some_and(|max| consecutive_errors >= max) {
                        return self
                            .lifecycle
                            .abandon(format!(
                                "gave up after {consecutive_errors} failed status checks: {err}"
                            ))
                            .ok();
                    }
                }
            }
        }
    }
}

fn describe(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Succeeded(deals) => format!("{} deals", deals.len()),
        JobOutcome::Failed { message } => format!("failed: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use scout_core::{CompanyTile, Deal, JobSnapshot};

    use super::*;

    /// Accepts every job and reports it finished on the first poll.
    struct DoneOnFirstPoll;

    #[async_trait::async_trait]
    impl JobClient for DoneOnFirstPoll {
        async fn submit(&self, _request: &ScrapeRequest) -> Result<JobHandle, ClientError> {
            Ok(JobHandle {
                task_id: TaskId::new("t-1"),
                status: JobStatus::Pending,
            })
        }

        async fn poll_once(&self, task_id: &TaskId) -> Result<JobSnapshot, ClientError> {
            Ok(JobSnapshot {
                task_id: task_id.clone(),
                status: JobStatus::Success,
                result: Some(vec![Deal::default()]),
                error: None,
            })
        }

        async fn fetch_aggregate_results(&self) -> Result<Vec<Deal>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_deals(&self, _limit: usize) -> Result<Vec<Deal>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_heatmap(&self, _targets: &str) -> Result<Vec<CompanyTile>, ClientError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<PollEvent>>);

    impl PollSink for Recorder {
        fn emit(&self, event: PollEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn valid_request() -> ScrapeRequest {
        ScrapeRequest {
            api_key: "key".to_string(),
            ..ScrapeRequest::default()
        }
    }

    fn submitted_run(sink: Arc<Recorder>) -> PollRun {
        let mut lifecycle = JobLifecycle::Idle;
        lifecycle.begin_submit(&valid_request()).unwrap();
        PollRun {
            client: Arc::new(DoneOnFirstPoll),
            poll_interval: Duration::from_secs(2),
            max_poll_errors: None,
            cancel: CancellationToken::new(),
            sink,
            lifecycle,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn finished_job_leaves_the_lifecycle_idle() {
        let sink = Arc::new(Recorder::default());
        let mut run = submitted_run(sink.clone());

        run.drive(valid_request()).await;

        assert_eq!(run.lifecycle, JobLifecycle::Idle);
        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            PollEvent::Finished(JobOutcome::Succeeded(vec![Deal::default()]))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_job_is_not_reset() {
        let sink = Arc::new(Recorder::default());
        let mut run = submitted_run(sink.clone());
        run.cancel.cancel();

        run.drive(valid_request()).await;

        assert_eq!(run.lifecycle, JobLifecycle::Submitting);
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
