use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deal::Deal;
use crate::request::{ScrapeRequest, ValidationError};

/// Opaque identifier assigned by the backend at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Started,
    Retry,
    Success,
    Failure,
    Revoked,
    /// Any state name the backend adds later; treated as still running.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure | JobStatus::Revoked)
    }
}

/// Response of `POST start-scrape`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub task_id: TaskId,
    pub status: JobStatus,
}

/// Response of `GET tasks/{task_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub task_id: TaskId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Deal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Finished; an empty list is a valid, non-error result.
    Succeeded(Vec<Deal>),
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollVerdict {
    Continue(JobStatus),
    Terminal(JobOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {event} while {state}")]
pub struct TransitionError {
    pub state: &'static str,
    pub event: &'static str,
}

/// Lifecycle of one remote job, from submission to a terminal outcome.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobLifecycle {
    #[default]
    Idle,
    Submitting,
    Polling {
        task_id: TaskId,
    },
    Succeeded {
        deals: Vec<Deal>,
    },
    Failed {
        message: String,
    },
}

const GENERIC_FAILURE: &str = "the job failed without an error message";
const REVOKED_FAILURE: &str = "the job was revoked";

impl JobLifecycle {
    pub fn name(&self) -> &'static str {
        match self {
            JobLifecycle::Idle => "idle",
            JobLifecycle::Submitting => "submitting",
            JobLifecycle::Polling { .. } => "polling",
            JobLifecycle::Succeeded { .. } => "succeeded",
            JobLifecycle::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobLifecycle::Succeeded { .. } | JobLifecycle::Failed { .. })
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            JobLifecycle::Polling { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// `Idle -> Submitting`. Validation runs first; on failure the machine
    /// stays `Idle`.
    pub fn begin_submit(&mut self, request: &ScrapeRequest) -> Result<(), SubmitRejected> {
        if !matches!(self, JobLifecycle::Idle) {
            return Err(SubmitRejected::Transition(self.refuse("submit")));
        }
        request.validate()?;
        *self = JobLifecycle::Submitting;
        Ok(())
    }

    /// `Submitting -> Polling`.
    pub fn submitted(&mut self, handle: &JobHandle) -> Result<(), TransitionError> {
        if !matches!(self, JobLifecycle::Submitting) {
            return Err(self.refuse("accept a task id"));
        }
        *self = JobLifecycle::Polling {
            task_id: handle.task_id.clone(),
        };
        Ok(())
    }

    /// `Submitting -> Idle` after the submission itself failed.
    pub fn submit_failed(&mut self) -> Result<(), TransitionError> {
        if !matches!(self, JobLifecycle::Submitting) {
            return Err(self.refuse("abort a submission"));
        }
        *self = JobLifecycle::Idle;
        Ok(())
    }

    /// Feeds one poll response. Non-terminal statuses keep the machine in
    /// `Polling`; terminal ones move it to `Succeeded` or `Failed` and return
    /// the outcome exactly once.
    pub fn observe(&mut self, snapshot: JobSnapshot) -> Result<PollVerdict, TransitionError> {
        if !matches!(self, JobLifecycle::Polling { .. }) {
            return Err(self.refuse("observe a poll response"));
        }
        let outcome = match snapshot.status {
            JobStatus::Success => JobOutcome::Succeeded(snapshot.result.unwrap_or_default()),
            JobStatus::Failure => JobOutcome::Failed {
                message: failure_message(snapshot.error, GENERIC_FAILURE),
            },
            JobStatus::Revoked => JobOutcome::Failed {
                message: failure_message(snapshot.error, REVOKED_FAILURE),
            },
            status => return Ok(PollVerdict::Continue(status)),
        };
        self.finish(outcome.clone());
        Ok(PollVerdict::Terminal(outcome))
    }

    /// `Polling -> Failed` when the caller gives up on the job locally.
    pub fn abandon(&mut self, message: impl Into<String>) -> Result<JobOutcome, TransitionError> {
        if !matches!(self, JobLifecycle::Polling { .. }) {
            return Err(self.refuse("abandon the job"));
        }
        let outcome = JobOutcome::Failed {
            message: message.into(),
        };
        self.finish(outcome.clone());
        Ok(outcome)
    }

    /// Terminal states go back to `Idle`; other states are left alone.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        if !self.is_terminal() {
            return Err(self.refuse("reset"));
        }
        *self = JobLifecycle::Idle;
        Ok(())
    }

    fn finish(&mut self, outcome: JobOutcome) {
        *self = match outcome {
            JobOutcome::Succeeded(deals) => JobLifecycle::Succeeded { deals },
            JobOutcome::Failed { message } => JobLifecycle::Failed { message },
        };
    }

    fn refuse(&self, event: &'static str) -> TransitionError {
        TransitionError {
            state: self.name(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

fn failure_message(error: Option<String>, fallback: &str) -> String {
    match error {
        Some(message) if !message.trim().is_empty() => message,
        _ => fallback.to_string(),
    }
}
