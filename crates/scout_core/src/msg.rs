use crate::filter::CategoryFilter;
use crate::job::{JobOutcome, JobStatus, TaskId};
use crate::request::ScrapeRequest;
use crate::source::Source;
use crate::RunId;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Replace the whole form, e.g. from command-line arguments.
    FormReplaced(ScrapeRequest),
    /// User edited the target companies field.
    TargetsChanged(String),
    ModelChanged(String),
    ApiKeyChanged(String),
    MinYearChanged(i32),
    MaxPagesChanged(u32),
    ForceRescanToggled(bool),
    /// User ticked or unticked a source checkbox.
    SourceToggled { source: Source, checked: bool },
    /// User picked a prompt template by id.
    TemplateSelected(String),
    /// User picked a category filter for the result table.
    FilterSelected(CategoryFilter),
    /// User asked to start a scrape with the current form.
    StartClicked,
    /// Backend accepted the job.
    JobSubmitted { run: RunId, task_id: TaskId },
    /// A poll came back with a non-terminal status.
    JobStillRunning { run: RunId, status: JobStatus },
    /// Submission failed before a task id was assigned.
    SubmitFailed { run: RunId, message: String },
    /// Terminal poll result.
    JobFinished { run: RunId, outcome: JobOutcome },
    /// Cosmetic progress ticker fired.
    ProgressTick { run: RunId, increment: f64 },
    /// The owning view is going away.
    Disposed,
}
