use crate::deal::Deal;
use crate::filter::CategoryFilter;
use crate::job::{JobStatus, TaskId};
use crate::notification::Notification;
use crate::progress::ProgressState;
use crate::source::Source;
use crate::RunId;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub running: bool,
    pub run: Option<RunId>,
    pub task_id: Option<TaskId>,
    pub job_status: Option<JobStatus>,
    pub status_message: String,
    pub progress: ProgressState,
    pub template_name: Option<&'static str>,
    pub columns: &'static [&'static str],
    pub offered_sources: Vec<Source>,
    pub selected_sources: Vec<Source>,
    pub estimated_time: String,
    pub filter: CategoryFilter,
    /// Deals after sorting and filtering.
    pub deals: Vec<Deal>,
    /// Deals received before filtering.
    pub total_deals: usize,
    pub last_notification: Option<Notification>,
    pub dirty: bool,
}
