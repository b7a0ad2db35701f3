use crate::deal::{sort_newest_first, Deal};
use crate::filter::CategoryFilter;
use crate::job::{JobStatus, TaskId};
use crate::notification::Notification;
use crate::progress::ProgressSimulator;
use crate::request::ScrapeRequest;
use crate::source::{EmptySourceSetError, Source, SourceSelection};
use crate::template::{find_template, layout_for, PromptTemplate, TemplateLayout};
use crate::view_model::AppViewModel;
use crate::RunId;

const READY: &str = "Ready";
const COMPLETED: &str = "Processing complete!";
const FAILED: &str = "Error";

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    request: ScrapeRequest,
    template: Option<&'static PromptTemplate>,
    layout: TemplateLayout,
    all_deals: Vec<Deal>,
    filtered: Vec<Deal>,
    filter: CategoryFilter,
    active_run: Option<RunId>,
    last_run: RunId,
    task_id: Option<TaskId>,
    job_status: Option<JobStatus>,
    progress: ProgressSimulator,
    status_message: String,
    last_notification: Option<Notification>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            request: ScrapeRequest::default(),
            template: None,
            layout: layout_for(""),
            all_deals: Vec::new(),
            filtered: Vec::new(),
            filter: CategoryFilter::All,
            active_run: None,
            last_run: 0,
            task_id: None,
            job_status: None,
            progress: ProgressSimulator::new(),
            status_message: READY.to_string(),
            last_notification: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an explicit form instead of the defaults.
    pub fn with_request(request: ScrapeRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            running: self.active_run.is_some(),
            run: self.active_run,
            task_id: self.task_id.clone(),
            job_status: self.job_status,
            status_message: self.status_message.clone(),
            progress: self.progress.state(),
            template_name: self.template.map(|t| t.name),
            columns: self.layout.columns,
            offered_sources: self.layout.offered_sources.clone(),
            selected_sources: self.request.sources.as_slice().to_vec(),
            estimated_time: self.request.estimated_time_label(),
            filter: self.filter.clone(),
            deals: self.filtered.clone(),
            total_deals: self.all_deals.len(),
            last_notification: self.last_notification.clone(),
            dirty: self.dirty,
        }
    }

    pub fn request(&self) -> &ScrapeRequest {
        &self.request
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    pub fn is_running(&self) -> bool {
        self.active_run.is_some()
    }

    /// True when `run` is the run currently in flight.
    pub fn is_current(&self, run: RunId) -> bool {
        self.active_run == Some(run)
    }

    pub fn all_deals(&self) -> &[Deal] {
        &self.all_deals
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn request_mut(&mut self) -> &mut ScrapeRequest {
        self.dirty = true;
        &mut self.request
    }

    pub(crate) fn toggle_source(
        &mut self,
        source: Source,
        checked: bool,
    ) -> Result<(), EmptySourceSetError> {
        self.dirty = true;
        self.request.sources.toggle(source, checked)
    }

    pub(crate) fn select_template(&mut self, id: &str) {
        self.template = find_template(id);
        self.layout = layout_for(id);
        if let Some(template) = self.template {
            self.request.system_prompt = template.content.to_string();
        }
        self.request.sources = SourceSelection::new(self.layout.default_source);
        self.dirty = true;
    }

    pub(crate) fn set_filter(&mut self, filter: CategoryFilter) {
        self.filtered = filter.apply(&self.all_deals);
        self.filter = filter;
        self.dirty = true;
    }

    /// Clears the previous results and opens a new run.
    pub(crate) fn begin_run(&mut self) -> RunId {
        self.last_run += 1;
        let run = self.last_run;
        self.active_run = Some(run);
        self.task_id = None;
        self.job_status = None;
        self.all_deals.clear();
        self.filtered.clear();
        self.progress.reset();
        self.status_message = match self.template {
            Some(template) => format!("Starting analysis ({})...", template.name),
            None => "Starting analysis...".to_string(),
        };
        self.dirty = true;
        run
    }

    pub(crate) fn record_submitted(&mut self, task_id: TaskId) {
        self.task_id = Some(task_id);
        self.dirty = true;
    }

    pub(crate) fn record_status(&mut self, status: JobStatus) {
        if self.job_status != Some(status) {
            self.job_status = Some(status);
            self.dirty = true;
        }
    }

    pub(crate) fn apply_tick(&mut self, increment: f64) {
        let before = self.progress.phase();
        if self.progress.advance(increment) {
            if self.progress.phase() != before {
                self.status_message = self.progress.phase().label().to_string();
            }
            self.dirty = true;
        }
    }

    /// Terminal success: progress is forced before the results land.
    pub(crate) fn apply_success(&mut self, mut deals: Vec<Deal>) -> usize {
        self.progress.complete();
        self.active_run = None;
        self.job_status = Some(JobStatus::Success);
        sort_newest_first(&mut deals);
        self.all_deals = deals;
        self.filtered = self.filter.apply(&self.all_deals);
        self.status_message = COMPLETED.to_string();
        self.dirty = true;
        self.all_deals.len()
    }

    pub(crate) fn apply_failure(&mut self) {
        self.progress.fail();
        self.active_run = None;
        self.all_deals.clear();
        self.filtered.clear();
        self.status_message = FAILED.to_string();
        self.dirty = true;
    }

    /// Drops the in-flight run without reporting an outcome.
    pub(crate) fn abandon_run(&mut self) {
        self.progress.halt();
        self.active_run = None;
        self.dirty = true;
    }

    pub(crate) fn set_notification(&mut self, notification: Notification) {
        self.last_notification = Some(notification);
        self.dirty = true;
    }
}
