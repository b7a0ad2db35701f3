//! Scout core: pure state machine, data model and view-model helpers.
mod broadcast;
mod dashboard;
mod deal;
mod effect;
mod filter;
mod job;
mod msg;
mod notification;
mod progress;
mod request;
mod source;
mod state;
mod template;
mod update;
mod view_model;

/// Identifies one `StartClicked` cycle; results tagged with an older run are stale.
pub type RunId = u64;

pub use broadcast::{Subscription, TargetBroadcast};
pub use dashboard::{CompanyTile, Heat, TileSize};
pub use deal::{display_value, sort_newest_first, Deal, ScoreBand};
pub use effect::Effect;
pub use filter::CategoryFilter;
pub use job::{
    JobHandle, JobLifecycle, JobOutcome, JobSnapshot, JobStatus, PollVerdict, SubmitRejected,
    TaskId, TransitionError,
};
pub use msg::Msg;
pub use notification::{Notification, NotificationKind};
pub use progress::{
    Phase, ProgressSimulator, ProgressState, MAX_INCREMENT, SIMULATED_CEILING, SIMULATED_LIMIT,
};
pub use request::{format_duration, ScrapeRequest, ValidationError};
pub use source::{EmptySourceSetError, Source, SourceCategory, SourceSelection, UnknownSourceError};
pub use state::AppState;
pub use template::{
    find_template, layout_for, PromptTemplate, TemplateLayout, AVAILABLE_MODELS, DEFAULT_MODEL,
    FINANCIAL_COLUMNS, FINANCIAL_TEMPLATE_ID, PROMPT_TEMPLATES, TECHNICAL_COLUMNS,
    TECHNICAL_TEMPLATE_ID,
};
pub use update::update;
pub use view_model::AppViewModel;
