//! Scout engine: backend client, poll loop and effect execution.
mod client;
mod dashboard;
mod error;
mod orchestrator;
mod poller;
mod settings;
mod ticker;

pub use client::{JobClient, ReqwestJobClient};
pub use dashboard::{DashboardSnapshot, DashboardView};
pub use error::{ClientError, ClientErrorKind};
pub use orchestrator::{LogNotifier, Notifier, Orchestrator};
pub use poller::{ChannelPollSink, JobPoller, PollEvent, PollEvents, PollHandle, PollSink};
pub use settings::{ClientSettings, DEFAULT_BASE_URL};
pub use ticker::{
    FixedIncrement, IncrementSource, ProgressTicker, RandomIncrements, TickSink, TickerHandle,
};
