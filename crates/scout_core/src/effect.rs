use crate::notification::Notification;
use crate::request::ScrapeRequest;
use crate::RunId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop the polling loop of the previous run, if any.
    CancelJob,
    SubmitJob { run: RunId, request: ScrapeRequest },
    StartProgress { run: RunId },
    StopProgress,
    /// Tell sibling views which targets are being scraped.
    PublishTargets(String),
    Notify(Notification),
}
