use crate::job::JobOutcome;
use crate::notification::Notification;
use crate::{AppState, Effect, Msg};

const SELECT_ONE_SOURCE: &str = "Select at least one source!";
const NO_RESULTS: &str = "No results found.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FormReplaced(request) => {
            *state.request_mut() = request;
            Vec::new()
        }
        Msg::TargetsChanged(targets) => {
            state.request_mut().target_companies = targets;
            Vec::new()
        }
        Msg::ModelChanged(model) => {
            state.request_mut().ai_model = model;
            Vec::new()
        }
        Msg::ApiKeyChanged(key) => {
            state.request_mut().api_key = key;
            Vec::new()
        }
        Msg::MinYearChanged(year) => {
            state.request_mut().min_year = year;
            Vec::new()
        }
        Msg::MaxPagesChanged(pages) => {
            state.request_mut().max_pages = pages;
            Vec::new()
        }
        Msg::ForceRescanToggled(force) => {
            state.request_mut().force_rescan = force;
            Vec::new()
        }
        Msg::SourceToggled { source, checked } => match state.toggle_source(source, checked) {
            Ok(()) => Vec::new(),
            // The selection refused the change, so the form already shows the
            // restored set once the dirty view is rendered.
            Err(_) => notify(&mut state, Notification::info(SELECT_ONE_SOURCE)),
        },
        Msg::TemplateSelected(id) => {
            state.select_template(&id);
            Vec::new()
        }
        Msg::FilterSelected(filter) => {
            state.set_filter(filter);
            Vec::new()
        }
        Msg::StartClicked => match state.request().validate() {
            Err(err) => notify(&mut state, Notification::error(format!("ERROR: {err}"))),
            Ok(()) => start_run(&mut state),
        },
        Msg::JobSubmitted { run, task_id } => {
            if state.is_current(run) {
                state.record_submitted(task_id);
            }
            Vec::new()
        }
        Msg::JobStillRunning { run, status } => {
            if state.is_current(run) {
                state.record_status(status);
            }
            Vec::new()
        }
        Msg::ProgressTick { run, increment } => {
            if state.is_current(run) {
                state.apply_tick(increment);
            }
            Vec::new()
        }
        Msg::JobFinished { run, outcome } => {
            if !state.is_current(run) {
                return (state, Vec::new());
            }
            match outcome {
                JobOutcome::Succeeded(deals) => {
                    let count = state.apply_success(deals);
                    let notification = if count > 0 {
                        Notification::success(format!("Analysis complete: found {count} results."))
                    } else {
                        Notification::info(NO_RESULTS)
                    };
                    stop_and_notify(&mut state, notification)
                }
                JobOutcome::Failed { message } => {
                    state.apply_failure();
                    stop_and_notify(
                        &mut state,
                        Notification::error(format!("Error during the analysis: {message}")),
                    )
                }
            }
        }
        Msg::SubmitFailed { run, message } => {
            if !state.is_current(run) {
                return (state, Vec::new());
            }
            state.apply_failure();
            stop_and_notify(
                &mut state,
                Notification::error(format!("Could not start the analysis: {message}")),
            )
        }
        Msg::Disposed => {
            if state.is_running() {
                state.abandon_run();
            }
            vec![Effect::CancelJob, Effect::StopProgress]
        }
    };

    (state, effects)
}

/// Opens a new run. A run still in flight is cancelled first so its late
/// results are never applied.
fn start_run(state: &mut AppState) -> Vec<Effect> {
    let had_run = state.is_running();
    let run = state.begin_run();
    let request = state.request().clone();
    let mut effects = Vec::with_capacity(5);
    if had_run {
        effects.push(Effect::CancelJob);
        effects.push(Effect::StopProgress);
    }
    effects.push(Effect::PublishTargets(request.target_companies.clone()));
    effects.push(Effect::SubmitJob { run, request });
    effects.push(Effect::StartProgress { run });
    effects
}

fn notify(state: &mut AppState, notification: Notification) -> Vec<Effect> {
    state.set_notification(notification.clone());
    vec![Effect::Notify(notification)]
}

/// Terminal transitions always release the ticker before reporting.
fn stop_and_notify(state: &mut AppState, notification: Notification) -> Vec<Effect> {
    let mut effects = vec![Effect::StopProgress];
    effects.extend(notify(state, notification));
    effects
}
