#![deny(missing_docs)]
//! Shared logging utilities for the scout workspace.
//!
//! This crate provides the `scout_*` logging macros used across the codebase,
//! the run tag they prefix messages with, and a minimal test initializer for
//! the global logger.

use std::future::Future;

use tokio::task::JoinHandle;

tokio::task_local! {
    /// Orchestrator run whose work the current task is doing.
    static ACTIVE_RUN: u64;
}

/// Returns the run recorded for the current task, if any.
pub fn active_run() -> Option<u64> {
    ACTIVE_RUN.try_with(|run| *run).ok()
}

/// Calls `f` with `run` recorded as the active run. Log lines written inside
/// `f`, and tasks spawned from it through [`spawn_in_run`], carry the run.
pub fn with_run<R>(run: u64, f: impl FnOnce() -> R) -> R {
    ACTIVE_RUN.sync_scope(run, f)
}

/// Spawns `future` on the current tokio runtime, keeping the active run of
/// the caller for the whole lifetime of the task.
pub fn spawn_in_run<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match active_run() {
        Some(run) => tokio::spawn(ACTIVE_RUN.scope(run, future)),
        None => tokio::spawn(future),
    }
}

/// Prefix the logging macros put in front of every message.
#[doc(hidden)]
pub fn run_prefix() -> String {
    active_run()
        .map(|run| format!("[run {run}] "))
        .unwrap_or_default()
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! scout_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! scout_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! scout_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! scout_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! scout_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already have installed the logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_names_the_active_run() {
        assert_eq!(run_prefix(), "");
        assert_eq!(with_run(3, run_prefix), "[run 3] ");
        assert_eq!(active_run(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn spawned_tasks_keep_the_callers_run() {
        let tagged = with_run(7, || spawn_in_run(async { active_run() }));
        let untagged = spawn_in_run(async { active_run() });

        assert_eq!(tagged.await.unwrap(), Some(7));
        assert_eq!(untagged.await.unwrap(), None);
    }
}
