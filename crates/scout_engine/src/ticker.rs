//! Cosmetic progress ticker. It only reports increments; clamping and the
//! phase labels live in the core simulator.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scout_core::MAX_INCREMENT;
use scout_logging::{scout_trace, spawn_in_run};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub trait IncrementSource: Send {
    fn next_increment(&mut self) -> f64;
}

/// Uniform increments in `[0, MAX_INCREMENT]`.
pub struct RandomIncrements {
    rng: StdRng,
}

impl RandomIncrements {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIncrements {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementSource for RandomIncrements {
    fn next_increment(&mut self) -> f64 {
        self.rng.random_range(0.0..=MAX_INCREMENT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedIncrement(pub f64);

impl IncrementSource for FixedIncrement {
    fn next_increment(&mut self) -> f64 {
        self.0
    }
}

pub trait TickSink: Send + Sync {
    fn tick(&self, increment: f64);
}

impl<F> TickSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn tick(&self, increment: f64) {
        self(increment)
    }
}

pub struct ProgressTicker;

impl ProgressTicker {
    /// Spawns the ticker on the current runtime. The first tick fires one
    /// `period` after the call.
    pub fn start(
        period: Duration,
        mut source: Box<dyn IncrementSource>,
        sink: Arc<dyn TickSink>,
    ) -> TickerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = spawn_in_run(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        let increment = source.next_increment();
                        scout_trace!("Progress tick +{:.2}", increment);
                        sink.tick(increment);
                    }
                }
            }
        });
        TickerHandle { cancel, task }
    }
}

#[derive(Debug)]
pub struct TickerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Stops the ticker; no tick is delivered afterwards.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
