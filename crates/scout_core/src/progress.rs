//! Cosmetic progress estimate shown while a job is in flight.
//!
//! The backend reports no partial progress, so the percentage here is a
//! local approximation driven by ticks. It only meets the real job state at
//! `complete` and `fail`.

/// The simulated percentage never reaches this value on its own.
pub const SIMULATED_LIMIT: f64 = 90.0;
/// Highest value `advance` can produce.
pub const SIMULATED_CEILING: f64 = 89.9;
/// Largest increment a single tick may add.
pub const MAX_INCREMENT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Phase {
    #[default]
    Initializing,
    FetchingSources,
    Analyzing,
    Finalizing,
}

impl Phase {
    pub fn for_percent(percent: f64) -> Self {
        if percent > 70.0 {
            Phase::Finalizing
        } else if percent > 40.0 {
            Phase::Analyzing
        } else if percent > 20.0 {
            Phase::FetchingSources
        } else {
            Phase::Initializing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Initializing => "Starting analysis...",
            Phase::FetchingSources => "Downloading data from sources...",
            Phase::Analyzing => "AI analysis in progress...",
            Phase::Finalizing => "Finalizing results...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressState {
    pub percent: f64,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSimulator {
    state: ProgressState,
    active: bool,
}

impl ProgressSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn percent(&self) -> f64 {
        self.state.percent
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Back to 0% and ready to accept ticks.
    pub fn reset(&mut self) {
        self.state = ProgressState::default();
        self.active = true;
    }

    /// Applies one tick. Ignored once the simulator was completed or failed,
    /// so a tick that was already in flight cannot overwrite a forced value.
    /// Returns whether the state changed.
    pub fn advance(&mut self, increment: f64) -> bool {
        if !self.active || self.state.percent >= SIMULATED_LIMIT {
            return false;
        }
        let increment = if increment.is_finite() {
            increment.clamp(0.0, MAX_INCREMENT)
        } else {
            0.0
        };
        let next = (self.state.percent + increment).min(SIMULATED_CEILING);
        if next <= self.state.percent {
            return false;
        }
        self.state.percent = next;
        self.state.phase = self.state.phase.max(Phase::for_percent(next));
        true
    }

    /// Real success arrived: force 100% and stop accepting ticks.
    pub fn complete(&mut self) {
        self.active = false;
        self.state = ProgressState {
            percent: 100.0,
            phase: Phase::Finalizing,
        };
    }

    /// Real failure arrived: force 0% and stop accepting ticks.
    pub fn fail(&mut self) {
        self.active = false;
        self.state = ProgressState::default();
    }

    /// Stops accepting ticks without touching the shown value.
    pub fn halt(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_reaches_limit_on_its_own() {
        let mut sim = ProgressSimulator::new();
        sim.reset();
        for _ in 0..500 {
            sim.advance(MAX_INCREMENT);
        }
        assert!(sim.percent() < SIMULATED_LIMIT);
        assert_eq!(sim.percent(), SIMULATED_CEILING);
        assert!(!sim.advance(MAX_INCREMENT));
    }

    #[test]
    fn increments_are_clamped() {
        let mut sim = ProgressSimulator::new();
        sim.reset();
        sim.advance(50.0);
        assert_eq!(sim.percent(), MAX_INCREMENT);
        assert!(!sim.advance(-3.0));
        assert!(!sim.advance(f64::NAN));
        assert_eq!(sim.percent(), MAX_INCREMENT);
    }

    #[test]
    fn phase_follows_thresholds() {
        assert_eq!(Phase::for_percent(0.0), Phase::Initializing);
        assert_eq!(Phase::for_percent(20.0), Phase::Initializing);
        assert_eq!(Phase::for_percent(20.5), Phase::FetchingSources);
        assert_eq!(Phase::for_percent(40.5), Phase::Analyzing);
        assert_eq!(Phase::for_percent(70.5), Phase::Finalizing);
    }

    #[test]
    fn inactive_simulator_ignores_ticks() {
        let mut sim = ProgressSimulator::new();
        assert!(!sim.advance(1.0));
        sim.reset();
        sim.advance(1.0);
        sim.complete();
        assert!(!sim.advance(1.0));
        assert_eq!(sim.percent(), 100.0);
        sim.reset();
        sim.advance(1.5);
        sim.fail();
        assert!(!sim.advance(1.0));
        assert_eq!(sim.percent(), 0.0);
    }
}
