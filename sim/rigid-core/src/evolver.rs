//! Fixed time-step evolution with real-time throttling.
//!
//! Callers request arbitrary amounts of simulated time; the evolver runs as
//! many fixed steps as fit and carries the remainder to the next call. When
//! a call exceeds its wall-clock budget, the time still pending is dropped
//! and reported instead of being made up later.

use std::time::{Duration, Instant};

use rigid_types::{EvolverConfig, Result, SimError, SolverConfig};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::solver::{EvolutionDetails, ImpulseSolver};
use crate::system::System;

/// Tolerance when counting how many steps fit into the pending time.
const STEP_COUNT_EPSILON: f64 = 1e-9;

/// Outcome of one [`Evolver::evolve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvolutionReport {
    /// Simulated time asked for (s).
    pub requested: f64,
    /// Simulated time actually advanced (s).
    pub advanced: f64,
    /// Requested time not advanced because the real-time budget ran out (s).
    ///
    /// Equals `requested - advanced`, never negative. The carried-over
    /// remainder of earlier calls is dropped with it but not counted here.
    pub skipped: f64,
    /// Steps run.
    pub steps: u64,
    /// True when the budget ran out.
    pub throttled: bool,
}

/// Step bookkeeping shared by [`Evolver`] and [`Simulation`].
#[derive(Debug, Clone)]
pub(crate) struct Timeline {
    time_step: f64,
    pending: f64,
    steps: u64,
    performance: f64,
}

impl Timeline {
    pub(crate) fn new(time_step: f64) -> Result<Self> {
        EvolverConfig::from_time_step(time_step).validate()?;
        Ok(Self {
            time_step,
            pending: 0.0,
            steps: 0,
            performance: 0.0,
        })
    }

    pub(crate) fn time_step(&self) -> f64 {
        self.time_step
    }

    pub(crate) fn simulation_time(&self) -> f64 {
        self.steps as f64 * self.time_step
    }

    pub(crate) fn performance(&self) -> f64 {
        self.performance
    }

    pub(crate) fn run(
        &mut self,
        simulation_time: f64,
        real_time_limit: Duration,
        mut step: impl FnMut(f64) -> Result<()>,
    ) -> Result<EvolutionReport> {
        if !(simulation_time.is_finite() && simulation_time >= 0.0) {
            return Err(SimError::InvalidTimestep(simulation_time));
        }

        let started = Instant::now();
        let dt = self.time_step;
        let total = self.pending + simulation_time;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let planned = (total / dt + STEP_COUNT_EPSILON).floor() as u64;

        let mut report = EvolutionReport {
            requested: simulation_time,
            ..EvolutionReport::default()
        };

        for done in 0..planned {
            if started.elapsed() >= real_time_limit {
                report.advanced = done as f64 * dt;
                report.skipped = (simulation_time - report.advanced).max(0.0);
                report.throttled = true;
                self.pending = 0.0;
                warn!(
                    requested = simulation_time,
                    advanced = report.advanced,
                    skipped = report.skipped,
                    limit_ms = real_time_limit.as_secs_f64() * 1e3,
                    "simulation throttled, dropping pending time"
                );
                self.performance = performance(report.advanced, started.elapsed());
                return Ok(report);
            }

            if let Err(err) = step(dt) {
                self.pending = (total - done as f64 * dt).max(0.0);
                return Err(err);
            }
            self.steps += 1;
            report.steps += 1;
        }

        report.advanced = planned as f64 * dt;
        self.pending = (total - report.advanced).max(0.0);
        self.performance = performance(report.advanced, started.elapsed());
        Ok(report)
    }

    pub(crate) fn run_steps(&mut self, steps: u64, mut step: impl FnMut(f64) -> Result<()>) -> Result<()> {
        let started = Instant::now();
        for _ in 0..steps {
            step(self.time_step)?;
            self.steps += 1;
        }
        self.performance = performance(steps as f64 * self.time_step, started.elapsed());
        Ok(())
    }
}

/// Simulated seconds per wall-clock second.
fn performance(advanced: f64, elapsed: Duration) -> f64 {
    if advanced == 0.0 {
        0.0
    } else if elapsed.is_zero() {
        f64::INFINITY
    } else {
        advanced / elapsed.as_secs_f64()
    }
}

/// Runs a step function with a fixed time step.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use rigid_core::Evolver;
///
/// let mut evolver = Evolver::new(0.01, |_dt| Ok(())).unwrap();
///
/// let report = evolver.evolve(0.105, Duration::from_secs(1)).unwrap();
/// assert_eq!(report.steps, 10);
/// ```
pub struct Evolver<F> {
    timeline: Timeline,
    step_fn: F,
}

impl<F> Evolver<F>
where
    F: FnMut(f64) -> Result<()>,
{
    /// Create an evolver calling `step_fn(time_step)` once per step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTimestep`] for a non-positive or
    /// non-finite step and [`SimError::InvalidConfig`] for steps above one
    /// second.
    pub fn new(time_step: f64, step_fn: F) -> Result<Self> {
        Ok(Self {
            timeline: Timeline::new(time_step)?,
            step_fn,
        })
    }

    /// Advance by `simulation_time` seconds plus whatever was carried over,
    /// giving up when `real_time_limit` of wall-clock time has passed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTimestep`] for a negative or non-finite
    /// `simulation_time`, and any error of the step function, which ends the
    /// call.
    pub fn evolve(&mut self, simulation_time: f64, real_time_limit: Duration) -> Result<EvolutionReport> {
        self.timeline
            .run(simulation_time, real_time_limit, &mut self.step_fn)
    }

    /// Run exactly `steps` steps without a time limit.
    pub fn evolve_steps(&mut self, steps: u64) -> Result<()> {
        self.timeline.run_steps(steps, &mut self.step_fn)
    }

    /// Simulated time so far (s).
    #[must_use]
    pub fn simulation_time(&self) -> f64 {
        self.timeline.simulation_time()
    }

    /// Fixed step (s).
    #[must_use]
    pub fn time_step(&self) -> f64 {
        self.timeline.time_step()
    }

    /// Simulated seconds per wall-clock second during the last call.
    #[must_use]
    pub fn performance(&self) -> f64 {
        self.timeline.performance()
    }
}

impl<F> std::fmt::Debug for Evolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evolver")
            .field("timeline", &self.timeline)
            .finish_non_exhaustive()
    }
}

/// A [`System`] driven by an [`ImpulseSolver`] at a fixed time step.
#[derive(Debug)]
pub struct Simulation {
    system: System,
    solver: ImpulseSolver,
    timeline: Timeline,
    real_time_limit: Option<Duration>,
    last_details: EvolutionDetails,
}

impl Simulation {
    /// Create a simulation.
    pub fn new(system: System, solver_config: SolverConfig, evolver_config: EvolverConfig) -> Result<Self> {
        evolver_config.validate()?;
        Ok(Self {
            system,
            solver: ImpulseSolver::new(solver_config)?,
            timeline: Timeline::new(evolver_config.time_step)?,
            real_time_limit: evolver_config.real_time_limit,
            last_details: EvolutionDetails::default(),
        })
    }

    /// Advance by `simulation_time` seconds within the configured
    /// real-time limit.
    pub fn evolve(&mut self, simulation_time: f64) -> Result<EvolutionReport> {
        let limit = self.real_time_limit.unwrap_or(Duration::MAX);
        let Self {
            system,
            solver,
            timeline,
            last_details,
            ..
        } = self;
        timeline.run(simulation_time, limit, |dt| {
            *last_details = solver.evolve(system, dt)?;
            Ok(())
        })
    }

    /// Run exactly `steps` steps.
    pub fn evolve_steps(&mut self, steps: u64) -> Result<()> {
        let Self {
            system,
            solver,
            timeline,
            last_details,
            ..
        } = self;
        timeline.run_steps(steps, |dt| {
            *last_details = solver.evolve(system, dt)?;
            Ok(())
        })
    }

    /// The simulated system.
    #[must_use]
    pub fn system(&self) -> &System {
        &self.system
    }

    /// The simulated system, mutably.
    pub fn system_mut(&mut self) -> &mut System {
        &mut self.system
    }

    /// Consume the simulation, returning the system.
    #[must_use]
    pub fn into_system(self) -> System {
        self.system
    }

    /// The solver.
    #[must_use]
    pub fn solver(&self) -> &ImpulseSolver {
        &self.solver
    }

    /// Details of the last solver step.
    #[must_use]
    pub fn last_details(&self) -> &EvolutionDetails {
        &self.last_details
    }

    /// Simulated time so far (s).
    #[must_use]
    pub fn simulation_time(&self) -> f64 {
        self.timeline.simulation_time()
    }

    /// Fixed step (s).
    #[must_use]
    pub fn time_step(&self) -> f64 {
        self.timeline.time_step()
    }

    /// Simulated seconds per wall-clock second during the last call.
    #[must_use]
    pub fn performance(&self) -> f64 {
        self.timeline.performance()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::body::Body;
    use approx::assert_relative_eq;
    use rigid_types::{MassMoments, SpaceVector, VelocityMoments};

    const FOREVER: Duration = Duration::from_secs(3600);

    #[test]
    fn test_rejects_bad_time_step() {
        assert!(matches!(
            Evolver::new(0.0, |_| Ok(())),
            Err(SimError::InvalidTimestep(_))
        ));
        assert!(Evolver::new(f64::NAN, |_| Ok(())).is_err());
        assert!(Evolver::new(2.0, |_| Ok(())).is_err());
    }

    #[test]
    fn test_remainder_is_carried() {
        let mut calls = 0;
        let mut evolver = Evolver::new(0.1, |dt| {
            assert_relative_eq!(dt, 0.1);
            calls += 1;
            Ok(())
        })
        .unwrap();

        let report = evolver.evolve(0.35, FOREVER).unwrap();
        assert_eq!(report.steps, 3);
        assert_relative_eq!(report.advanced, 0.3, epsilon = 1e-12);
        assert!(!report.throttled);

        let report = evolver.evolve(0.05, FOREVER).unwrap();
        assert_eq!(report.steps, 1);
        assert_relative_eq!(evolver.simulation_time(), 0.4, epsilon = 1e-12);
        drop(evolver);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_exact_multiples_do_not_lose_steps() {
        let mut evolver = Evolver::new(0.1, |_| Ok(())).unwrap();
        let report = evolver.evolve(0.3, FOREVER).unwrap();
        assert_eq!(report.steps, 3);
    }

    #[test]
    fn test_rejects_negative_time() {
        let mut evolver = Evolver::new(0.1, |_| Ok(())).unwrap();
        assert!(evolver.evolve(-1.0, FOREVER).is_err());
        assert!(evolver.evolve(f64::NAN, FOREVER).is_err());
    }

    #[test]
    fn test_zero_budget_skips_everything() {
        let mut evolver = Evolver::new(0.1, |_| Ok(())).unwrap();
        let report = evolver.evolve(1.0, Duration::ZERO).unwrap();

        assert!(report.throttled);
        assert_eq!(report.steps, 0);
        assert_relative_eq!(report.skipped, 1.0);
        assert_relative_eq!(evolver.performance(), 0.0);
    }

    #[test]
    fn test_step_error_stops_the_call() {
        let mut calls = 0;
        let mut evolver = Evolver::new(0.1, |_| {
            calls += 1;
            if calls == 3 {
                Err(SimError::non_finite("test"))
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert!(evolver.evolve(1.0, FOREVER).is_err());
        assert_relative_eq!(evolver.simulation_time(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_evolve_steps() {
        let mut evolver = Evolver::new(0.01, |_| Ok(())).unwrap();
        evolver.evolve_steps(25).unwrap();
        assert_relative_eq!(evolver.simulation_time(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_simulation_moves_bodies() {
        let mut system = System::new();
        let id = system.add_body(
            Body::new(MassMoments::sphere(1.0, 0.1))
                .unwrap()
                .with_velocity_moments(VelocityMoments::new(
                    SpaceVector::new(2.0, 0.0, 0.0),
                    SpaceVector::zeros(),
                )),
        );
        let mut simulation = Simulation::new(
            system,
            SolverConfig::default(),
            EvolverConfig::from_time_step(0.01),
        )
        .unwrap();

        let report = simulation.evolve(0.5).unwrap();
        assert_eq!(report.steps, 50);
        assert_eq!(simulation.solver().processed_steps(), 50);
        assert_relative_eq!(
            simulation.system().body(id).unwrap().position().x(),
            1.0,
            epsilon = 1e-9
        );
    }
}
