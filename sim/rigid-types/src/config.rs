//! Configuration for the constraint solver and the time-stepping driver.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// Default Baumgarte stabilization factor.
pub const DEFAULT_BAUMGARTE_FACTOR: f64 = 0.5;

/// Upper bounds applied to each body after every step, when enabled with
/// [`SolverConfig::with_limits`].
///
/// Forces and torques are clamped before integration, velocities after it.
/// Clamping preserves direction and only shortens the vector.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Limits {
    /// Maximum force on a body (N).
    pub max_force: f64,
    /// Maximum torque on a body (N·m).
    pub max_torque: f64,
    /// Maximum linear velocity (m/s).
    pub max_velocity: f64,
    /// Maximum angular velocity (rad/s).
    pub max_angular_velocity: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_force: 1e3,
            max_torque: 1e3,
            max_velocity: 1e3,
            max_angular_velocity: 1e3,
        }
    }
}

impl Limits {
    /// No clamping at all.
    ///
    /// Needed for gravitational scenarios where forces between celestial
    /// bodies are many orders of magnitude above the defaults.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_force: f64::INFINITY,
            max_torque: f64::INFINITY,
            max_velocity: f64::INFINITY,
            max_angular_velocity: f64::INFINITY,
        }
    }

    /// Validate the limits.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("max_force", self.max_force),
            ("max_torque", self.max_torque),
            ("max_velocity", self.max_velocity),
            ("max_angular_velocity", self.max_angular_velocity),
        ];
        for (name, value) in all {
            if value.is_nan() || value <= 0.0 {
                return Err(SimError::invalid_config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the impulse solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Maximum passes over all constraints per step.
    ///
    /// One pass visits every constraint once in insertion order. Further
    /// passes refine the result for bodies shared by several constraints.
    pub max_iterations: usize,
    /// Stop iterating once every constraint's force correction in a pass is
    /// below this magnitude (N or N·m). `None` always runs `max_iterations`.
    pub required_precision: Option<f64>,
    /// Fraction of position/rotation error corrected per step (0..1).
    pub baumgarte_factor: f64,
    /// Constraint force mixing added to the effective-mass diagonal.
    pub constraint_force_mixing: f64,
    /// Cap on the linear velocity used to correct position errors (m/s).
    pub max_correction_velocity: f64,
    /// Cap on the angular velocity used to correct rotation errors (rad/s).
    pub max_correction_angular_velocity: f64,
    /// Per-body clamping of force, torque and velocities. `None` integrates
    /// the summed force moments unchanged.
    pub limits: Option<Limits>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::single_pass()
    }
}

impl SolverConfig {
    /// One pass per step over all constraints.
    #[must_use]
    pub fn single_pass() -> Self {
        Self {
            max_iterations: 1,
            required_precision: None,
            baumgarte_factor: DEFAULT_BAUMGARTE_FACTOR,
            constraint_force_mixing: 0.0,
            max_correction_velocity: 10.0,
            max_correction_angular_velocity: 10.0,
            limits: None,
        }
    }

    /// Up to `iterations` passes with early exit on convergence.
    #[must_use]
    pub fn iterative(iterations: usize) -> Self {
        Self {
            max_iterations: iterations,
            required_precision: Some(1e-6),
            ..Self::single_pass()
        }
    }

    /// Single pass without clamping, for orbital and other large-scale
    /// scenarios.
    #[must_use]
    pub fn orbital() -> Self {
        Self {
            limits: None,
            ..Self::single_pass()
        }
    }

    /// Set the maximum iteration count.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence threshold.
    #[must_use]
    pub const fn with_required_precision(mut self, precision: Option<f64>) -> Self {
        self.required_precision = precision;
        self
    }

    /// Set the Baumgarte factor.
    #[must_use]
    pub const fn with_baumgarte_factor(mut self, factor: f64) -> Self {
        self.baumgarte_factor = factor;
        self
    }

    /// Set the constraint force mixing.
    #[must_use]
    pub const fn with_constraint_force_mixing(mut self, cfm: f64) -> Self {
        self.constraint_force_mixing = cfm;
        self
    }

    /// Set both correction velocity caps.
    #[must_use]
    pub const fn with_max_correction(mut self, linear: f64, angular: f64) -> Self {
        self.max_correction_velocity = linear;
        self.max_correction_angular_velocity = angular;
        self
    }

    /// Clamp every body with `limits`.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Integrate without clamping.
    #[must_use]
    pub const fn without_limits(mut self) -> Self {
        self.limits = None;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SimError::invalid_config("max_iterations must be at least 1"));
        }

        if let Some(precision) = self.required_precision {
            if !(precision.is_finite() && precision > 0.0) {
                return Err(SimError::invalid_config(format!(
                    "required_precision must be positive, got {precision}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.baumgarte_factor) {
            return Err(SimError::invalid_config(format!(
                "baumgarte_factor must be in [0, 1], got {}",
                self.baumgarte_factor
            )));
        }

        if !(self.constraint_force_mixing.is_finite() && self.constraint_force_mixing >= 0.0) {
            return Err(SimError::invalid_config(
                "constraint_force_mixing must be non-negative",
            ));
        }

        if self.max_correction_velocity.is_nan()
            || self.max_correction_velocity < 0.0
            || self.max_correction_angular_velocity.is_nan()
            || self.max_correction_angular_velocity < 0.0
        {
            return Err(SimError::invalid_config(
                "correction velocity caps must be non-negative",
            ));
        }

        match &self.limits {
            Some(limits) => limits.validate(),
            None => Ok(()),
        }
    }
}

/// Configuration for the fixed-step evolver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvolverConfig {
    /// Fixed simulation step (seconds).
    pub time_step: f64,
    /// Wall-clock budget for one `evolve` call. `None` never throttles.
    pub real_time_limit: Option<Duration>,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            time_step: 1e-3,
            real_time_limit: Some(Duration::from_millis(100)),
        }
    }
}

impl EvolverConfig {
    /// Configuration with the given step and no real-time limit.
    #[must_use]
    pub fn from_time_step(time_step: f64) -> Self {
        Self {
            time_step,
            real_time_limit: None,
        }
    }

    /// Set the wall-clock budget.
    #[must_use]
    pub const fn real_time_limit(mut self, limit: Duration) -> Self {
        self.real_time_limit = Some(limit);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(SimError::InvalidTimestep(self.time_step));
        }

        if self.time_step > 1.0 {
            return Err(SimError::invalid_config(
                "time_step > 1 second is likely an error",
            ));
        }

        Ok(())
    }
}
