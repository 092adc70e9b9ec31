//! Settings shared by all constraint types.

use rigid_types::SolverConfig;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::ConstraintForces;

/// Per-constraint settings.
///
/// Stabilization parameters left at `None` fall back to the solver-wide
/// values in [`SolverConfig`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintSettings {
    label: String,
    disabled: bool,
    broken: bool,
    baumgarte_factor: Option<f64>,
    constraint_force_mixing: Option<f64>,
    max_correction_velocity: Option<f64>,
    max_correction_angular_velocity: Option<f64>,
    breaking_force: Option<f64>,
    breaking_torque: Option<f64>,
}

impl ConstraintSettings {
    /// Default settings with a label.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Label used in logs and errors.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Set the label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// True unless disabled by the user.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Enable or disable the constraint.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.disabled = !enabled;
    }

    /// True once a breaking threshold has been exceeded.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Mark the constraint as broken or repaired.
    pub fn set_broken(&mut self, broken: bool) {
        self.broken = broken;
    }

    /// Enabled and not broken.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.broken
    }

    /// Override the Baumgarte factor.
    pub fn set_baumgarte_factor(&mut self, factor: f64) {
        self.baumgarte_factor = Some(factor);
    }

    /// Override the constraint force mixing.
    pub fn set_constraint_force_mixing(&mut self, cfm: f64) {
        self.constraint_force_mixing = Some(cfm);
    }

    /// Override both correction velocity caps.
    pub fn set_max_correction(&mut self, linear: f64, angular: f64) {
        self.max_correction_velocity = Some(linear);
        self.max_correction_angular_velocity = Some(angular);
    }

    /// Force magnitude above which the constraint breaks (N).
    pub fn set_breaking_force(&mut self, force: Option<f64>) {
        self.breaking_force = force;
    }

    /// Torque magnitude above which the constraint breaks (N·m).
    pub fn set_breaking_torque(&mut self, torque: Option<f64>) {
        self.breaking_torque = torque;
    }

    /// Breaking force threshold, if any.
    #[must_use]
    pub fn breaking_force(&self) -> Option<f64> {
        self.breaking_force
    }

    /// Breaking torque threshold, if any.
    #[must_use]
    pub fn breaking_torque(&self) -> Option<f64> {
        self.breaking_torque
    }

    /// Builder form of [`Self::set_label`].
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.set_label(label);
        self
    }

    /// Builder form of [`Self::set_baumgarte_factor`].
    #[must_use]
    pub fn with_baumgarte_factor(mut self, factor: f64) -> Self {
        self.set_baumgarte_factor(factor);
        self
    }

    /// Builder form of [`Self::set_breaking_force`].
    #[must_use]
    pub fn with_breaking_force(mut self, force: f64) -> Self {
        self.breaking_force = Some(force);
        self
    }

    /// Builder form of [`Self::set_breaking_torque`].
    #[must_use]
    pub fn with_breaking_torque(mut self, torque: f64) -> Self {
        self.breaking_torque = Some(torque);
        self
    }

    /// Stabilization parameters with solver defaults filled in.
    #[must_use]
    pub fn stabilization(&self, config: &SolverConfig) -> Stabilization {
        Stabilization {
            baumgarte_factor: self.baumgarte_factor.unwrap_or(config.baumgarte_factor),
            constraint_force_mixing: self
                .constraint_force_mixing
                .unwrap_or(config.constraint_force_mixing),
            max_correction_velocity: self
                .max_correction_velocity
                .unwrap_or(config.max_correction_velocity),
            max_correction_angular_velocity: self
                .max_correction_angular_velocity
                .unwrap_or(config.max_correction_angular_velocity),
        }
    }

    /// Mark the constraint broken if `forces` exceed a breaking threshold.
    ///
    /// Returns `true` if the constraint broke on this call.
    pub fn check_breaking(&mut self, forces: &ConstraintForces) -> bool {
        if self.broken {
            return false;
        }

        let force = forces.body_1.force.norm().max(forces.body_2.force.norm());
        let torque = forces.body_1.torque.norm().max(forces.body_2.torque.norm());
        let over_force = self.breaking_force.is_some_and(|limit| force > limit);
        let over_torque = self.breaking_torque.is_some_and(|limit| torque > limit);

        if over_force || over_torque {
            warn!(
                constraint = %self.label,
                force,
                torque,
                "constraint broke"
            );
            self.broken = true;
        }

        self.broken
    }
}

/// Kind of constraint row, selecting which correction cap applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Row constrains a distance; error in metres.
    Linear,
    /// Row constrains an angle; error in radians.
    Angular,
}

/// Resolved stabilization parameters for one constraint and step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stabilization {
    /// Fraction of error corrected per step.
    pub baumgarte_factor: f64,
    /// Added to the effective-mass diagonal.
    pub constraint_force_mixing: f64,
    /// Cap for linear rows (m/s).
    pub max_correction_velocity: f64,
    /// Cap for angular rows (rad/s).
    pub max_correction_angular_velocity: f64,
}

impl Stabilization {
    /// Velocity bias `β · error / Δt`, clamped to the cap for the row kind.
    #[must_use]
    pub fn bias(&self, error: f64, kind: RowKind, dt: f64) -> f64 {
        let cap = match kind {
            RowKind::Linear => self.max_correction_velocity,
            RowKind::Angular => self.max_correction_angular_velocity,
        };
        (self.baumgarte_factor * error / dt).clamp(-cap, cap)
    }
}
