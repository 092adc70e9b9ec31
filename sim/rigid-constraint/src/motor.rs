//! Angular motor on a hinge.

use rigid_types::{BodyId, Result, SimError, VelocityMoments, WorldSpace};
use tracing::{trace, warn};

use crate::constraint::{check_hinge, hinge_bodies, Constraint, StepContext};
use crate::jacobian::{ClampedRow, ConstraintRow, JacobianRow};
use crate::precomputation::{HingeHandle, Precomputations};
use crate::settings::{ConstraintSettings, RowKind};
use crate::state::ConstraintForces;

/// Drives the relative angular velocity about a hinge axis toward a setpoint.
///
/// The motor is a rate-limited actuator rather than a kinematic constraint:
/// the torque it can apply within one step is bounded by `max_torque`, so a
/// heavy load slows it down instead of being dragged along at any cost.
#[derive(Debug)]
pub struct AngularMotorConstraint {
    hinge: HingeHandle,
    bodies: (BodyId, BodyId),
    settings: ConstraintSettings,
    max_angular_velocity: f64,
    max_torque: f64,
    setpoint: f64,
    row: Option<ClampedRow>,
    torque: f64,
}

impl AngularMotorConstraint {
    /// Motor on a registered hinge.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] if either limit is not
    /// positive and finite, or [`SimError::InvalidPrecomputation`] for an
    /// unknown handle.
    pub fn new(
        precomputations: &Precomputations,
        hinge: HingeHandle,
        max_angular_velocity: f64,
        max_torque: f64,
    ) -> Result<Self> {
        for (name, value) in [
            ("max angular velocity", max_angular_velocity),
            ("max torque", max_torque),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::invalid_constraint(format!(
                    "motor {name} must be positive and finite, got {value}"
                )));
            }
        }

        Ok(Self {
            hinge,
            bodies: hinge_bodies(precomputations, hinge)?,
            settings: ConstraintSettings::labeled("angular motor"),
            max_angular_velocity,
            max_torque,
            setpoint: 0.0,
            row: None,
            torque: 0.0,
        })
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ConstraintSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Commanded relative angular velocity (rad/s).
    #[must_use]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Command a relative angular velocity, clamped to the speed limit.
    ///
    /// NaN is ignored and the previous setpoint kept.
    pub fn set_setpoint(&mut self, angular_velocity: f64) {
        if angular_velocity.is_nan() {
            warn!(constraint = %self.settings.label(), "ignoring NaN motor setpoint");
            return;
        }
        let clamped = angular_velocity.clamp(-self.max_angular_velocity, self.max_angular_velocity);
        if clamped != angular_velocity {
            trace!(
                constraint = %self.settings.label(),
                requested = angular_velocity,
                applied = clamped,
                "motor setpoint clamped"
            );
        }
        self.setpoint = clamped;
    }

    /// Speed limit (rad/s).
    #[must_use]
    pub fn max_angular_velocity(&self) -> f64 {
        self.max_angular_velocity
    }

    /// Set the speed limit; the current setpoint is re-clamped.
    ///
    /// Non-finite values are ignored and the previous limit kept.
    pub fn set_max_angular_velocity(&mut self, max_angular_velocity: f64) {
        if !max_angular_velocity.is_finite() {
            warn!(
                constraint = %self.settings.label(),
                value = max_angular_velocity,
                "ignoring non-finite motor speed limit"
            );
            return;
        }
        self.max_angular_velocity = max_angular_velocity.abs();
        self.set_setpoint(self.setpoint);
    }

    /// Torque limit (N·m).
    #[must_use]
    pub fn max_torque(&self) -> f64 {
        self.max_torque
    }

    /// Set the torque limit. Zero makes the motor inert.
    ///
    /// Non-finite values are ignored and the previous limit kept.
    pub fn set_max_torque(&mut self, max_torque: f64) {
        if !max_torque.is_finite() {
            warn!(
                constraint = %self.settings.label(),
                value = max_torque,
                "ignoring non-finite motor torque limit"
            );
            return;
        }
        self.max_torque = max_torque.abs();
    }

    /// Torque applied to body 2 about the hinge axis in the last step (N·m).
    #[must_use]
    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// The hinge this motor drives.
    #[must_use]
    pub fn hinge(&self) -> HingeHandle {
        self.hinge
    }
}

impl Constraint for AngularMotorConstraint {
    fn bodies(&self) -> (BodyId, BodyId) {
        self.bodies
    }

    fn settings(&self) -> &ConstraintSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ConstraintSettings {
        &mut self.settings
    }

    fn validate(&self, precomputations: &Precomputations) -> Result<()> {
        check_hinge(precomputations, self.hinge, self.bodies)
    }

    fn initialize_step(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        self.row = None;
        self.torque = 0.0;
        if self.max_torque <= 0.0 {
            return Ok(());
        }

        let (s1, s2) = ctx.body_pair(self.bodies)?;
        let data = ctx.hinge(self.hinge)?;
        let row = ConstraintRow::new(JacobianRow::angular(data.a1), 0.0, RowKind::Angular);

        self.row = Some(
            ClampedRow::new(
                &row,
                s1,
                s2,
                &ctx.stabilization(&self.settings),
                ctx.dt,
                self.settings.label(),
                (-self.max_torque, self.max_torque),
            )?
            .with_target_velocity(self.setpoint),
        );
        Ok(())
    }

    fn constraint_forces(
        &mut self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
        _ctx: &StepContext<'_>,
    ) -> ConstraintForces {
        match self.row.as_mut() {
            Some(row) => {
                let forces = row.solve(vm_1, vm_2);
                self.torque = row.accumulated();
                forces
            }
            None => ConstraintForces::zero(),
        }
    }
}
