//! Fixed (weld) constraint.

use rigid_types::{BodyCom, BodyId, Result, SimError, SpaceVector, VelocityMoments, WorldSpace};

use crate::constraint::{Constraint, StepContext};
use crate::jacobian::{ConstraintRow, VelocitySolver};
use crate::precomputation::FixedOrientationHelper;
use crate::settings::ConstraintSettings;
use crate::state::{BodyRef, ConstraintForces};

/// Locks the relative position and orientation of two bodies.
///
/// Removes all six relative degrees of freedom. The bodies are joined at the
/// midpoint between their centers of mass in the assembly pose; the rotation
/// error is measured against the assembly-time relative orientation.
#[derive(Debug)]
pub struct FixedConstraint {
    body_1: BodyId,
    body_2: BodyId,
    anchor_1: SpaceVector<BodyCom>,
    anchor_2: SpaceVector<BodyCom>,
    orientation: FixedOrientationHelper,
    settings: ConstraintSettings,
    solver: Option<VelocitySolver>,
}

impl FixedConstraint {
    /// Weld two bodies in their current poses.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] if both bodies are the same.
    pub fn new(body_1: BodyRef<'_>, body_2: BodyRef<'_>) -> Result<Self> {
        if body_1.id == body_2.id {
            return Err(SimError::invalid_constraint(format!(
                "fixed constraint connects {} to itself",
                body_1.id
            )));
        }

        let midpoint = (body_1.placement.position() + body_2.placement.position()) * 0.5;

        Ok(Self {
            body_1: body_1.id,
            body_2: body_2.id,
            anchor_1: body_1.placement.bound_transform_to_body(midpoint),
            anchor_2: body_2.placement.bound_transform_to_body(midpoint),
            orientation: FixedOrientationHelper::new(
                &body_1.placement.body_to_base(),
                &body_2.placement.body_to_base(),
            ),
            settings: ConstraintSettings::labeled("fixed"),
            solver: None,
        })
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ConstraintSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Constraint for FixedConstraint {
    fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_1, self.body_2)
    }

    fn settings(&self) -> &ConstraintSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ConstraintSettings {
        &mut self.settings
    }

    fn initialize_step(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        self.solver = None;
        let (s1, s2) = ctx.body_pair(self.bodies())?;
        let pl_1 = &s1.placement;
        let pl_2 = &s2.placement;

        let r1 = pl_1.unbound_transform_to_base(self.anchor_1);
        let r2 = pl_2.unbound_transform_to_base(self.anchor_2);
        let u = pl_2.position() + r2 - pl_1.position() - r1;
        let rotation_error = self
            .orientation
            .rotation_error(&pl_1.body_to_base(), &pl_2.body_to_base());

        let [l0, l1, l2] = ConstraintRow::coincident_points(r1, r2, u);
        let [a0, a1, a2] = ConstraintRow::locked_rotation(rotation_error);

        self.solver = Some(VelocitySolver::new(
            &[l0, l1, l2, a0, a1, a2],
            s1,
            s2,
            &ctx.stabilization(&self.settings),
            ctx.dt,
            self.settings.label(),
        )?);
        Ok(())
    }

    fn constraint_forces(
        &mut self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
        _ctx: &StepContext<'_>,
    ) -> ConstraintForces {
        self.solver
            .as_ref()
            .map_or_else(ConstraintForces::zero, |solver| solver.solve(vm_1, vm_2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::precomputation::Precomputations;
    use crate::state::BodyState;
    use approx::assert_relative_eq;
    use rigid_types::{MassMoments, Placement, SolverConfig};

    fn state(x: f64, velocity: SpaceVector<WorldSpace>, omega: SpaceVector<WorldSpace>) -> BodyState {
        BodyState::new(
            Placement::from_position(SpaceVector::new(x, 0.0, 0.0)),
            VelocityMoments::new(velocity, omega),
            &MassMoments::sphere(2.0, 0.3),
        )
    }

    #[test]
    fn test_fixed_stops_relative_motion() {
        let pl_1 = Placement::from_position(SpaceVector::zeros());
        let pl_2 = Placement::from_position(SpaceVector::x_axis());
        let mut fixed = FixedConstraint::new(
            BodyRef::new(BodyId::new(0), &pl_1),
            BodyRef::new(BodyId::new(1), &pl_2),
        )
        .unwrap();

        let bodies = [
            state(0.0, SpaceVector::zeros(), SpaceVector::zeros()),
            state(1.0, SpaceVector::new(0.0, 1.0, 0.0), SpaceVector::new(0.0, 0.0, 2.0)),
        ];
        let precomputations = Precomputations::new();
        let config = SolverConfig::default();
        let dt = 0.001;
        let ctx = StepContext {
            step: 0,
            dt,
            bodies: &bodies,
            precomputations: &precomputations,
            config: &config,
        };

        fixed.initialize_step(&ctx).unwrap();
        let forces = fixed.constraint_forces(
            &bodies[0].velocity_moments,
            &bodies[1].velocity_moments,
            &ctx,
        );

        let apply = |s: &BodyState, f: &rigid_types::ForceMoments<WorldSpace>| {
            VelocityMoments::new(
                s.velocity_moments.velocity + f.force * (s.inverse_mass * dt),
                s.velocity_moments.angular_velocity + (s.inverse_inertia * f.torque) * dt,
            )
        };
        let v1 = apply(&bodies[0], &forces.body_1);
        let v2 = apply(&bodies[1], &forces.body_2);

        // Both anchors (the midpoint) now move together and spins match
        let anchor_1 = v1.velocity_at(SpaceVector::new(0.5, 0.0, 0.0));
        let anchor_2 = v2.velocity_at(SpaceVector::new(-0.5, 0.0, 0.0));
        assert_relative_eq!((anchor_2 - anchor_1).norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            (v2.angular_velocity - v1.angular_velocity).norm(),
            0.0,
            epsilon = 1e-9
        );

        // Linear momentum is conserved
        let p_before = (bodies[0].velocity_moments.velocity + bodies[1].velocity_moments.velocity) * 2.0;
        let p_after = (v1.velocity + v2.velocity) * 2.0;
        assert_relative_eq!((p_after - p_before).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_uninitialized_fixed_applies_nothing() {
        let pl = Placement::identity();
        let other = Placement::from_position(SpaceVector::x_axis());
        let mut fixed = FixedConstraint::new(
            BodyRef::new(BodyId::new(0), &pl),
            BodyRef::new(BodyId::new(1), &other),
        )
        .unwrap();
        let precomputations = Precomputations::new();
        let config = SolverConfig::default();
        let ctx = StepContext {
            step: 0,
            dt: 0.01,
            bodies: &[],
            precomputations: &precomputations,
            config: &config,
        };

        assert!(matches!(
            fixed.initialize_step(&ctx),
            Err(SimError::InvalidBodyId(0))
        ));
        let forces = fixed.constraint_forces(&VelocityMoments::zero(), &VelocityMoments::zero(), &ctx);
        assert_relative_eq!(forces.magnitude(), 0.0);
    }

    #[test]
    fn test_rejects_self_weld() {
        let pl = Placement::identity();
        let result = FixedConstraint::new(
            BodyRef::new(BodyId::new(3), &pl),
            BodyRef::new(BodyId::new(3), &pl),
        );
        assert!(result.is_err());
    }
}
