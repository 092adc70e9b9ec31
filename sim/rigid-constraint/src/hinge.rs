//! Hinge (revolute) constraint.

use rigid_types::{BodyId, Result, VelocityMoments, WorldSpace};

use crate::constraint::{check_hinge, hinge_bodies, Constraint, StepContext};
use crate::jacobian::{ConstraintRow, JacobianRow, VelocitySolver};
use crate::precomputation::{HingeHandle, Precomputations};
use crate::settings::{ConstraintSettings, RowKind};
use crate::state::ConstraintForces;

/// Holds two bodies together at the hinge anchor and keeps their hinge axes
/// aligned, leaving rotation about the axis free.
///
/// # Constraint Formulation
///
/// - 3 linear rows: anchor separation `u` along each world axis
/// - 2 angular rows: `tᵢ · a2 = 0` for the basis vectors `t1`, `t2`
///   perpendicular to `a1`
///
/// Total: 5 rows, 1 DOF.
#[derive(Debug)]
pub struct HingeConstraint {
    hinge: HingeHandle,
    bodies: (BodyId, BodyId),
    settings: ConstraintSettings,
    solver: Option<VelocitySolver>,
}

impl HingeConstraint {
    /// Hinge constraint on a registered hinge precomputation.
    ///
    /// # Errors
    ///
    /// Returns [`rigid_types::SimError::InvalidPrecomputation`] if `hinge` is
    /// not in `precomputations`.
    pub fn new(precomputations: &Precomputations, hinge: HingeHandle) -> Result<Self> {
        Ok(Self {
            hinge,
            bodies: hinge_bodies(precomputations, hinge)?,
            settings: ConstraintSettings::labeled("hinge"),
            solver: None,
        })
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ConstraintSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The hinge precomputation this constraint reads.
    #[must_use]
    pub fn hinge(&self) -> HingeHandle {
        self.hinge
    }
}

impl Constraint for HingeConstraint {
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
        self.solver = None;
        let (s1, s2) = ctx.body_pair(self.bodies)?;
        let data = ctx.hinge(self.hinge)?;

        let [l0, l1, l2] = ConstraintRow::coincident_points(data.r1, data.r2, data.u);
        // d/dt (tᵢ · a2) = (a2 × tᵢ) · (ω2 − ω1)
        let angular = |t| {
            ConstraintRow::new(
                JacobianRow::angular(data.a2.cross(&t)),
                t.dot(&data.a2),
                RowKind::Angular,
            )
        };

        self.solver = Some(VelocitySolver::new(
            &[l0, l1, l2, angular(data.t1), angular(data.t2)],
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
