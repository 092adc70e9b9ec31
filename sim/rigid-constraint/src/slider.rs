//! Slider (prismatic) constraint.

use rigid_types::{BodyId, Result, VelocityMoments, WorldSpace};

use crate::constraint::{check_slider, slider_bodies, Constraint, StepContext};
use crate::jacobian::{ConstraintRow, JacobianRow, VelocitySolver};
use crate::precomputation::{Precomputations, SliderHandle};
use crate::settings::{ConstraintSettings, RowKind};
use crate::state::ConstraintForces;

/// Lets body 2 translate along an axis fixed in body 1, removing every other
/// relative motion.
///
/// # Constraint Formulation
///
/// - 2 linear rows: `tᵢ · u = 0` for the basis vectors perpendicular to the
///   slide axis. The basis turns with body 1, so body 1's arm reaches the
///   current position of body 2.
/// - 3 angular rows: relative rotation locked.
///
/// Total: 5 rows, 1 DOF.
#[derive(Debug)]
pub struct SliderConstraint {
    slider: SliderHandle,
    bodies: (BodyId, BodyId),
    settings: ConstraintSettings,
    solver: Option<VelocitySolver>,
}

impl SliderConstraint {
    /// Slider constraint on a registered slider precalculation.
    ///
    /// # Errors
    ///
    /// Returns [`rigid_types::SimError::InvalidPrecomputation`] if `slider`
    /// is not in `precomputations`.
    pub fn new(precomputations: &Precomputations, slider: SliderHandle) -> Result<Self> {
        Ok(Self {
            slider,
            bodies: slider_bodies(precomputations, slider)?,
            settings: ConstraintSettings::labeled("slider"),
            solver: None,
        })
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ConstraintSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The slider precalculation this constraint reads.
    #[must_use]
    pub fn slider(&self) -> SliderHandle {
        self.slider
    }
}

impl Constraint for SliderConstraint {
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
        check_slider(precomputations, self.slider, self.bodies)
    }

    fn initialize_step(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        self.solver = None;
        let (s1, s2) = ctx.body_pair(self.bodies)?;
        let data = ctx.slider(self.slider)?;

        let arm_1 = data.r1 + data.u;
        let linear = |t| {
            ConstraintRow::new(
                JacobianRow::linear(t, arm_1, data.r2),
                t.dot(&data.u),
                RowKind::Linear,
            )
        };
        let [a0, a1, a2] = ConstraintRow::locked_rotation(data.rotation_error);

        self.solver = Some(VelocitySolver::new(
            &[linear(data.t1), linear(data.t2), a0, a1, a2],
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
