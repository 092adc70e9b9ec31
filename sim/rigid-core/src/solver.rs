//! Sequential impulse solver.
//!
//! Each step:
//!
//! 1. Snapshot every body into a [`BodyState`].
//! 2. Collect external forces: n-body gravitation, force sources and
//!    applied impulses.
//! 3. Refresh the shared precomputations and initialize every active
//!    constraint.
//! 4. Visit the constraints in insertion order, each time feeding them the
//!    velocities that include every force found so far. Each visit returns a
//!    force increment that is added to both bodies immediately.
//! 5. Integrate every body under its external plus constraint forces.

use rigid_constraint::{BodyState, Constraint, ConstraintForces, StepContext};
use rigid_types::{
    AccelerationMoments, ForceMoments, Limits, Result, SimError, SolverConfig, SpaceVector,
    VelocityMoments, WorldSpace,
};
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::forces::gravitational_force;
use crate::system::System;

/// What happened during one solver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvolutionDetails {
    /// Passes over the constraints.
    pub iterations_run: usize,
    /// True when a required precision is configured and was reached.
    pub converged: bool,
    /// Constraints that failed to initialize or produced non-finite forces.
    pub skipped_constraints: usize,
}

/// Advances a [`System`] by one time step at a time.
#[derive(Debug, Clone)]
pub struct ImpulseSolver {
    config: SolverConfig,
    processed_steps: u64,
}

impl ImpulseSolver {
    /// Create a solver.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            processed_steps: 0,
        })
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: SolverConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Number of completed steps.
    #[must_use]
    pub fn processed_steps(&self) -> u64 {
        self.processed_steps
    }

    /// Advance `system` by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTimestep`] for a non-positive or
    /// non-finite `dt` and [`SimError::NonFinite`] when a force source or
    /// applied impulse is not finite. The system is unchanged on error.
    /// Constraint failures are not errors: the constraint is skipped for the
    /// step and counted in [`EvolutionDetails::skipped_constraints`].
    pub fn evolve(&mut self, system: &mut System, dt: f64) -> Result<EvolutionDetails> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidTimestep(dt));
        }

        let step = self.processed_steps;
        let states: Vec<BodyState> = system.bodies.iter().map(Body::state).collect();

        let gravity = gravitation(system);
        let except_gravity = external_forces(system)?;
        let external: Vec<ForceMoments<WorldSpace>> = except_gravity
            .iter()
            .zip(&gravity)
            .map(|(fm, g)| *fm + ForceMoments::from_force(*g))
            .collect();
        system.precomputations.compute_all(step, &states)?;
        for body in &mut system.bodies {
            body.reset_applied_impulses();
        }

        let ctx = StepContext {
            step,
            dt,
            bodies: &states,
            precomputations: &system.precomputations,
            config: &self.config,
        };
        let constraints = &mut system.constraints;

        let mut details = EvolutionDetails::default();
        let mut active = initialize_constraints(constraints, &ctx, &mut details);

        let mut velocities: Vec<VelocityMoments<WorldSpace>> = states
            .iter()
            .zip(&external)
            .map(|(state, fm)| state.velocity_moments + velocity_change(state, fm, dt))
            .collect();
        let mut constraint_totals = vec![ForceMoments::zero(); states.len()];
        let mut accumulated = vec![ConstraintForces::zero(); constraints.len()];

        for _ in 0..self.config.max_iterations {
            details.iterations_run += 1;
            let mut largest_increment = 0.0_f64;

            for (k, constraint) in constraints.iter_mut().enumerate() {
                if !active[k] {
                    continue;
                }
                let (b1, b2) = constraint.bodies();
                let (i1, i2) = (b1.index(), b2.index());
                let forces = constraint.constraint_forces(&velocities[i1], &velocities[i2], &ctx);

                let apply = |velocities: &mut [VelocityMoments<WorldSpace>],
                             totals: &mut [ForceMoments<WorldSpace>],
                             forces: &ConstraintForces| {
                    velocities[i1] = velocities[i1] + velocity_change(&states[i1], &forces.body_1, dt);
                    velocities[i2] = velocities[i2] + velocity_change(&states[i2], &forces.body_2, dt);
                    totals[i1] += forces.body_1;
                    totals[i2] += forces.body_2;
                };

                if !forces.is_finite() {
                    warn!(
                        constraint = %constraint.label(),
                        step,
                        "non-finite constraint forces discarded"
                    );
                    // Take back what the constraint applied in earlier passes
                    let revert = ConstraintForces::new(-accumulated[k].body_1, -accumulated[k].body_2);
                    apply(&mut velocities, &mut constraint_totals, &revert);
                    accumulated[k] = ConstraintForces::zero();
                    active[k] = false;
                    details.skipped_constraints += 1;
                    continue;
                }

                apply(&mut velocities, &mut constraint_totals, &forces);
                accumulated[k] += forces;
                largest_increment = largest_increment.max(forces.magnitude());
            }

            if let Some(precision) = self.config.required_precision {
                if largest_increment <= precision {
                    details.converged = true;
                    break;
                }
            }
        }

        for (k, constraint) in constraints.iter_mut().enumerate() {
            if active[k] {
                constraint.computed_constraint_forces(&accumulated[k], &ctx);
                constraint.settings_mut().check_breaking(&accumulated[k]);
            }
        }

        let limits = self.config.limits.unwrap_or_else(Limits::unlimited);
        for (i, body) in system.bodies.iter_mut().enumerate() {
            let applied = body.act_with_limits(&(external[i] + constraint_totals[i]), dt, &limits);
            let felt = applied - ForceMoments::from_force(gravity[i]);
            body.set_acceleration_moments_except_gravity(AccelerationMoments::new(
                felt.force * states[i].inverse_mass,
                states[i].inverse_inertia * felt.torque,
            ));
        }

        self.processed_steps += 1;
        debug!(
            step,
            dt,
            iterations = details.iterations_run,
            converged = details.converged,
            skipped = details.skipped_constraints,
            "step complete"
        );
        Ok(details)
    }
}

/// Prepare every enabled, unbroken constraint. Returns which ones are active.
fn initialize_constraints(
    constraints: &mut [Box<dyn Constraint>],
    ctx: &StepContext<'_>,
    details: &mut EvolutionDetails,
) -> Vec<bool> {
    constraints
        .iter_mut()
        .map(|constraint| {
            if !constraint.settings().is_active() {
                return false;
            }
            match constraint.initialize_step(ctx) {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        constraint = %constraint.label(),
                        step = ctx.step,
                        error = %err,
                        "constraint skipped for this step"
                    );
                    details.skipped_constraints += 1;
                    false
                }
            }
        })
        .collect()
}

/// Gravitational force on every body.
///
/// Gravitating bodies attract each other and every other body; two
/// non-gravitating bodies do not interact.
fn gravitation(system: &System) -> Vec<SpaceVector<WorldSpace>> {
    let bodies = &system.bodies;
    let mut forces = vec![SpaceVector::zeros(); bodies.len()];

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            if !(system.gravitating[i] || system.gravitating[j]) {
                continue;
            }
            let (a, b) = (&bodies[i], &bodies[j]);
            if a.is_immovable() || b.is_immovable() {
                continue;
            }
            let force = gravitational_force(
                a.mass_moments().mass(),
                a.position(),
                b.mass_moments().mass(),
                b.position(),
            );
            forces[i] += force;
            forces[j] -= force;
        }
    }

    forces
}

/// Force sources plus applied impulses for every body.
fn external_forces(system: &System) -> Result<Vec<ForceMoments<WorldSpace>>> {
    let atmosphere = system.atmosphere();
    system
        .bodies
        .iter()
        .map(|body| {
            let fm = body.external_force_moments(atmosphere);
            if fm.is_finite() {
                trace!(body = %body.label(), force = %fm.force, torque = %fm.torque, "external force");
                Ok(fm)
            } else {
                Err(SimError::non_finite(format!(
                    "external force on body '{}'",
                    body.label()
                )))
            }
        })
        .collect()
}

/// `Δv = dt·M⁻¹·F`, `Δω = dt·I⁻¹·τ`.
fn velocity_change(
    state: &BodyState,
    force_moments: &ForceMoments<WorldSpace>,
    dt: f64,
) -> VelocityMoments<WorldSpace> {
    VelocityMoments::new(
        force_moments.force * (state.inverse_mass * dt),
        (state.inverse_inertia * force_moments.torque) * dt,
    )
}
