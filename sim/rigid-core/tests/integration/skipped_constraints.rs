//! Constraints that fail are skipped for the step; the simulation goes on.

use rigid_constraint::{
    AngularSpringConstraint, Constraint, ConstraintForces, ConstraintSettings, StepContext,
};
use rigid_core::{Body, ImpulseSolver, System};
use rigid_types::{
    BodyId, ForceMoments, MassMoments, Result, SimError, SolverConfig, SpaceVector,
    VelocityMoments, WorldSpace,
};

use crate::init_tracing;

type V = SpaceVector<WorldSpace>;

fn ball(system: &mut System, x: f64) -> BodyId {
    system.add_body(
        Body::new(MassMoments::sphere(1.0, 0.1))
            .expect("ball")
            .with_position(V::new(x, 0.0, 0.0)),
    )
}

/// Pushes the two bodies apart on the first pass, then reports NaN.
#[derive(Debug)]
struct Faulty {
    bodies: (BodyId, BodyId),
    settings: ConstraintSettings,
    visits: usize,
}

impl Constraint for Faulty {
    fn bodies(&self) -> (BodyId, BodyId) {
        self.bodies
    }

    fn settings(&self) -> &ConstraintSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ConstraintSettings {
        &mut self.settings
    }

    fn initialize_step(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        self.visits = 0;
        Ok(())
    }

    fn constraint_forces(
        &mut self,
        _vm_1: &VelocityMoments<WorldSpace>,
        _vm_2: &VelocityMoments<WorldSpace>,
        _ctx: &StepContext<'_>,
    ) -> ConstraintForces {
        self.visits += 1;
        let push = if self.visits == 1 { 5.0 } else { f64::NAN };
        let force = ForceMoments::from_force(V::new(push, 0.0, 0.0));
        ConstraintForces::new(-force, force)
    }
}

#[test]
fn welding_two_immovable_bodies_is_skipped() {
    init_tracing();

    let mut system = System::new();
    let wall = system.add_body(Body::new(MassMoments::immovable()).expect("wall"));
    let floor = system.add_body(
        Body::new(MassMoments::immovable())
            .expect("floor")
            .with_position(V::new(0.0, -1.0, 0.0)),
    );
    system.add_fixed(wall, floor).expect("singular weld is accepted");
    let a = ball(&mut system, 1.0);
    let b = ball(&mut system, 2.0);
    system.add_fixed(a, b).expect("weld");
    system
        .body_mut(b)
        .expect("ball")
        .apply_impulse(ForceMoments::from_force(V::new(0.0, 10.0, 0.0)));

    let mut solver = ImpulseSolver::new(SolverConfig::single_pass()).expect("solver");
    let details = solver.evolve(&mut system, 0.01).expect("step");

    assert_eq!(details.skipped_constraints, 1);
    // The healthy weld still shares the impulse
    let va = system.body(a).expect("ball").velocity_moments().velocity;
    assert!(va.y() > 0.0, "welded partner did not move: {va}");
}

#[test]
fn non_finite_spring_is_skipped() {
    init_tracing();

    let mut system = System::new();
    let base = system.add_body(Body::new(MassMoments::immovable()).expect("base"));
    let arm = ball(&mut system, 1.0);
    let hinge = system
        .add_hinge(base, arm, V::zeros(), V::z_axis())
        .expect("hinge geometry");
    let spring = AngularSpringConstraint::new(system.precomputations(), hinge, |_angle| f64::NAN)
        .expect("spring");
    system.add_constraint(spring).expect("add spring");

    let mut solver = ImpulseSolver::new(SolverConfig::single_pass()).expect("solver");
    for _ in 0..3 {
        let details = solver.evolve(&mut system, 0.01).expect("step");
        assert_eq!(details.skipped_constraints, 1);
    }
    let body = system.body(arm).expect("arm");
    assert!(body.position().is_finite());
    assert!(body.velocity_moments().angular_velocity.norm() < 1e-12);
}

#[test]
fn non_finite_forces_are_taken_back() {
    init_tracing();

    let mut system = System::new();
    let a = ball(&mut system, 0.0);
    let b = ball(&mut system, 1.0);
    system
        .add_constraint(Faulty {
            bodies: (a, b),
            settings: ConstraintSettings::labeled("faulty"),
            visits: 0,
        })
        .expect("add");

    let mut solver = ImpulseSolver::new(SolverConfig::iterative(5)).expect("solver");
    let details = solver.evolve(&mut system, 0.01).expect("step");

    assert_eq!(details.skipped_constraints, 1);
    // The push from the first pass was reverted with the constraint
    for id in [a, b] {
        let body = system.body(id).expect("ball");
        assert!(body.velocity_moments().velocity.norm() < 1e-12);
        assert!(body.position().is_finite());
    }
}

#[test]
fn stale_geometry_is_an_error() {
    init_tracing();

    let mut system = System::new();
    let base = system.add_body(Body::new(MassMoments::immovable()).expect("base"));
    let arm = ball(&mut system, 1.0);
    let hinge = system
        .add_hinge(base, arm, V::zeros(), V::z_axis())
        .expect("hinge geometry");

    // Nothing computed yet
    assert!(matches!(
        system.precomputations().hinge_data(hinge, 0),
        Err(SimError::StalePrecomputation { .. })
    ));

    let mut solver = ImpulseSolver::new(SolverConfig::single_pass()).expect("solver");
    solver.evolve(&mut system, 0.01).expect("step");
    solver.evolve(&mut system, 0.01).expect("step");

    let current = solver.processed_steps() - 1;
    assert!(system.precomputations().hinge_data(hinge, current).is_ok());
    assert!(matches!(
        system.precomputations().hinge_data(hinge, current - 1),
        Err(SimError::StalePrecomputation { .. })
    ));
}
