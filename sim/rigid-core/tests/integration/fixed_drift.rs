//! Joints hold their geometry while a sustained load pulls on them.

use rigid_constraint::HingeConstraint;
use rigid_core::{Body, Simulation, System};
use rigid_types::{
    BodyCom, BodyId, EvolverConfig, ForceMoments, MassMoments, SolverConfig, SpaceVector,
    WorldSpace,
};

use crate::init_tracing;

type V = SpaceVector<WorldSpace>;

const WEIGHT: f64 = 9.81;

fn load(sim: &mut Simulation, body: BodyId) {
    sim.system_mut()
        .body_mut(body)
        .expect("loaded body")
        .apply_impulse(ForceMoments::from_force(V::new(0.0, -WEIGHT, 0.0)));
}

#[test]
fn weld_does_not_sag() {
    init_tracing();

    let mut system = System::new();
    let ceiling = system.add_body(Body::new(MassMoments::immovable()).expect("ceiling"));
    let start = V::new(0.0, -1.0, 0.0);
    let lamp = system.add_body(
        Body::new(MassMoments::sphere(1.0, 0.1))
            .expect("lamp")
            .with_position(start),
    );
    system.add_fixed(ceiling, lamp).expect("weld");

    let mut sim = Simulation::new(
        system,
        SolverConfig::single_pass(),
        EvolverConfig::from_time_step(1e-3),
    )
    .expect("simulation");

    for step in 0..1000 {
        load(&mut sim, lamp);
        sim.evolve_steps(1).expect("step");

        let body = sim.system().body(lamp).expect("lamp");
        let sag = (body.position() - start).norm();
        assert!(sag < 1e-6, "step {step}: weld sagged by {sag} m");
        let speed = body.velocity_moments().velocity.norm();
        assert!(speed < 1e-6, "step {step}: lamp moving at {speed} m/s");
        let spin = body.velocity_moments().angular_velocity.norm();
        assert!(spin < 1e-6, "step {step}: lamp spinning at {spin} rad/s");
        // The weld carries the load, so the lamp feels no net force
        let felt = body.acceleration_moments_except_gravity().acceleration.norm();
        assert!(felt < 1e-6, "step {step}: lamp accelerates at {felt} m/s²");

        let placement = body.placement();
        for axis in [
            SpaceVector::<BodyCom>::x_axis(),
            SpaceVector::<BodyCom>::y_axis(),
            SpaceVector::<BodyCom>::z_axis(),
        ] {
            let turned = placement.unbound_transform_to_base(axis);
            let expected = V::new(axis.x(), axis.y(), axis.z());
            let tilt = (turned - expected).norm();
            assert!(tilt < 1e-6, "step {step}: lamp tilted by {tilt}");
        }
        assert_eq!(sim.last_details().skipped_constraints, 0, "step {step}");
    }
}

#[test]
fn pendulum_keeps_its_length() {
    init_tracing();

    let mut system = System::new();
    let pivot = system.add_body(Body::new(MassMoments::immovable()).expect("pivot"));
    let bob = system.add_body(
        Body::new(MassMoments::sphere(1.0, 0.05))
            .expect("bob")
            .with_position(V::new(1.0, 0.0, 0.0)),
    );
    let hinge = system
        .add_hinge(pivot, bob, V::zeros(), V::z_axis())
        .expect("hinge geometry");
    let constraint = HingeConstraint::new(system.precomputations(), hinge).expect("hinge");
    system.add_constraint(constraint).expect("add hinge");

    let mut sim = Simulation::new(
        system,
        SolverConfig::single_pass(),
        EvolverConfig::from_time_step(1e-3),
    )
    .expect("simulation");

    let mut lowest = 0.0_f64;
    for step in 0..2000 {
        load(&mut sim, bob);
        sim.evolve_steps(1).expect("step");

        let position = sim.system().body(bob).expect("bob").position();
        let stretch = (position.norm() - 1.0).abs();
        assert!(stretch < 1e-3, "step {step}: pendulum length off by {stretch} m");
        assert!(position.z().abs() < 1e-9, "step {step}: bob left the swing plane");
        lowest = lowest.min(position.y());
    }

    // Released horizontally, the bob swings through the bottom
    assert!(lowest < -0.99, "bob only reached y = {lowest}");
}
