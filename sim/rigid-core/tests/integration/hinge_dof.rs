//! A hinge removes every relative motion except rotation about its axis.

use rigid_constraint::HingeConstraint;
use rigid_core::{Body, Simulation, System};
use rigid_types::{
    BodyCom, EvolverConfig, MassMoments, SolverConfig, SpaceVector, VelocityMoments, WorldSpace,
};

use crate::init_tracing;

type V = SpaceVector<WorldSpace>;

#[test]
fn hinge_keeps_only_axial_rotation() {
    init_tracing();

    let mut system = System::new();
    let base = system.add_body(Body::new(MassMoments::immovable()).expect("base"));
    let wheel_center = V::new(0.5, 0.0, 0.0);
    let wheel = system.add_body(
        Body::new(MassMoments::cylinder(2.0, 0.2, 0.05))
            .expect("wheel")
            .with_position(wheel_center)
            .with_velocity_moments(VelocityMoments::new(
                V::new(0.3, -0.1, 0.2),
                V::new(0.4, -0.3, 1.0),
            )),
    );
    let hinge = system
        .add_hinge(base, wheel, wheel_center, V::z_axis())
        .expect("hinge geometry");
    let constraint = HingeConstraint::new(system.precomputations(), hinge).expect("hinge");
    system.add_constraint(constraint).expect("add hinge");

    let mut sim = Simulation::new(
        system,
        SolverConfig::single_pass(),
        EvolverConfig::from_time_step(0.01),
    )
    .expect("simulation");

    for step in 0..100 {
        sim.evolve_steps(1).expect("evolve");

        let body = sim.system().body(wheel).expect("wheel");
        let vm = body.velocity_moments();

        // Linear motion and off-axis spin are gone, the axial spin is kept
        assert!(vm.velocity.norm() < 1e-6, "step {step}: wheel drifts at {}", vm.velocity);
        assert!(
            vm.angular_velocity.x().abs() < 1e-6 && vm.angular_velocity.y().abs() < 1e-6,
            "step {step}: off-axis spin {}",
            vm.angular_velocity
        );
        assert!(vm.angular_velocity.z() > 0.1, "step {step}: axial spin lost: {}", vm.angular_velocity);

        let placement = body.placement();
        let axis = placement.unbound_transform_to_base(SpaceVector::<BodyCom>::z_axis());
        assert!((axis - V::z_axis()).norm() < 1e-6, "step {step}: wheel axis tilted to {axis}");
        let offset = (body.position() - wheel_center).norm();
        assert!(offset < 1e-6, "step {step}: wheel center moved by {offset} m");
        let spoke = placement.unbound_transform_to_base(SpaceVector::<BodyCom>::x_axis());
        assert!(spoke.z().abs() < 1e-6, "step {step}: spoke left the wheel plane: {spoke}");
    }

    // The wheel has turned about the hinge axis
    let spoke = sim
        .system()
        .body(wheel)
        .expect("wheel")
        .placement()
        .unbound_transform_to_base(SpaceVector::<BodyCom>::x_axis());
    assert!(spoke.x() < 0.99, "wheel never turned: spoke at {spoke}");
}
