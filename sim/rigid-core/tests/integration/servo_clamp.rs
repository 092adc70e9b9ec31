//! Servo setpoints through typed constraint access.

use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use rigid_constraint::{
    make_standard_servo, AngularMotorConstraint, AngularServoConstraint, FixedConstraint,
    HingeConstraint,
};
use rigid_core::{Body, Simulation, System};
use rigid_types::{
    BodyId, ConstraintId, EvolverConfig, MassMoments, SimError, SolverConfig, SpaceVector,
    WorldSpace,
};

use crate::init_tracing;

type V = SpaceVector<WorldSpace>;

struct Rig {
    sim: Simulation,
    servo: ConstraintId,
    hinge: ConstraintId,
}

fn servo_rig() -> Rig {
    let mut system = System::new();
    let horn_center = V::new(0.2, 0.0, 0.0);
    let housing = system.add_body(Body::new(MassMoments::immovable()).expect("housing"));
    let horn: BodyId = system.add_body(
        Body::new(MassMoments::sphere(1.0, 0.1))
            .expect("horn")
            .with_position(horn_center),
    );
    let axle = system
        .add_hinge(housing, horn, horn_center, V::z_axis())
        .expect("hinge geometry");

    let hinge = HingeConstraint::new(system.precomputations(), axle).expect("hinge");
    let hinge = system.add_constraint(hinge).expect("add hinge");
    let servo = make_standard_servo(system.precomputations(), axle, 1.0).expect("servo");
    let servo = system.add_constraint(servo).expect("add servo");

    let sim = Simulation::new(
        system,
        SolverConfig::single_pass(),
        EvolverConfig::from_time_step(0.01),
    )
    .expect("simulation");
    Rig { sim, servo, hinge }
}

#[test]
fn out_of_range_setpoint_saturates() {
    init_tracing();
    let mut rig = servo_rig();
    let servo = rig
        .sim
        .system_mut()
        .constraint_mut::<AngularServoConstraint>(rig.servo)
        .expect("servo access");

    servo.set_setpoint(10.0);
    assert_relative_eq!(servo.setpoint(), FRAC_PI_2, epsilon = 1e-12);

    // Re-applying the applied value changes nothing
    let applied = servo.setpoint();
    servo.set_setpoint(applied);
    assert_relative_eq!(servo.setpoint(), applied);

    servo.set_setpoint(-10.0);
    assert_relative_eq!(servo.setpoint(), -FRAC_PI_2, epsilon = 1e-12);
}

#[test]
fn servo_drives_the_horn() {
    init_tracing();
    let mut rig = servo_rig();
    rig.sim
        .system_mut()
        .constraint_mut::<AngularServoConstraint>(rig.servo)
        .expect("servo access")
        .set_setpoint(0.5);

    rig.sim.evolve_steps(100).expect("evolve");

    let servo = rig
        .sim
        .system()
        .constraint::<AngularServoConstraint>(rig.servo)
        .expect("servo access");
    let angle = servo.arm_angle();
    assert!(angle > 0.3 && angle < 0.7, "horn at {angle} rad, commanded 0.5");
    assert_eq!(rig.sim.last_details().skipped_constraints, 0);
}

#[test]
fn nan_commands_leave_the_servo_driving() {
    init_tracing();
    let mut rig = servo_rig();
    {
        let servo = rig
            .sim
            .system_mut()
            .constraint_mut::<AngularServoConstraint>(rig.servo)
            .expect("servo access");
        servo.set_setpoint(0.5);
        servo.set_setpoint(f64::NAN);
        servo.set_voltage(f64::NAN);
    }

    rig.sim.evolve_steps(100).expect("evolve");

    let servo = rig
        .sim
        .system()
        .constraint::<AngularServoConstraint>(rig.servo)
        .expect("servo access");
    let angle = servo.arm_angle();
    assert!(angle > 0.3 && angle < 0.7, "horn at {angle} rad, commanded 0.5");
}

#[test]
fn nan_motor_limits_are_ignored_while_stepping() {
    init_tracing();
    let mut system = System::new();
    let horn_center = V::new(0.2, 0.0, 0.0);
    let housing = system.add_body(Body::new(MassMoments::immovable()).expect("housing"));
    let horn = system.add_body(
        Body::new(MassMoments::sphere(1.0, 0.1))
            .expect("horn")
            .with_position(horn_center),
    );
    let axle = system
        .add_hinge(housing, horn, horn_center, V::z_axis())
        .expect("hinge geometry");
    let hinge = HingeConstraint::new(system.precomputations(), axle).expect("hinge");
    system.add_constraint(hinge).expect("add hinge");
    let motor =
        AngularMotorConstraint::new(system.precomputations(), axle, 1.0, 2.0).expect("motor");
    let motor = system.add_constraint(motor).expect("add motor");

    let mut sim = Simulation::new(
        system,
        SolverConfig::single_pass(),
        EvolverConfig::from_time_step(0.01),
    )
    .expect("simulation");
    {
        let motor = sim
            .system_mut()
            .constraint_mut::<AngularMotorConstraint>(motor)
            .expect("motor access");
        motor.set_setpoint(0.5);
        motor.set_max_torque(f64::NAN);
        motor.set_max_angular_velocity(f64::NAN);
        motor.set_setpoint(f64::NAN);
    }

    for step in 0..50 {
        sim.evolve_steps(1).expect("evolve");
        assert_eq!(sim.last_details().skipped_constraints, 0, "step {step}");
        let spin = sim
            .system()
            .body(horn)
            .expect("horn")
            .velocity_moments()
            .angular_velocity
            .z();
        assert!(spin.is_finite(), "step {step}: spin {spin}");
        assert!((spin - 0.5).abs() < 0.05, "step {step}: spin {spin} rad/s, commanded 0.5");
    }
}

#[test]
fn wrong_type_is_rejected() {
    let rig = servo_rig();
    let system = rig.sim.system();

    assert!(system.constraint::<HingeConstraint>(rig.hinge).is_ok());
    assert!(matches!(
        system.constraint::<FixedConstraint>(rig.hinge),
        Err(SimError::InvalidConstraint { .. })
    ));
    assert!(matches!(
        system.constraint::<HingeConstraint>(ConstraintId::new(99)),
        Err(SimError::InvalidConstraintId(99))
    ));
}
