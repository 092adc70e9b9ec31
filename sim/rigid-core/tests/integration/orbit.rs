//! A satellite on a circular orbit returns to where it started.

use std::f64::consts::PI;

use rigid_core::forces::GRAVITATIONAL_CONSTANT;
use rigid_core::{make_earth, Body, Simulation, System, EARTH_MASS, EARTH_MEAN_RADIUS};
use rigid_types::{
    EvolverConfig, Limits, MassMoments, SolverConfig, SpaceVector, VelocityMoments, WorldSpace,
};

use crate::init_tracing;

type V = SpaceVector<WorldSpace>;

const ALTITUDE: f64 = 400_000.0;
const STEPS_PER_ORBIT: u64 = 8000;

#[test]
fn circular_orbit_closes() {
    init_tracing();

    let radius = EARTH_MEAN_RADIUS + ALTITUDE;
    let mu = GRAVITATIONAL_CONSTANT * EARTH_MASS;
    let speed = (mu / radius).sqrt();
    let period = 2.0 * PI * (radius.powi(3) / mu).sqrt();

    let mut system = System::new();
    let earth = system.add_gravitating_body(make_earth());
    let satellite = system.add_body(
        Body::new(MassMoments::sphere(1000.0, 1.0))
            .expect("satellite")
            .with_label("satellite")
            .with_position(V::new(radius, 0.0, 0.0))
            .with_velocity_moments(VelocityMoments::new(V::new(0.0, 0.0, speed), V::zeros())),
    );

    let mut sim = Simulation::new(
        system,
        SolverConfig::orbital(),
        EvolverConfig::from_time_step(period / STEPS_PER_ORBIT as f64),
    )
    .expect("simulation");

    // Angular momentum along −Y: +X, +Z, −X, −Z, back to +X
    let checkpoints = [
        V::new(0.0, 0.0, radius),
        V::new(-radius, 0.0, 0.0),
        V::new(0.0, 0.0, -radius),
        V::new(radius, 0.0, 0.0),
    ];
    for (quarter, expected) in checkpoints.iter().enumerate() {
        sim.evolve_steps(STEPS_PER_ORBIT / 4).expect("evolve");
        let position = sim.system().body(satellite).expect("satellite").position();
        let miss = (position - *expected).norm();
        let tolerance = if quarter == 3 { 5_000.0 } else { 20_000.0 };
        assert!(
            miss < tolerance,
            "quarter {}: satellite at {position}, expected {expected}, off by {miss} m",
            quarter + 1
        );
    }

    let earth_shift = sim.system().body(earth).expect("earth").position().norm();
    assert!(earth_shift < 0.01, "Earth moved {earth_shift} m");
    assert!(sim.simulation_time() > period * 0.999);
}

#[test]
fn default_config_keeps_orbital_speed() {
    init_tracing();

    let radius = EARTH_MEAN_RADIUS + ALTITUDE;
    let speed = (GRAVITATIONAL_CONSTANT * EARTH_MASS / radius).sqrt();
    // Far beyond the opt-in defaults
    assert!(speed > Limits::default().max_velocity);

    let mut system = System::new();
    system.add_gravitating_body(make_earth());
    let satellite = system.add_body(
        Body::new(MassMoments::sphere(1000.0, 1.0))
            .expect("satellite")
            .with_position(V::new(radius, 0.0, 0.0))
            .with_velocity_moments(VelocityMoments::new(V::new(0.0, 0.0, speed), V::zeros())),
    );
    let mut sim = Simulation::new(
        system,
        SolverConfig::default(),
        EvolverConfig::from_time_step(0.1),
    )
    .expect("simulation");

    for step in 0..10 {
        sim.evolve_steps(1).expect("evolve");
        let velocity = sim.system().body(satellite).expect("satellite").velocity_moments().velocity;
        let drift = (velocity.norm() - speed).abs();
        assert!(drift < 1e-3 * speed, "step {step}: speed {} vs {speed}", velocity.norm());
    }
}
