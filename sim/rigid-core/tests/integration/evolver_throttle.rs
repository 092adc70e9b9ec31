//! Real-time throttling drops pending time instead of catching up.

use std::thread;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use rigid_core::{Body, Evolver, Simulation, System};
use rigid_types::{EvolverConfig, MassMoments, SolverConfig};

use crate::init_tracing;

#[test]
fn slow_steps_are_throttled() {
    init_tracing();

    let mut calls = 0_u64;
    let mut evolver = Evolver::new(0.01, |_dt| {
        calls += 1;
        thread::sleep(Duration::from_millis(2));
        Ok(())
    })
    .expect("evolver");

    let budget = Duration::from_millis(10);
    let started = Instant::now();
    let report = evolver.evolve(1.0, budget).expect("evolve");
    let elapsed = started.elapsed();

    assert!(report.throttled);
    // At most one step runs past the budget, plus scheduling slack
    assert!(
        elapsed < budget + Duration::from_millis(2) + Duration::from_millis(40),
        "throttled call took {elapsed:?} against a {budget:?} budget"
    );
    assert!(
        report.steps >= 1 && report.steps <= 6,
        "{} steps ran within a 10 ms budget",
        report.steps
    );
    assert_relative_eq!(report.advanced, report.steps as f64 * 0.01, epsilon = 1e-12);
    assert_relative_eq!(report.skipped, report.requested - report.advanced, epsilon = 1e-9);
    assert_relative_eq!(evolver.simulation_time(), report.advanced, epsilon = 1e-12);

    // Dropped time is not made up by the next call
    let next = evolver
        .evolve(0.02, Duration::from_secs(10))
        .expect("evolve");
    assert!(!next.throttled);
    assert_eq!(next.steps, 2);

    drop(evolver);
    assert_eq!(calls, report.steps + 2);
}

#[test]
fn remainder_carries_over_between_calls() {
    let mut evolver = Evolver::new(0.1, |_dt| Ok(())).expect("evolver");

    let first = evolver.evolve(0.35, Duration::MAX).expect("evolve");
    let second = evolver.evolve(0.05, Duration::MAX).expect("evolve");

    assert_eq!(first.steps, 3);
    assert_eq!(second.steps, 1);
    assert_relative_eq!(evolver.simulation_time(), 0.4, epsilon = 1e-12);
}

#[test]
fn carried_remainder_is_not_reported_as_skipped() {
    let mut evolver = Evolver::new(0.1, |_dt| Ok(())).expect("evolver");
    evolver.evolve(0.35, Duration::MAX).expect("evolve");

    let report = evolver.evolve(1.0, Duration::ZERO).expect("evolve");

    assert!(report.throttled);
    assert_eq!(report.steps, 0);
    assert_relative_eq!(report.requested, 1.0);
    assert_relative_eq!(report.skipped, report.requested - report.advanced, epsilon = 1e-12);
    assert_relative_eq!(report.skipped, 1.0, epsilon = 1e-12);

    // The dropped remainder does not come back either
    let next = evolver.evolve(0.1, Duration::MAX).expect("evolve");
    assert_eq!(next.steps, 1);
    assert_relative_eq!(evolver.simulation_time(), 0.4, epsilon = 1e-12);
}

#[test]
fn simulation_uses_configured_limit() {
    init_tracing();

    let mut system = System::new();
    system.add_body(Body::new(MassMoments::sphere(1.0, 0.1)).expect("ball"));
    let mut sim = Simulation::new(
        system,
        SolverConfig::single_pass(),
        EvolverConfig::from_time_step(0.001).real_time_limit(Duration::ZERO),
    )
    .expect("simulation");

    // A zero budget runs nothing and drops everything
    let report = sim.evolve(0.5).expect("evolve");
    assert!(report.throttled);
    assert_eq!(report.steps, 0);
    assert_relative_eq!(report.skipped, 0.5, epsilon = 1e-12);
    assert_relative_eq!(sim.performance(), 0.0);
    assert_eq!(sim.solver().processed_steps(), 0);
}
