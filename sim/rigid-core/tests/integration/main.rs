//! End-to-end tests for the rigid-core pipeline.
//!
//! These tests drive whole systems through the solver and evolver:
//! - Circular orbit around a gravitating Earth
//! - Joints holding their geometry under sustained load
//! - Servo setpoints reached through the system's typed access
//! - Real-time throttling of the evolver
//! - Constraints skipped without stopping the simulation

mod evolver_throttle;
mod fixed_drift;
mod hinge_dof;
mod orbit;
mod servo_clamp;
mod skipped_constraints;

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
