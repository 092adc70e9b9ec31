//! Rigid-body systems stepped by a velocity-level impulse solver.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    Simulation / Evolver                    │
//! │   fixed time step, remainder carry-over, real-time limit  │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │ one call per step
//!                               ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                       ImpulseSolver                        │
//! │  gravitation + force sources → constraint passes → act    │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │
//!                               ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                           System                           │
//! │   bodies │ constraints │ precomputations │ atmosphere     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! A step computes external force moments for every body (mutual
//! gravitation, [`ForceSource`] output and queued impulses), refreshes the
//! shared hinge and slider geometry, initializes every active constraint and
//! then visits them in insertion order, updating body velocities after each
//! visit. Bodies finally integrate with the summed force moments.
//!
//! # Quick Start
//!
//! ```
//! use rigid_core::{Body, Simulation, System};
//! use rigid_types::{EvolverConfig, ForceMoments, MassMoments, SolverConfig, SpaceVector};
//!
//! let mut system = System::new();
//! let ball = system.add_body(Body::new(MassMoments::sphere(1.0, 0.1)).unwrap());
//!
//! let mut sim = Simulation::new(
//!     system,
//!     SolverConfig::single_pass(),
//!     EvolverConfig::from_time_step(0.01),
//! )
//! .unwrap();
//!
//! sim.system_mut()
//!     .body_mut(ball)
//!     .unwrap()
//!     .apply_impulse(ForceMoments::from_force(SpaceVector::new(1.0, 0.0, 0.0)));
//! sim.evolve_steps(1).unwrap();
//!
//! // 1 N for 10 ms on 1 kg
//! let v = sim.system().body(ball).unwrap().velocity_moments().velocity;
//! assert!((v.x() - 0.01).abs() < 1e-12);
//! ```
//!
//! # Orbits
//!
//! Bodies added with [`System::add_gravitating_body`] attract each other
//! pairwise. [`make_earth`] builds a body with Earth's mass and inertia, and
//! [`forces::StandardAtmosphere`] supplies density and wind for drag.

#![doc(html_root_url = "https://docs.rs/rigid-core/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod body;
pub mod earth;
mod evolver;
pub mod forces;
mod group;
mod solver;
mod system;

pub use body::Body;
pub use earth::{make_earth, EARTH_MASS, EARTH_MEAN_RADIUS};
pub use evolver::{EvolutionReport, Evolver, Simulation};
pub use forces::{Atmosphere, ForceSource, LinearDrag, StandardAtmosphere};
pub use group::Group;
pub use solver::{EvolutionDetails, ImpulseSolver};
pub use system::System;

pub use rigid_constraint;
pub use rigid_types;
