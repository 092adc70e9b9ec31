//! External force generators.
//!
//! Gravitation between bodies is computed by the solver from
//! [`gravitational_force`]; everything else a body feels comes from its
//! [`ForceSource`], which may query the system's [`Atmosphere`].

mod atmosphere;
mod gravitation;

pub use atmosphere::{
    dynamic_air_viscosity, speed_of_sound, standard_density, standard_pressure,
    standard_temperature, standard_temperature_gradient, AltitudeModel, Atmosphere,
    AtmosphereState, StandardAtmosphere, AIR_MOLAR_MASS, STANDARD_GRAVITY,
    UNIVERSAL_GAS_CONSTANT,
};
pub use gravitation::{gravitational_force, GRAVITATIONAL_CONSTANT};

use std::fmt;

use rigid_types::{BodyCom, ForceMoments, Result, SimError, SpaceVector, WorldSpace, Wrench};

use crate::body::Body;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-body producer of external force moments.
///
/// Called once per step with the body's state at the start of the step.
pub trait ForceSource: Send + fmt::Debug {
    /// Wrench acting on `body`; the position is relative to its center of mass.
    fn wrench(&self, body: &Body, atmosphere: Option<&dyn Atmosphere>) -> Wrench<WorldSpace>;
}

/// Quadratic drag `½·ρ·|v|²·Cd·A` against the velocity relative to the air.
///
/// Without an atmosphere the drag is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearDrag {
    drag_coefficient: f64,
    reference_area: f64,
    center_of_pressure: SpaceVector<BodyCom>,
}

impl LinearDrag {
    /// Drag acting at the center of mass.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for a negative or non-finite
    /// coefficient or area.
    pub fn new(drag_coefficient: f64, reference_area: f64) -> Result<Self> {
        for (what, value) in [("drag coefficient", drag_coefficient), ("reference area", reference_area)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::invalid_config(format!(
                    "{what} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(Self {
            drag_coefficient,
            reference_area,
            center_of_pressure: SpaceVector::zeros(),
        })
    }

    /// Apply the drag at a point given in the body frame.
    #[must_use]
    pub fn with_center_of_pressure(mut self, center_of_pressure: SpaceVector<BodyCom>) -> Self {
        self.center_of_pressure = center_of_pressure;
        self
    }

    /// Drag force for a velocity relative to the air (N).
    #[must_use]
    pub fn force(&self, air_velocity: SpaceVector<WorldSpace>, density: f64) -> SpaceVector<WorldSpace> {
        let speed = air_velocity.norm();
        if speed == 0.0 {
            return SpaceVector::zeros();
        }
        air_velocity * (-0.5 * density * speed * self.drag_coefficient * self.reference_area)
    }
}

impl ForceSource for LinearDrag {
    fn wrench(&self, body: &Body, atmosphere: Option<&dyn Atmosphere>) -> Wrench<WorldSpace> {
        let Some(atmosphere) = atmosphere else {
            return Wrench::default();
        };
        let placement = body.placement();
        let arm = placement.unbound_transform_to_base(self.center_of_pressure);
        let air = atmosphere.state_at(placement.position() + arm);
        let point_velocity = body.velocity_moments().velocity_at(arm);

        Wrench::new(
            ForceMoments::from_force(self.force(point_velocity - air.wind, air.density)),
            arm,
        )
    }
}
