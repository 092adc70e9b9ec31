//! Newtonian gravitation between point masses.

use rigid_types::{SpaceVector, WorldSpace};

/// Gravitational constant (m³·kg⁻¹·s⁻²), CODATA 2018.
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;

/// Distances below this are raised to it.
const MIN_DISTANCE: f64 = 1e-9;

/// Below this the direction between the bodies is undefined.
const COINCIDENT_DISTANCE: f64 = 1e-15;

/// Force on body 1 caused by body 2 (N).
///
/// `F = G·m₁·m₂·r / |r|³` with `r = x₂ − x₁`. Bodies closer than 1 nm are
/// treated as 1 nm apart; coincident bodies attract along +X.
#[must_use]
pub fn gravitational_force(
    mass_1: f64,
    position_1: SpaceVector<WorldSpace>,
    mass_2: f64,
    position_2: SpaceVector<WorldSpace>,
) -> SpaceVector<WorldSpace> {
    let mut r = position_2 - position_1;
    let distance = r.norm();
    if distance < COINCIDENT_DISTANCE {
        r = SpaceVector::new(MIN_DISTANCE, 0.0, 0.0);
    } else if distance < MIN_DISTANCE {
        r = r * (MIN_DISTANCE / distance);
    }
    let distance = r.norm();

    r * (GRAVITATIONAL_CONSTANT * mass_1 * mass_2 / (distance * distance * distance))
}
