//! The Earth as a rigid body.

use rigid_types::{MassMoments, Shape, SpaceMatrix};

use crate::body::Body;

/// Mass of the Earth (kg).
pub const EARTH_MASS: f64 = 5.9722e24;

/// Mean radius of the Earth (m).
pub const EARTH_MEAN_RADIUS: f64 = 6_371_000.0;

/// Principal moments of inertia of the Earth (kg·m²), EGM96.
pub const EARTH_PRINCIPAL_MOMENTS: [f64; 3] = [8.008_085e37, 8.008_262e37, 8.034_476e37];

/// Earth body at rest at the world origin, polar axis along Z.
///
/// Carries a coarse sphere shape of the mean radius. Register it with
/// [`crate::System::add_gravitating_body`] to make it attract other bodies.
#[must_use]
pub fn make_earth() -> Body {
    let [ixx, iyy, izz] = EARTH_PRINCIPAL_MOMENTS;
    let mass_moments = MassMoments::new(EARTH_MASS, SpaceMatrix::from_diagonal(ixx, iyy, izz));

    Body::from_valid_mass_moments(mass_moments)
        .with_label("Earth")
        .with_shape(Shape::centered_sphere(EARTH_MEAN_RADIUS, 24, 12))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_earth_is_valid() {
        let earth = make_earth();

        assert!(earth.mass_moments().validate().is_ok());
        assert_relative_eq!(earth.mass_moments().mass(), EARTH_MASS);
        assert_relative_eq!(earth.position().norm(), 0.0);
        assert_eq!(earth.label(), "Earth");
        assert!(earth.shape().is_some_and(|shape| !shape.is_empty()));
    }

    #[test]
    fn test_earth_inertia_is_close_to_uniform_sphere() {
        // The real Earth is denser at the core than a uniform sphere
        let uniform = 0.4 * EARTH_MASS * EARTH_MEAN_RADIUS * EARTH_MEAN_RADIUS;
        let ratio = EARTH_PRINCIPAL_MOMENTS[2] / uniform;
        assert!(ratio > 0.8 && ratio < 0.85);
    }
}
