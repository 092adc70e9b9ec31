//! Mass and inertia of rigid bodies.

use std::ops::Add;

use nalgebra::Matrix3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::CoordinateSystem;
use crate::space::{RotationQuaternion, SpaceMatrix, SpaceVector};
use crate::{Result, SimError};

/// Tolerance used when checking the inertia tensor for symmetry.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

// ============================================================================
// MassMoments
// ============================================================================

/// Mass and inertia tensor about the center of mass, expressed in frame `F`.
///
/// The inverse inertia tensor is cached and recomputed by every setter; it
/// cannot be changed on its own. An infinite mass describes a body that no
/// force can move; its inverse mass and inverse inertia are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct MassMoments<F: CoordinateSystem> {
    mass: f64,
    inertia_tensor: SpaceMatrix<F, F>,
    inverse_inertia_tensor: SpaceMatrix<F, F>,
}

impl<F: CoordinateSystem> MassMoments<F> {
    /// Create mass moments from mass (kg) and inertia tensor (kg·m²).
    ///
    /// A singular tensor gets a zero inverse; call [`Self::validate`] to
    /// reject such input.
    #[must_use]
    pub fn new(mass: f64, inertia_tensor: SpaceMatrix<F, F>) -> Self {
        Self {
            mass,
            inertia_tensor,
            inverse_inertia_tensor: Self::invert(mass, &inertia_tensor),
        }
    }

    /// Immovable body (infinite mass and inertia).
    #[must_use]
    pub fn immovable() -> Self {
        Self {
            mass: f64::INFINITY,
            inertia_tensor: SpaceMatrix::zeros(),
            inverse_inertia_tensor: SpaceMatrix::zeros(),
        }
    }

    /// Solid sphere of uniform density.
    ///
    /// `I = 2/5 · m · r²` about every axis.
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self::new(mass, SpaceMatrix::from_diagonal(i, i, i))
    }

    /// Solid cuboid of uniform density with full edge lengths `dimensions`.
    ///
    /// - Ixx = (1/12) · m · (y² + z²)
    /// - Iyy = (1/12) · m · (x² + z²)
    /// - Izz = (1/12) · m · (x² + y²)
    #[must_use]
    pub fn cuboid(mass: f64, dimensions: SpaceVector<F>) -> Self {
        let x2 = dimensions.x() * dimensions.x();
        let y2 = dimensions.y() * dimensions.y();
        let z2 = dimensions.z() * dimensions.z();

        Self::new(
            mass,
            SpaceMatrix::from_diagonal(
                mass * (y2 + z2) / 12.0,
                mass * (x2 + z2) / 12.0,
                mass * (x2 + y2) / 12.0,
            ),
        )
    }

    /// Solid cylinder of uniform density along the Z axis.
    #[must_use]
    pub fn cylinder(mass: f64, radius: f64, length: f64) -> Self {
        let r2 = radius * radius;
        let ixx = mass * (3.0 * r2 + length * length) / 12.0;
        let izz = 0.5 * mass * r2;
        Self::new(mass, SpaceMatrix::from_diagonal(ixx, ixx, izz))
    }

    /// Mass (kg).
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Inverse mass, zero for immovable bodies.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.mass.is_finite() && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Inertia tensor about the center of mass (kg·m²).
    #[must_use]
    pub fn inertia_tensor(&self) -> SpaceMatrix<F, F> {
        self.inertia_tensor
    }

    /// Cached inverse of the inertia tensor.
    #[must_use]
    pub fn inverse_inertia_tensor(&self) -> SpaceMatrix<F, F> {
        self.inverse_inertia_tensor
    }

    /// True for bodies with infinite mass.
    #[must_use]
    pub fn is_immovable(&self) -> bool {
        self.mass == f64::INFINITY
    }

    /// Replace the mass, keeping the inertia tensor.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
        self.inverse_inertia_tensor = Self::invert(mass, &self.inertia_tensor);
    }

    /// Replace the inertia tensor and recompute its inverse.
    pub fn set_inertia_tensor(&mut self, inertia_tensor: SpaceMatrix<F, F>) {
        self.inertia_tensor = inertia_tensor;
        self.inverse_inertia_tensor = Self::invert(self.mass, &inertia_tensor);
    }

    /// Express in another frame: `R · I · Rᵗ`.
    #[must_use]
    pub fn rotated<G: CoordinateSystem>(&self, rotation: &RotationQuaternion<G, F>) -> MassMoments<G> {
        let r = rotation.to_matrix();
        let rt = r.transpose();
        MassMoments {
            mass: self.mass,
            inertia_tensor: r * self.inertia_tensor * rt,
            inverse_inertia_tensor: r * self.inverse_inertia_tensor * rt,
        }
    }

    /// Check that these mass moments describe a physical body.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidMassProperties`] if the mass is `NaN`,
    /// negative or zero, or if the inertia tensor is not finite, not
    /// symmetric, not positive definite or violates the triangle inequality
    /// of principal moments.
    pub fn validate(&self) -> Result<()> {
        if self.mass.is_nan() || self.mass <= 0.0 {
            return Err(SimError::invalid_mass(format!(
                "mass must be positive, got {}",
                self.mass
            )));
        }

        if self.is_immovable() {
            return Ok(());
        }

        let tensor = self.inertia_tensor.inner();
        if !self.inertia_tensor.is_finite() {
            return Err(SimError::invalid_mass("inertia tensor must be finite"));
        }

        let scale = tensor.abs().max().max(f64::MIN_POSITIVE);
        if (tensor - tensor.transpose()).abs().max() > SYMMETRY_TOLERANCE * scale {
            return Err(SimError::invalid_mass("inertia tensor must be symmetric"));
        }

        let eigenvalues = tensor.symmetric_eigenvalues();
        if eigenvalues.iter().any(|&e| e <= 0.0) {
            return Err(SimError::invalid_mass(
                "inertia tensor must be positive definite",
            ));
        }

        let (a, b, c) = (eigenvalues[0], eigenvalues[1], eigenvalues[2]);
        let slack = SYMMETRY_TOLERANCE * scale;
        if a + b + slack < c || a + c + slack < b || b + c + slack < a {
            return Err(SimError::invalid_mass(
                "principal moments violate the triangle inequality",
            ));
        }

        Ok(())
    }

    fn invert(mass: f64, tensor: &SpaceMatrix<F, F>) -> SpaceMatrix<F, F> {
        if mass == f64::INFINITY {
            return SpaceMatrix::zeros();
        }
        tensor
            .try_inverse()
            .filter(SpaceMatrix::is_finite)
            .unwrap_or_else(SpaceMatrix::zeros)
    }
}

// ============================================================================
// MassMomentsAtArm
// ============================================================================

/// Mass moments of a part together with the position of its center of mass.
///
/// Parts combine with `+`, which shifts each inertia tensor to the combined
/// center of mass with the parallel axis theorem.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct MassMomentsAtArm<F: CoordinateSystem> {
    /// Mass and inertia about the part's own center of mass.
    pub mass_moments: MassMoments<F>,
    /// Center of mass of the part.
    pub center_of_mass: SpaceVector<F>,
}

impl<F: CoordinateSystem> MassMomentsAtArm<F> {
    /// Create mass moments at an arm.
    #[must_use]
    pub fn new(mass_moments: MassMoments<F>, center_of_mass: SpaceVector<F>) -> Self {
        Self {
            mass_moments,
            center_of_mass,
        }
    }

    /// Point mass at `position`.
    #[must_use]
    pub fn point_mass(mass: f64, position: SpaceVector<F>) -> Self {
        Self {
            mass_moments: MassMoments {
                mass,
                inertia_tensor: SpaceMatrix::zeros(),
                inverse_inertia_tensor: SpaceMatrix::zeros(),
            },
            center_of_mass: position,
        }
    }

    /// Inertia tensor about an arbitrary point.
    ///
    /// `I_p = I_com + m · (|d|² E − d dᵗ)` with `d = com − point`.
    #[must_use]
    pub fn inertia_tensor_about(&self, point: SpaceVector<F>) -> SpaceMatrix<F, F> {
        let d = self.center_of_mass - point;
        let m = self.mass_moments.mass();
        let shift = SpaceMatrix::from_inner(Matrix3::identity() * d.norm_squared()) - d.outer(&d);
        self.mass_moments.inertia_tensor() + shift * m
    }
}

impl<F: CoordinateSystem> Add for MassMomentsAtArm<F> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let m1 = self.mass_moments.mass();
        let m2 = rhs.mass_moments.mass();
        let mass = m1 + m2;
        let center_of_mass = if mass > 0.0 {
            (self.center_of_mass * m1 + rhs.center_of_mass * m2) / mass
        } else {
            SpaceVector::zeros()
        };
        let inertia =
            self.inertia_tensor_about(center_of_mass) + rhs.inertia_tensor_about(center_of_mass);

        Self::new(MassMoments::new(mass, inertia), center_of_mass)
    }
}
