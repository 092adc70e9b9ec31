//! Frame-tagged vectors, matrices and rotations.
//!
//! These are thin wrappers around `nalgebra` types. The wrapper adds nothing
//! at runtime; it only records, in the type, which frame the numbers are
//! expressed in.
//!
//! ```
//! use rigid_types::{BodyCom, RotationQuaternion, SpaceVector, WorldSpace};
//!
//! let body_to_world = RotationQuaternion::<WorldSpace, BodyCom>::from_axis_angle(
//!     SpaceVector::new(0.0, 0.0, 1.0),
//!     std::f64::consts::FRAC_PI_2,
//! );
//! let x_body = SpaceVector::<BodyCom>::new(1.0, 0.0, 0.0);
//! let x_world: SpaceVector<WorldSpace> = body_to_world * x_body;
//!
//! assert!((x_world.y() - 1.0).abs() < 1e-12);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::{Matrix3, Unit, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::CoordinateSystem;

// ============================================================================
// SpaceVector
// ============================================================================

/// A 3-vector expressed in frame `F`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct SpaceVector<F> {
    inner: Vector3<f64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    _frame: PhantomData<fn() -> F>,
}

impl<F: CoordinateSystem> SpaceVector<F> {
    /// Create a vector from components.
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_inner(Vector3::new(x, y, z))
    }

    /// Wrap an untagged vector.
    #[must_use]
    pub fn from_inner(inner: Vector3<f64>) -> Self {
        Self {
            inner,
            _frame: PhantomData,
        }
    }

    /// The zero vector.
    #[must_use]
    pub fn zeros() -> Self {
        Self::from_inner(Vector3::zeros())
    }

    /// Unit X axis.
    #[must_use]
    pub fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Unit Y axis.
    #[must_use]
    pub fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Unit Z axis.
    #[must_use]
    pub fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// X component.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.inner.x
    }

    /// Y component.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.inner.y
    }

    /// Z component.
    #[must_use]
    pub fn z(&self) -> f64 {
        self.inner.z
    }

    /// Borrow the untagged vector.
    #[must_use]
    pub fn inner(&self) -> &Vector3<f64> {
        &self.inner
    }

    /// Drop the frame tag.
    #[must_use]
    pub fn into_inner(self) -> Vector3<f64> {
        self.inner
    }

    /// Reinterpret this vector as expressed in another frame.
    ///
    /// No conversion happens; use only where the two frames are known to
    /// coincide.
    #[must_use]
    pub fn reframe<G: CoordinateSystem>(self) -> SpaceVector<G> {
        SpaceVector::from_inner(self.inner)
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.inner.dot(&other.inner)
    }

    /// Cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self::from_inner(self.inner.cross(&other.inner))
    }

    /// Euclidean length.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.inner.norm()
    }

    /// Squared Euclidean length.
    #[must_use]
    pub fn norm_squared(&self) -> f64 {
        self.inner.norm_squared()
    }

    /// Unit vector in the same direction.
    ///
    /// Returns `NaN` components for the zero vector; see [`Self::try_normalize`].
    #[must_use]
    pub fn normalize(&self) -> Self {
        Self::from_inner(self.inner.normalize())
    }

    /// Unit vector in the same direction, or `None` if the length is below `min_norm`.
    #[must_use]
    pub fn try_normalize(&self, min_norm: f64) -> Option<Self> {
        self.inner.try_normalize(min_norm).map(Self::from_inner)
    }

    /// True when every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|c| c.is_finite())
    }

    /// Some unit vector perpendicular to this one.
    ///
    /// Picks the reference axis least aligned with `self`, so the result is
    /// well conditioned for any non-zero input.
    #[must_use]
    pub fn any_perpendicular(&self) -> Self {
        let reference = if self.inner.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        Self::from_inner(self.inner.cross(&reference).normalize())
    }

    /// Skew-symmetric matrix `[v]×` such that `[v]× · w == v × w`.
    #[must_use]
    pub fn cross_matrix(&self) -> SpaceMatrix<F, F> {
        SpaceMatrix::from_inner(self.inner.cross_matrix())
    }

    /// Outer product `self · otherᵗ`.
    #[must_use]
    pub fn outer(&self, other: &Self) -> SpaceMatrix<F, F> {
        SpaceMatrix::from_inner(self.inner * other.inner.transpose())
    }
}

impl<F: CoordinateSystem> Default for SpaceVector<F> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<F: CoordinateSystem> fmt::Display for SpaceVector<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}] ({})",
            self.inner.x,
            self.inner.y,
            self.inner.z,
            F::NAME
        )
    }
}

impl<F: CoordinateSystem> Add for SpaceVector<F> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_inner(self.inner + rhs.inner)
    }
}

impl<F: CoordinateSystem> Sub for SpaceVector<F> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_inner(self.inner - rhs.inner)
    }
}

impl<F: CoordinateSystem> Neg for SpaceVector<F> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_inner(-self.inner)
    }
}

impl<F: CoordinateSystem> Mul<f64> for SpaceVector<F> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::from_inner(self.inner * rhs)
    }
}

impl<F: CoordinateSystem> Mul<SpaceVector<F>> for f64 {
    type Output = SpaceVector<F>;

    fn mul(self, rhs: SpaceVector<F>) -> SpaceVector<F> {
        rhs * self
    }
}

impl<F: CoordinateSystem> Div<f64> for SpaceVector<F> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::from_inner(self.inner / rhs)
    }
}

impl<F: CoordinateSystem> AddAssign for SpaceVector<F> {
    fn add_assign(&mut self, rhs: Self) {
        self.inner += rhs.inner;
    }
}

impl<F: CoordinateSystem> SubAssign for SpaceVector<F> {
    fn sub_assign(&mut self, rhs: Self) {
        self.inner -= rhs.inner;
    }
}

impl<F: CoordinateSystem> MulAssign<f64> for SpaceVector<F> {
    fn mul_assign(&mut self, rhs: f64) {
        self.inner *= rhs;
    }
}

impl<F: CoordinateSystem> std::iter::Sum for SpaceVector<F> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zeros(), |acc, v| acc + v)
    }
}

// ============================================================================
// SpaceMatrix
// ============================================================================

/// A 3×3 matrix mapping vectors in frame `From` to vectors in frame `To`.
///
/// Inertia tensors are `SpaceMatrix<F, F>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct SpaceMatrix<To, From> {
    inner: Matrix3<f64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    _frames: PhantomData<fn() -> (To, From)>,
}

impl<To: CoordinateSystem, From: CoordinateSystem> SpaceMatrix<To, From> {
    /// Wrap an untagged matrix.
    #[must_use]
    pub fn from_inner(inner: Matrix3<f64>) -> Self {
        Self {
            inner,
            _frames: PhantomData,
        }
    }

    /// The identity matrix.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_inner(Matrix3::identity())
    }

    /// The zero matrix.
    #[must_use]
    pub fn zeros() -> Self {
        Self::from_inner(Matrix3::zeros())
    }

    /// Diagonal matrix.
    #[must_use]
    pub fn from_diagonal(xx: f64, yy: f64, zz: f64) -> Self {
        Self::from_inner(Matrix3::from_diagonal(&Vector3::new(xx, yy, zz)))
    }

    /// Borrow the untagged matrix.
    #[must_use]
    pub fn inner(&self) -> &Matrix3<f64> {
        &self.inner
    }

    /// Drop the frame tags.
    #[must_use]
    pub fn into_inner(self) -> Matrix3<f64> {
        self.inner
    }

    /// Transpose, swapping the frame tags.
    #[must_use]
    pub fn transpose(&self) -> SpaceMatrix<From, To> {
        SpaceMatrix::from_inner(self.inner.transpose())
    }

    /// Inverse, or `None` if singular.
    #[must_use]
    pub fn try_inverse(&self) -> Option<SpaceMatrix<From, To>> {
        self.inner.try_inverse().map(SpaceMatrix::from_inner)
    }

    /// True when every element is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|c| c.is_finite())
    }
}

impl<To: CoordinateSystem, From: CoordinateSystem> Mul<SpaceVector<From>>
    for SpaceMatrix<To, From>
{
    type Output = SpaceVector<To>;

    fn mul(self, rhs: SpaceVector<From>) -> SpaceVector<To> {
        SpaceVector::from_inner(self.inner * rhs.inner)
    }
}

impl<A: CoordinateSystem, B: CoordinateSystem, C: CoordinateSystem> Mul<SpaceMatrix<B, C>>
    for SpaceMatrix<A, B>
{
    type Output = SpaceMatrix<A, C>;

    fn mul(self, rhs: SpaceMatrix<B, C>) -> SpaceMatrix<A, C> {
        SpaceMatrix::from_inner(self.inner * rhs.inner)
    }
}

impl<To: CoordinateSystem, From: CoordinateSystem> Mul<f64> for SpaceMatrix<To, From> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::from_inner(self.inner * rhs)
    }
}

impl<To: CoordinateSystem, From: CoordinateSystem> Add for SpaceMatrix<To, From> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_inner(self.inner + rhs.inner)
    }
}

impl<To: CoordinateSystem, From: CoordinateSystem> Sub for SpaceMatrix<To, From> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_inner(self.inner - rhs.inner)
    }
}

// ============================================================================
// RotationQuaternion
// ============================================================================

/// A rotation taking vectors expressed in `From` to vectors expressed in `To`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct RotationQuaternion<To, From> {
    inner: UnitQuaternion<f64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    _frames: PhantomData<fn() -> (To, From)>,
}

impl<To: CoordinateSystem, From: CoordinateSystem> RotationQuaternion<To, From> {
    /// Wrap an untagged unit quaternion.
    #[must_use]
    pub fn from_inner(inner: UnitQuaternion<f64>) -> Self {
        Self {
            inner,
            _frames: PhantomData,
        }
    }

    /// The identity rotation.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_inner(UnitQuaternion::identity())
    }

    /// Rotation by `angle` radians about `axis` (expressed in the target frame).
    ///
    /// A zero axis gives the identity.
    #[must_use]
    pub fn from_axis_angle(axis: SpaceVector<To>, angle: f64) -> Self {
        Unit::try_new(axis.into_inner(), f64::EPSILON).map_or_else(Self::identity, |axis| {
            Self::from_inner(UnitQuaternion::from_axis_angle(&axis, angle))
        })
    }

    /// Rotation from a rotation vector (axis scaled by angle in radians).
    #[must_use]
    pub fn from_rotation_vector(rotation: SpaceVector<To>) -> Self {
        Self::from_inner(UnitQuaternion::from_scaled_axis(rotation.into_inner()))
    }

    /// Borrow the untagged quaternion.
    #[must_use]
    pub fn inner(&self) -> &UnitQuaternion<f64> {
        &self.inner
    }

    /// Drop the frame tags.
    #[must_use]
    pub fn into_inner(self) -> UnitQuaternion<f64> {
        self.inner
    }

    /// Inverse rotation.
    #[must_use]
    pub fn inverse(&self) -> RotationQuaternion<From, To> {
        RotationQuaternion::from_inner(self.inner.inverse())
    }

    /// Rotation vector (axis scaled by angle, angle in `[0, π]`).
    #[must_use]
    pub fn rotation_vector(&self) -> SpaceVector<To> {
        SpaceVector::from_inner(self.inner.scaled_axis())
    }

    /// Rotation angle in radians, in `[0, π]`.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.inner.angle()
    }

    /// Rotation matrix.
    #[must_use]
    pub fn to_matrix(&self) -> SpaceMatrix<To, From> {
        SpaceMatrix::from_inner(*self.inner.to_rotation_matrix().matrix())
    }

    /// Re-normalize to counter floating-point drift.
    pub fn renormalize(&mut self) {
        self.inner.renormalize();
    }

    /// Reinterpret the frame tags without changing the rotation.
    #[must_use]
    pub fn reframe<NewTo: CoordinateSystem, NewFrom: CoordinateSystem>(
        self,
    ) -> RotationQuaternion<NewTo, NewFrom> {
        RotationQuaternion::from_inner(self.inner)
    }

    /// True when every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.inner.coords.iter().all(|c| c.is_finite())
    }
}

impl<To: CoordinateSystem, From: CoordinateSystem> Default for RotationQuaternion<To, From> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<To: CoordinateSystem, From: CoordinateSystem> Mul<SpaceVector<From>>
    for RotationQuaternion<To, From>
{
    type Output = SpaceVector<To>;

    fn mul(self, rhs: SpaceVector<From>) -> SpaceVector<To> {
        SpaceVector::from_inner(self.inner * rhs.inner)
    }
}

impl<A: CoordinateSystem, B: CoordinateSystem, C: CoordinateSystem>
    Mul<RotationQuaternion<B, C>> for RotationQuaternion<A, B>
{
    type Output = RotationQuaternion<A, C>;

    fn mul(self, rhs: RotationQuaternion<B, C>) -> RotationQuaternion<A, C> {
        RotationQuaternion::from_inner(self.inner * rhs.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BodyCom, WorldSpace};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    type World = SpaceVector<WorldSpace>;

    #[test]
    fn test_vector_arithmetic() {
        let a = World::new(1.0, 2.0, 3.0);
        let b = World::new(4.0, 5.0, 6.0);

        assert_relative_eq!((a + b).x(), 5.0);
        assert_relative_eq!((b - a).z(), 3.0);
        assert_relative_eq!((2.0 * a).y(), 4.0);
        assert_relative_eq!((a / 2.0).z(), 1.5);
        assert_relative_eq!(a.dot(&b), 32.0);
        assert_relative_eq!(
            World::x_axis().cross(&World::y_axis()).into_inner(),
            World::z_axis().into_inner()
        );
    }

    #[test]
    fn test_cross_matrix_matches_cross_product() {
        let v = World::new(0.3, -1.2, 2.0);
        let w = World::new(-0.7, 0.4, 1.1);

        assert_relative_eq!(
            (v.cross_matrix() * w).into_inner(),
            v.cross(&w).into_inner(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_any_perpendicular() {
        for v in [World::x_axis(), World::new(0.2, 0.9, -0.4), World::z_axis()] {
            let p = v.any_perpendicular();
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(p.dot(&v), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotation_composition_and_inverse() {
        let q1 = RotationQuaternion::<WorldSpace, BodyCom>::from_axis_angle(
            World::z_axis(),
            FRAC_PI_2,
        );
        let v = SpaceVector::<BodyCom>::new(1.0, 0.0, 0.0);

        let w = q1 * v;
        assert_relative_eq!(w.into_inner(), World::y_axis().into_inner(), epsilon = 1e-12);

        let back: SpaceVector<BodyCom> = q1.inverse() * w;
        assert_relative_eq!(back.into_inner(), v.into_inner(), epsilon = 1e-12);

        let identity = q1.inverse() * q1;
        assert_relative_eq!(identity.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_matrix_agrees_with_quaternion() {
        let q = RotationQuaternion::<WorldSpace, BodyCom>::from_rotation_vector(World::new(
            0.1, -0.4, 0.7,
        ));
        let v = SpaceVector::<BodyCom>::new(0.5, 1.5, -2.0);

        assert_relative_eq!(
            (q.to_matrix() * v).into_inner(),
            (q * v).into_inner(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            q.rotation_vector().into_inner(),
            Vector3::new(0.1, -0.4, 0.7),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_zero_axis_gives_identity() {
        let q = RotationQuaternion::<WorldSpace, WorldSpace>::from_axis_angle(World::zeros(), 1.0);
        assert_relative_eq!(q.angle(), 0.0);
    }

    #[test]
    fn test_matrix_inverse() {
        let m = SpaceMatrix::<WorldSpace, WorldSpace>::from_diagonal(2.0, 4.0, 8.0);
        let inv = m.try_inverse().unwrap_or_else(SpaceMatrix::zeros);
        assert_relative_eq!(inv.inner()[(2, 2)], 0.125);
        assert!(SpaceMatrix::<WorldSpace, WorldSpace>::zeros()
            .try_inverse()
            .is_none());
    }
}
