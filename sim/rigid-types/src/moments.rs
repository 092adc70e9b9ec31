//! Velocity, acceleration and force moments.
//!
//! Each type pairs a linear and an angular quantity expressed in one frame.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::CoordinateSystem;
use crate::space::{RotationQuaternion, SpaceVector};

// ============================================================================
// VelocityMoments
// ============================================================================

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct VelocityMoments<F: CoordinateSystem> {
    /// Linear velocity of the reference point (m/s).
    pub velocity: SpaceVector<F>,
    /// Angular velocity (rad/s).
    pub angular_velocity: SpaceVector<F>,
}

impl<F: CoordinateSystem> VelocityMoments<F> {
    /// Create velocity moments.
    #[must_use]
    pub fn new(velocity: SpaceVector<F>, angular_velocity: SpaceVector<F>) -> Self {
        Self {
            velocity,
            angular_velocity,
        }
    }

    /// At rest.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(SpaceVector::zeros(), SpaceVector::zeros())
    }

    /// Velocity of a point rigidly attached at `arm` from the reference point.
    ///
    /// `v + ω × r`
    #[must_use]
    pub fn velocity_at(&self, arm: SpaceVector<F>) -> SpaceVector<F> {
        self.velocity + self.angular_velocity.cross(&arm)
    }

    /// Express in another frame.
    #[must_use]
    pub fn rotated<G: CoordinateSystem>(&self, rotation: &RotationQuaternion<G, F>) -> VelocityMoments<G> {
        VelocityMoments::new(*rotation * self.velocity, *rotation * self.angular_velocity)
    }

    /// True when both components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.velocity.is_finite() && self.angular_velocity.is_finite()
    }
}

impl<F: CoordinateSystem> Add for VelocityMoments<F> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.velocity + rhs.velocity,
            self.angular_velocity + rhs.angular_velocity,
        )
    }
}

impl<F: CoordinateSystem> Sub for VelocityMoments<F> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.velocity - rhs.velocity,
            self.angular_velocity - rhs.angular_velocity,
        )
    }
}

// ============================================================================
// AccelerationMoments
// ============================================================================

/// Linear and angular acceleration of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct AccelerationMoments<F: CoordinateSystem> {
    /// Linear acceleration (m/s²).
    pub acceleration: SpaceVector<F>,
    /// Angular acceleration (rad/s²).
    pub angular_acceleration: SpaceVector<F>,
}

impl<F: CoordinateSystem> AccelerationMoments<F> {
    /// Create acceleration moments.
    #[must_use]
    pub fn new(acceleration: SpaceVector<F>, angular_acceleration: SpaceVector<F>) -> Self {
        Self {
            acceleration,
            angular_acceleration,
        }
    }

    /// No acceleration.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(SpaceVector::zeros(), SpaceVector::zeros())
    }

    /// Velocity change over `dt`.
    #[must_use]
    pub fn integrate(&self, dt: f64) -> VelocityMoments<F> {
        VelocityMoments::new(self.acceleration * dt, self.angular_acceleration * dt)
    }
}

// ============================================================================
// ForceMoments
// ============================================================================

/// Force and torque acting on a body, torque taken about its center of mass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct ForceMoments<F: CoordinateSystem> {
    /// Force (N).
    pub force: SpaceVector<F>,
    /// Torque (N·m).
    pub torque: SpaceVector<F>,
}

impl<F: CoordinateSystem> ForceMoments<F> {
    /// Create force moments.
    #[must_use]
    pub fn new(force: SpaceVector<F>, torque: SpaceVector<F>) -> Self {
        Self { force, torque }
    }

    /// No force, no torque.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(SpaceVector::zeros(), SpaceVector::zeros())
    }

    /// Pure force through the reference point.
    #[must_use]
    pub fn from_force(force: SpaceVector<F>) -> Self {
        Self::new(force, SpaceVector::zeros())
    }

    /// Pure torque.
    #[must_use]
    pub fn from_torque(torque: SpaceVector<F>) -> Self {
        Self::new(SpaceVector::zeros(), torque)
    }

    /// Express in another frame.
    #[must_use]
    pub fn rotated<G: CoordinateSystem>(&self, rotation: &RotationQuaternion<G, F>) -> ForceMoments<G> {
        ForceMoments::new(*rotation * self.force, *rotation * self.torque)
    }

    /// True when both components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.force.is_finite() && self.torque.is_finite()
    }

    /// Larger of the force and torque magnitudes.
    ///
    /// Used as a convergence measure for iterated solving.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.force.norm().max(self.torque.norm())
    }
}

impl<F: CoordinateSystem> Add for ForceMoments<F> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.force + rhs.force, self.torque + rhs.torque)
    }
}

impl<F: CoordinateSystem> Sub for ForceMoments<F> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.force - rhs.force, self.torque - rhs.torque)
    }
}

impl<F: CoordinateSystem> Neg for ForceMoments<F> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.force, -self.torque)
    }
}

impl<F: CoordinateSystem> Mul<f64> for ForceMoments<F> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.force * rhs, self.torque * rhs)
    }
}

impl<F: CoordinateSystem> AddAssign for ForceMoments<F> {
    fn add_assign(&mut self, rhs: Self) {
        self.force += rhs.force;
        self.torque += rhs.torque;
    }
}

impl<F: CoordinateSystem> SubAssign for ForceMoments<F> {
    fn sub_assign(&mut self, rhs: Self) {
        self.force -= rhs.force;
        self.torque -= rhs.torque;
    }
}

impl<F: CoordinateSystem> std::iter::Sum for ForceMoments<F> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, fm| acc + fm)
    }
}

// ============================================================================
// Wrench
// ============================================================================

/// Force moments together with the point they act at.
///
/// `position` is the application point relative to the center of mass of the
/// body the wrench is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Wrench<F: CoordinateSystem> {
    /// Force and torque at the application point.
    pub force_moments: ForceMoments<F>,
    /// Application point relative to the center of mass (m).
    pub position: SpaceVector<F>,
}

impl<F: CoordinateSystem> Wrench<F> {
    /// Create a wrench.
    #[must_use]
    pub fn new(force_moments: ForceMoments<F>, position: SpaceVector<F>) -> Self {
        Self {
            force_moments,
            position,
        }
    }

    /// A force acting at `position`.
    #[must_use]
    pub fn force_at(force: SpaceVector<F>, position: SpaceVector<F>) -> Self {
        Self::new(ForceMoments::from_force(force), position)
    }

    /// Equivalent force moments about the center of mass.
    ///
    /// The torque gains the moment of the force about the center of mass:
    /// `τ + r × F`.
    #[must_use]
    pub fn resultant_force_moments(&self) -> ForceMoments<F> {
        let fm = &self.force_moments;
        ForceMoments::new(fm.force, fm.torque + self.position.cross(&fm.force))
    }

    /// Sum of wrenches acting at different points, about the center of mass.
    #[must_use]
    pub fn resultant<'a, I>(wrenches: I) -> ForceMoments<F>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        wrenches
            .into_iter()
            .map(Self::resultant_force_moments)
            .sum()
    }
}

impl<F: CoordinateSystem> From<ForceMoments<F>> for Wrench<F> {
    fn from(force_moments: ForceMoments<F>) -> Self {
        Self::new(force_moments, SpaceVector::zeros())
    }
}
