//! Position and orientation of one frame inside another.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::CoordinateSystem;
use crate::space::{RotationQuaternion, SpaceVector};

/// Placement of frame `Body` inside frame `Base`.
///
/// `position` is the origin of `Body` expressed in `Base`; the rotation maps
/// `Body` vectors to `Base` vectors.
///
/// *Bound* transforms act on points and apply both rotation and translation.
/// *Unbound* transforms act on free vectors (velocities, forces, axes) and
/// apply only the rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Placement<Base, Body> {
    position: SpaceVector<Base>,
    body_to_base: RotationQuaternion<Base, Body>,
}

impl<Base: CoordinateSystem, Body: CoordinateSystem> Placement<Base, Body> {
    /// Create a placement from position and body-to-base rotation.
    #[must_use]
    pub fn new(position: SpaceVector<Base>, body_to_base: RotationQuaternion<Base, Body>) -> Self {
        Self {
            position,
            body_to_base,
        }
    }

    /// Placement with coinciding frames.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(SpaceVector::zeros(), RotationQuaternion::identity())
    }

    /// Placement at `position` with axes aligned to the base frame.
    #[must_use]
    pub fn from_position(position: SpaceVector<Base>) -> Self {
        Self::new(position, RotationQuaternion::identity())
    }

    /// Origin of the body frame in base coordinates.
    #[must_use]
    pub fn position(&self) -> SpaceVector<Base> {
        self.position
    }

    /// Rotation from body to base coordinates.
    #[must_use]
    pub fn body_to_base(&self) -> RotationQuaternion<Base, Body> {
        self.body_to_base
    }

    /// Rotation from base to body coordinates.
    #[must_use]
    pub fn base_to_body(&self) -> RotationQuaternion<Body, Base> {
        self.body_to_base.inverse()
    }

    /// Set the origin of the body frame.
    pub fn set_position(&mut self, position: SpaceVector<Base>) {
        self.position = position;
    }

    /// Set the body-to-base rotation.
    pub fn set_body_to_base(&mut self, rotation: RotationQuaternion<Base, Body>) {
        self.body_to_base = rotation;
    }

    /// Point in body coordinates to base coordinates.
    #[must_use]
    pub fn bound_transform_to_base(&self, point: SpaceVector<Body>) -> SpaceVector<Base> {
        self.body_to_base * point + self.position
    }

    /// Point in base coordinates to body coordinates.
    #[must_use]
    pub fn bound_transform_to_body(&self, point: SpaceVector<Base>) -> SpaceVector<Body> {
        self.base_to_body() * (point - self.position)
    }

    /// Free vector in body coordinates to base coordinates.
    #[must_use]
    pub fn unbound_transform_to_base(&self, vector: SpaceVector<Body>) -> SpaceVector<Base> {
        self.body_to_base * vector
    }

    /// Free vector in base coordinates to body coordinates.
    #[must_use]
    pub fn unbound_transform_to_body(&self, vector: SpaceVector<Base>) -> SpaceVector<Body> {
        self.base_to_body() * vector
    }

    /// Move the body frame by `translation`.
    pub fn translate(&mut self, translation: SpaceVector<Base>) {
        self.position += translation;
    }

    /// Rotate the body frame about its own origin.
    ///
    /// `rotation` is expressed in the base frame.
    pub fn rotate_body_frame(&mut self, rotation: RotationQuaternion<Base, Base>) {
        self.body_to_base = rotation * self.body_to_base;
    }

    /// Rotate the body frame about the base origin.
    pub fn rotate_base_frame(&mut self, rotation: RotationQuaternion<Base, Base>) {
        self.position = rotation * self.position;
        self.rotate_body_frame(rotation);
    }

    /// Rotate the body frame about an arbitrary point in base coordinates.
    pub fn rotate_about(&mut self, point: SpaceVector<Base>, rotation: RotationQuaternion<Base, Base>) {
        self.position = rotation * (self.position - point) + point;
        self.rotate_body_frame(rotation);
    }

    /// Re-orthonormalize the rotation.
    pub fn renormalize(&mut self) {
        self.body_to_base.renormalize();
    }

    /// Placement of the base frame inside the body frame.
    #[must_use]
    pub fn inverse(&self) -> Placement<Body, Base> {
        let base_to_body = self.base_to_body();
        Placement::new(-(base_to_body * self.position), base_to_body)
    }

    /// Chain with a placement of `Inner` inside `Body`.
    #[must_use]
    pub fn compose<Inner: CoordinateSystem>(
        &self,
        inner: &Placement<Body, Inner>,
    ) -> Placement<Base, Inner> {
        Placement::new(
            self.bound_transform_to_base(inner.position),
            self.body_to_base * inner.body_to_base,
        )
    }

    /// True when position and rotation are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.body_to_base.is_finite()
    }
}

impl<Base: CoordinateSystem, Body: CoordinateSystem> Default for Placement<Base, Body> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<Base: CoordinateSystem, Body: CoordinateSystem> fmt::Display for Placement<Base, Body> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}, rotated {:.6} rad",
            Body::NAME,
            self.position,
            self.body_to_base.angle()
        )
    }
}
