//! Geometry of a hinge between two bodies.

use rigid_types::{BodyCom, BodyId, Result, SimError, SpaceVector, WorldSpace};

use crate::precomputation::{FixedOrientationHelper, Precomputation, StepCache};
use crate::state::{BodyRef, BodyState};

type W = SpaceVector<WorldSpace>;

/// Anchor point and hinge axis in one body's center-of-mass frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointFrame {
    /// Attachment point (m).
    pub anchor: SpaceVector<BodyCom>,
    /// Hinge axis; need not be normalized.
    pub axis: SpaceVector<BodyCom>,
}

impl JointFrame {
    /// Create a joint frame.
    #[must_use]
    pub fn new(anchor: SpaceVector<BodyCom>, axis: SpaceVector<BodyCom>) -> Self {
        Self { anchor, axis }
    }
}

/// Hinge geometry for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HingeData {
    /// Body 1 center of mass.
    pub x1: W,
    /// Body 2 center of mass.
    pub x2: W,
    /// Body 1 arm, center of mass to anchor.
    pub r1: W,
    /// Body 2 arm, center of mass to anchor.
    pub r2: W,
    /// Separation of the two anchors, `x2 + r2 − x1 − r1`.
    pub u: W,
    /// Hinge axis attached to body 1 (unit).
    pub a1: W,
    /// Hinge axis attached to body 2 (unit).
    pub a2: W,
    /// Unit vector perpendicular to `a1`.
    pub t1: W,
    /// `a1 × t1`.
    pub t2: W,
    /// Signed rotation of body 2 about `a1` since assembly (rad).
    pub angle: f64,
    /// Relative angular velocity of body 2 about `a1` (rad/s).
    pub angular_velocity: f64,
}

/// Precomputed hinge geometry shared by hinge, motor, spring, servo and
/// angular limits constraints.
#[derive(Debug, Clone)]
pub struct HingePrecomputation {
    body_1: BodyId,
    body_2: BodyId,
    frame_1: JointFrame,
    frame_2: JointFrame,
    orientation: FixedOrientationHelper,
    cache: StepCache<HingeData>,
}

impl HingePrecomputation {
    /// Hinge from an anchor and axis given in each body's own frame.
    ///
    /// The hinge angle is measured from the bodies' current relative
    /// orientation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] if both bodies are the same or
    /// an axis is zero or not finite.
    pub fn new(
        body_1: BodyRef<'_>,
        frame_1: JointFrame,
        body_2: BodyRef<'_>,
        frame_2: JointFrame,
    ) -> Result<Self> {
        if body_1.id == body_2.id {
            return Err(SimError::invalid_constraint(format!(
                "hinge connects {} to itself",
                body_1.id
            )));
        }

        let frame_1 = normalized_frame(frame_1)?;
        let frame_2 = normalized_frame(frame_2)?;

        Ok(Self {
            body_1: body_1.id,
            body_2: body_2.id,
            frame_1,
            frame_2,
            orientation: FixedOrientationHelper::new(
                &body_1.placement.body_to_base(),
                &body_2.placement.body_to_base(),
            ),
            cache: StepCache::new(),
        })
    }

    /// Hinge along the line through two points of body 1.
    ///
    /// The anchor is `point_a`; the axis runs from `point_a` to `point_b`.
    pub fn from_body_1_points(
        body_1: BodyRef<'_>,
        body_2: BodyRef<'_>,
        point_a: SpaceVector<BodyCom>,
        point_b: SpaceVector<BodyCom>,
    ) -> Result<Self> {
        let anchor_world = body_1.placement.bound_transform_to_base(point_a);
        let axis_world = body_1.placement.unbound_transform_to_base(point_b - point_a);

        Self::new(
            body_1,
            JointFrame::new(point_a, point_b - point_a),
            body_2,
            JointFrame::new(
                body_2.placement.bound_transform_to_body(anchor_world),
                body_2.placement.unbound_transform_to_body(axis_world),
            ),
        )
    }

    /// Hinge along the line through two world-space points.
    pub fn from_world_points(
        body_1: BodyRef<'_>,
        body_2: BodyRef<'_>,
        point_a: W,
        point_b: W,
    ) -> Result<Self> {
        Self::from_world(body_1, body_2, point_a, point_b - point_a)
    }

    /// Hinge through a world-space anchor along a world-space axis.
    pub fn from_world(body_1: BodyRef<'_>, body_2: BodyRef<'_>, anchor: W, axis: W) -> Result<Self> {
        let frame = |body: &BodyRef<'_>| {
            JointFrame::new(
                body.placement.bound_transform_to_body(anchor),
                body.placement.unbound_transform_to_body(axis),
            )
        };

        Self::new(body_1, frame(&body_1), body_2, frame(&body_2))
    }

    /// Anchor and unit axis in body 1's frame.
    #[must_use]
    pub fn frame_1(&self) -> &JointFrame {
        &self.frame_1
    }

    /// Anchor and unit axis in body 2's frame.
    #[must_use]
    pub fn frame_2(&self) -> &JointFrame {
        &self.frame_2
    }

    /// Snapshot of the assembly-time relative orientation.
    #[must_use]
    pub fn orientation(&self) -> &FixedOrientationHelper {
        &self.orientation
    }
}

impl Precomputation for HingePrecomputation {
    type Data = HingeData;

    fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_1, self.body_2)
    }

    fn compute(&mut self, step: u64, body_1: &BodyState, body_2: &BodyState) {
        let pl_1 = &body_1.placement;
        let pl_2 = &body_2.placement;
        let x1 = pl_1.position();
        let x2 = pl_2.position();
        let r1 = pl_1.unbound_transform_to_base(self.frame_1.anchor);
        let r2 = pl_2.unbound_transform_to_base(self.frame_2.anchor);
        let a1 = pl_1.unbound_transform_to_base(self.frame_1.axis);
        let a2 = pl_2.unbound_transform_to_base(self.frame_2.axis);
        let t1 = a1.any_perpendicular();
        let t2 = a1.cross(&t1);

        let rotation_error = self
            .orientation
            .rotation_error(&pl_1.body_to_base(), &pl_2.body_to_base());
        let relative_omega =
            body_2.velocity_moments.angular_velocity - body_1.velocity_moments.angular_velocity;

        self.cache.store(
            step,
            HingeData {
                x1,
                x2,
                r1,
                r2,
                u: x2 + r2 - x1 - r1,
                a1,
                a2,
                t1,
                t2,
                angle: rotation_error.dot(&a1),
                angular_velocity: relative_omega.dot(&a1),
            },
        );
    }

    fn data(&self, step: u64) -> Result<&HingeData> {
        self.cache.get(step)
    }
}

fn normalized_frame(frame: JointFrame) -> Result<JointFrame> {
    if !frame.anchor.is_finite() || !frame.axis.is_finite() {
        return Err(SimError::invalid_constraint("hinge frame is not finite"));
    }
    let axis = frame
        .axis
        .try_normalize(1e-12)
        .ok_or_else(|| SimError::invalid_constraint("hinge axis is zero"))?;
    Ok(JointFrame::new(frame.anchor, axis))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigid_types::{MassMoments, Placement, RotationQuaternion, VelocityMoments};

    fn placement(x: f64) -> Placement<WorldSpace, BodyCom> {
        Placement::from_position(SpaceVector::new(x, 0.0, 0.0))
    }

    fn state(placement: Placement<WorldSpace, BodyCom>, omega: W) -> BodyState {
        BodyState::new(
            placement,
            VelocityMoments::new(W::zeros(), omega),
            &MassMoments::sphere(1.0, 0.1),
        )
    }

    #[test]
    fn test_world_hinge_geometry() {
        let pl_1 = placement(0.0);
        let pl_2 = placement(2.0);
        let mut hinge = HingePrecomputation::from_world(
            BodyRef::new(BodyId::new(0), &pl_1),
            BodyRef::new(BodyId::new(1), &pl_2),
            W::new(1.0, 0.0, 0.0),
            W::new(0.0, 0.0, 3.0),
        )
        .unwrap();

        hinge.compute(7, &state(pl_1, W::zeros()), &state(pl_2, W::new(0.0, 0.0, 0.5)));
        let data = hinge.data(7).unwrap();

        assert_relative_eq!(data.r1.x(), 1.0);
        assert_relative_eq!(data.r2.x(), -1.0);
        assert_relative_eq!(data.u.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(data.a1.z(), 1.0);
        assert_relative_eq!(data.t1.dot(&data.a1), 0.0, epsilon = 1e-12);
        assert_relative_eq!(data.t2.dot(&data.t1), 0.0, epsilon = 1e-12);
        assert_relative_eq!(data.angle, 0.0, epsilon = 1e-12);
        assert_relative_eq!(data.angular_velocity, 0.5);
    }

    #[test]
    fn test_angle_is_signed() {
        let pl_1 = placement(0.0);
        let pl_2 = placement(1.0);
        let mut hinge = HingePrecomputation::from_world(
            BodyRef::new(BodyId::new(0), &pl_1),
            BodyRef::new(BodyId::new(1), &pl_2),
            W::new(0.5, 0.0, 0.0),
            W::z_axis(),
        )
        .unwrap();

        for angle in [0.3, -0.3] {
            let mut turned = pl_2;
            turned.rotate_about(
                W::new(0.5, 0.0, 0.0),
                RotationQuaternion::from_axis_angle(W::z_axis(), angle),
            );
            hinge.compute(1, &state(pl_1, W::zeros()), &state(turned, W::zeros()));
            let data = hinge.data(1).unwrap();

            assert_relative_eq!(data.angle, angle, epsilon = 1e-12);
            // Rotating about the anchor keeps the anchors together
            assert_relative_eq!(data.u.norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_body_1_points_agree_with_world_points() {
        let pl_1 = Placement::new(
            W::new(0.0, 1.0, 0.0),
            RotationQuaternion::from_axis_angle(W::x_axis(), 0.5),
        );
        let pl_2 = placement(3.0);
        let b1 = BodyRef::new(BodyId::new(0), &pl_1);
        let b2 = BodyRef::new(BodyId::new(1), &pl_2);
        let a = SpaceVector::<BodyCom>::new(1.0, 0.0, 0.0);
        let b = SpaceVector::<BodyCom>::new(1.0, 0.0, 2.0);

        let local = HingePrecomputation::from_body_1_points(b1, b2, a, b).unwrap();
        let world = HingePrecomputation::from_world_points(
            b1,
            b2,
            pl_1.bound_transform_to_base(a),
            pl_1.bound_transform_to_base(b),
        )
        .unwrap();

        assert_relative_eq!(
            (local.frame_2().anchor - world.frame_2().anchor).norm(),
            0.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            (local.frame_2().axis - world.frame_2().axis).norm(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rejects_degenerate_hinges() {
        let pl = placement(0.0);
        let other = placement(1.0);

        let same = HingePrecomputation::from_world(
            BodyRef::new(BodyId::new(4), &pl),
            BodyRef::new(BodyId::new(4), &other),
            W::zeros(),
            W::z_axis(),
        );
        assert!(matches!(same, Err(SimError::InvalidConstraint { .. })));

        let zero_axis = HingePrecomputation::from_world(
            BodyRef::new(BodyId::new(0), &pl),
            BodyRef::new(BodyId::new(1), &other),
            W::zeros(),
            W::zeros(),
        );
        assert!(matches!(zero_axis, Err(SimError::InvalidConstraint { .. })));
    }

    #[test]
    fn test_data_is_stale_before_compute() {
        let pl_1 = placement(0.0);
        let pl_2 = placement(1.0);
        let hinge = HingePrecomputation::from_world(
            BodyRef::new(BodyId::new(0), &pl_1),
            BodyRef::new(BodyId::new(1), &pl_2),
            W::zeros(),
            W::y_axis(),
        )
        .unwrap();

        assert!(matches!(
            hinge.data(0),
            Err(SimError::StalePrecomputation { computed_at: None, .. })
        ));
    }
}
