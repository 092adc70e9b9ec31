//! Geometry of a slider (prismatic) joint between two bodies.

use rigid_types::{BodyCom, BodyId, Result, SimError, SpaceVector, WorldSpace};

use crate::precomputation::{FixedOrientationHelper, Precomputation, StepCache};
use crate::state::{BodyRef, BodyState};

type W = SpaceVector<WorldSpace>;

/// Slider geometry for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderData {
    /// Body 1 center of mass.
    pub x1: W,
    /// Body 2 center of mass.
    pub x2: W,
    /// Body 1 arm to the assembly-time position of body 2.
    pub r1: W,
    /// Body 2 arm; the slider acts at body 2's center of mass.
    pub r2: W,
    /// Displacement of body 2 from its assembly-time position relative to body 1.
    pub u: W,
    /// Slide axis attached to body 1 (unit).
    pub a: W,
    /// Unit vector perpendicular to `a`.
    pub t1: W,
    /// `a × t1`.
    pub t2: W,
    /// Signed displacement along the slide axis (m).
    pub distance: f64,
    /// Rate of change of `distance` (m/s).
    pub speed: f64,
    /// Rotation of body 2 relative to body 1 since assembly (world rotation vector).
    pub rotation_error: W,
}

/// Precomputed slider geometry shared by slider and linear limits constraints.
#[derive(Debug, Clone)]
pub struct SliderPrecalculation {
    body_1: BodyId,
    body_2: BodyId,
    anchor_1: SpaceVector<BodyCom>,
    axis_1: SpaceVector<BodyCom>,
    orientation: FixedOrientationHelper,
    cache: StepCache<SliderData>,
}

impl SliderPrecalculation {
    /// Slider along a world-space axis, starting from the current pose.
    ///
    /// The axis turns with body 1 afterwards; the slide distance is zero in
    /// the assembly pose.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] if both bodies are the same or
    /// the axis is zero or not finite.
    pub fn new(body_1: BodyRef<'_>, body_2: BodyRef<'_>, axis: W) -> Result<Self> {
        if body_1.id == body_2.id {
            return Err(SimError::invalid_constraint(format!(
                "slider connects {} to itself",
                body_1.id
            )));
        }
        let axis = axis
            .try_normalize(1e-12)
            .filter(|a| a.is_finite())
            .ok_or_else(|| SimError::invalid_constraint("slider axis is zero or not finite"))?;

        Ok(Self {
            body_1: body_1.id,
            body_2: body_2.id,
            anchor_1: body_1
                .placement
                .bound_transform_to_body(body_2.placement.position()),
            axis_1: body_1.placement.unbound_transform_to_body(axis),
            orientation: FixedOrientationHelper::new(
                &body_1.placement.body_to_base(),
                &body_2.placement.body_to_base(),
            ),
            cache: StepCache::new(),
        })
    }

    /// Slide axis in body 1's frame.
    #[must_use]
    pub fn axis_1(&self) -> SpaceVector<BodyCom> {
        self.axis_1
    }
}

impl Precomputation for SliderPrecalculation {
    type Data = SliderData;

    fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_1, self.body_2)
    }

    fn compute(&mut self, step: u64, body_1: &BodyState, body_2: &BodyState) {
        let pl_1 = &body_1.placement;
        let pl_2 = &body_2.placement;
        let x1 = pl_1.position();
        let x2 = pl_2.position();
        let r1 = pl_1.unbound_transform_to_base(self.anchor_1);
        let u = x2 - x1 - r1;
        let a = pl_1.unbound_transform_to_base(self.axis_1);
        let t1 = a.any_perpendicular();
        let t2 = a.cross(&t1);

        // Velocity of body 2 relative to the body 1 point it currently overlaps
        let vm_1 = &body_1.velocity_moments;
        let relative = body_2.velocity_moments.velocity - vm_1.velocity_at(x2 - x1);

        self.cache.store(
            step,
            SliderData {
                x1,
                x2,
                r1,
                r2: W::zeros(),
                u,
                a,
                t1,
                t2,
                distance: a.dot(&u),
                speed: a.dot(&relative),
                rotation_error: self
                    .orientation
                    .rotation_error(&pl_1.body_to_base(), &pl_2.body_to_base()),
            },
        );
    }

    fn data(&self, step: u64) -> Result<&SliderData> {
        self.cache.get(step)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigid_types::{MassMoments, Placement, RotationQuaternion, VelocityMoments};

    fn state(position: W, rotation: f64, velocity: W) -> BodyState {
        BodyState::new(
            Placement::new(position, RotationQuaternion::from_axis_angle(W::z_axis(), rotation)),
            VelocityMoments::new(velocity, W::zeros()),
            &MassMoments::sphere(1.0, 0.1),
        )
    }

    fn slider() -> SliderPrecalculation {
        let pl_1 = Placement::identity();
        let pl_2 = Placement::from_position(W::new(0.0, 2.0, 0.0));
        SliderPrecalculation::new(
            BodyRef::new(BodyId::new(0), &pl_1),
            BodyRef::new(BodyId::new(1), &pl_2),
            W::new(0.0, 5.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_distance_and_speed_along_axis() {
        let mut slider = slider();
        slider.compute(
            2,
            &state(W::zeros(), 0.0, W::zeros()),
            &state(W::new(0.1, 2.5, 0.0), 0.0, W::new(0.0, 0.3, 0.0)),
        );
        let data = slider.data(2).unwrap();

        assert_relative_eq!(data.distance, 0.5, epsilon = 1e-12);
        assert_relative_eq!(data.speed, 0.3, epsilon = 1e-12);
        assert_relative_eq!(data.u.x(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(data.a.y(), 1.0);
        assert_relative_eq!(data.rotation_error.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(data.r2.norm(), 0.0);
    }

    #[test]
    fn test_axis_turns_with_body_1() {
        let mut slider = slider();
        // Body 1 turned a quarter turn: the axis now points along −X
        slider.compute(
            0,
            &state(W::zeros(), std::f64::consts::FRAC_PI_2, W::zeros()),
            &state(W::new(-3.0, 0.0, 0.0), std::f64::consts::FRAC_PI_2, W::zeros()),
        );
        let data = slider.data(0).unwrap();

        assert_relative_eq!(data.a.x(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(data.distance, 1.0, epsilon = 1e-12);
        assert_relative_eq!(data.rotation_error.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_zero_axis() {
        let pl = Placement::identity();
        let result = SliderPrecalculation::new(
            BodyRef::new(BodyId::new(0), &pl),
            BodyRef::new(BodyId::new(1), &pl),
            W::zeros(),
        );
        assert!(matches!(result, Err(SimError::InvalidConstraint { .. })));
    }
}
