//! Solver-facing snapshots of bodies and per-constraint force results.

use std::ops::{Add, AddAssign};

use rigid_types::{
    BodyCom, BodyId, ForceMoments, MassMoments, Placement, SpaceMatrix, SpaceVector,
    VelocityMoments, WorldSpace,
};

/// State of one body as seen by the constraints during a step.
///
/// Built once per step by the solver. Inverse mass properties are already
/// rotated into world space so constraint code never touches body frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Center-of-mass placement.
    pub placement: Placement<WorldSpace, BodyCom>,
    /// Velocity of the center of mass.
    pub velocity_moments: VelocityMoments<WorldSpace>,
    /// Inverse mass (zero for immovable bodies).
    pub inverse_mass: f64,
    /// Inverse inertia tensor in world space.
    pub inverse_inertia: SpaceMatrix<WorldSpace, WorldSpace>,
}

impl BodyState {
    /// Snapshot a body from its placement, velocity and body-frame mass moments.
    #[must_use]
    pub fn new(
        placement: Placement<WorldSpace, BodyCom>,
        velocity_moments: VelocityMoments<WorldSpace>,
        mass_moments: &MassMoments<BodyCom>,
    ) -> Self {
        let world = mass_moments.rotated(&placement.body_to_base());
        Self {
            placement,
            velocity_moments,
            inverse_mass: mass_moments.inverse_mass(),
            inverse_inertia: world.inverse_inertia_tensor(),
        }
    }

    /// Center-of-mass position.
    #[must_use]
    pub fn position(&self) -> SpaceVector<WorldSpace> {
        self.placement.position()
    }

    /// True when no force can move the body.
    #[must_use]
    pub fn is_immovable(&self) -> bool {
        self.inverse_mass == 0.0
    }
}

/// A body id together with its current placement, used when building
/// precomputations and constraints at assembly time.
#[derive(Debug, Clone, Copy)]
pub struct BodyRef<'a> {
    /// Body identifier.
    pub id: BodyId,
    /// Current center-of-mass placement.
    pub placement: &'a Placement<WorldSpace, BodyCom>,
}

impl<'a> BodyRef<'a> {
    /// Create a body reference.
    #[must_use]
    pub fn new(id: BodyId, placement: &'a Placement<WorldSpace, BodyCom>) -> Self {
        Self { id, placement }
    }
}

/// Forces a constraint applies to its two bodies, about each center of mass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstraintForces {
    /// Force moments on the first body.
    pub body_1: ForceMoments<WorldSpace>,
    /// Force moments on the second body.
    pub body_2: ForceMoments<WorldSpace>,
}

impl ConstraintForces {
    /// Create a force pair.
    #[must_use]
    pub fn new(body_1: ForceMoments<WorldSpace>, body_2: ForceMoments<WorldSpace>) -> Self {
        Self { body_1, body_2 }
    }

    /// No force on either body.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Equal and opposite torques about `axis`: `+torque` on body 2.
    #[must_use]
    pub fn torque_pair(axis: SpaceVector<WorldSpace>, torque: f64) -> Self {
        let on_2 = ForceMoments::from_torque(axis * torque);
        Self::new(-on_2, on_2)
    }

    /// True when every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.body_1.is_finite() && self.body_2.is_finite()
    }

    /// Largest force or torque magnitude on either body.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.body_1.magnitude().max(self.body_2.magnitude())
    }
}

impl Add for ConstraintForces {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.body_1 + rhs.body_1, self.body_2 + rhs.body_2)
    }
}

impl AddAssign for ConstraintForces {
    fn add_assign(&mut self, rhs: Self) {
        self.body_1 += rhs.body_1;
        self.body_2 += rhs.body_2;
    }
}
