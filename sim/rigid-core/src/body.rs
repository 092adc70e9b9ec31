//! Rigid bodies and their integration.

use rigid_constraint::BodyState;
use rigid_types::{
    AccelerationMoments, BodyCom, BodyOrigin, ForceMoments, Limits, MassMoments, Placement,
    Result, RotationQuaternion, Shape, SimError, SpaceVector, VelocityMoments, WorldSpace, Wrench,
};

use crate::forces::{Atmosphere, ForceSource};

type W = SpaceVector<WorldSpace>;

/// A rigid body.
///
/// The placement locates the center of mass; all dynamic quantities are
/// world-space and refer to the center of mass.
#[derive(Debug)]
pub struct Body {
    label: String,
    placement: Placement<WorldSpace, BodyCom>,
    velocity_moments: VelocityMoments<WorldSpace>,
    acceleration_moments: AccelerationMoments<WorldSpace>,
    acceleration_moments_except_gravity: AccelerationMoments<WorldSpace>,
    mass_moments: MassMoments<BodyCom>,
    shape: Option<Shape>,
    applied_impulses: ForceMoments<WorldSpace>,
    force_source: Option<Box<dyn ForceSource>>,
}

impl Body {
    /// Body at rest at the world origin.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidMassProperties`] for a zero, negative or
    /// non-finite mass or an unphysical inertia tensor. Immovable mass
    /// moments are accepted.
    pub fn new(mass_moments: MassMoments<BodyCom>) -> Result<Self> {
        mass_moments.validate()?;
        Ok(Self::from_valid_mass_moments(mass_moments))
    }

    /// Body whose mass moments come from a closed shape of uniform density.
    ///
    /// The center of mass is placed where it lies in the shape's frame, with
    /// the shape frame coinciding with the world frame.
    pub fn from_shape(shape: Shape, density: f64) -> Result<Self> {
        let at_arm = shape.mass_moments(density)?;
        let mass_moments = at_arm
            .mass_moments
            .rotated(&RotationQuaternion::<BodyCom, BodyOrigin>::identity());
        let mut body = Self::new(mass_moments)?;
        body.placement
            .set_position(at_arm.center_of_mass.reframe::<WorldSpace>());
        body.shape = Some(shape);
        Ok(body)
    }

    pub(crate) fn from_valid_mass_moments(mass_moments: MassMoments<BodyCom>) -> Self {
        Self {
            label: String::new(),
            placement: Placement::identity(),
            velocity_moments: VelocityMoments::zero(),
            acceleration_moments: AccelerationMoments::zero(),
            acceleration_moments_except_gravity: AccelerationMoments::zero(),
            mass_moments,
            shape: None,
            applied_impulses: ForceMoments::zero(),
            force_source: None,
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement<WorldSpace, BodyCom>) -> Self {
        self.placement = placement;
        self
    }

    /// Place the center of mass at `position` without rotating.
    #[must_use]
    pub fn with_position(mut self, position: W) -> Self {
        self.placement.set_position(position);
        self
    }

    /// Set the velocity.
    #[must_use]
    pub fn with_velocity_moments(mut self, velocity_moments: VelocityMoments<WorldSpace>) -> Self {
        self.velocity_moments = velocity_moments;
        self
    }

    /// Attach a shape.
    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Attach a per-body force source.
    #[must_use]
    pub fn with_force_source(mut self, source: impl ForceSource + 'static) -> Self {
        self.force_source = Some(Box::new(source));
        self
    }

    /// Label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Set the label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Center-of-mass placement.
    #[must_use]
    pub fn placement(&self) -> &Placement<WorldSpace, BodyCom> {
        &self.placement
    }

    /// Replace the placement.
    pub fn set_placement(&mut self, placement: Placement<WorldSpace, BodyCom>) {
        self.placement = placement;
    }

    /// Center-of-mass position.
    #[must_use]
    pub fn position(&self) -> W {
        self.placement.position()
    }

    /// Velocity of the center of mass.
    #[must_use]
    pub fn velocity_moments(&self) -> &VelocityMoments<WorldSpace> {
        &self.velocity_moments
    }

    /// Replace the velocity.
    pub fn set_velocity_moments(&mut self, velocity_moments: VelocityMoments<WorldSpace>) {
        self.velocity_moments = velocity_moments;
    }

    /// Acceleration during the last step.
    #[must_use]
    pub fn acceleration_moments(&self) -> &AccelerationMoments<WorldSpace> {
        &self.acceleration_moments
    }

    /// Acceleration during the last step, excluding gravitation.
    ///
    /// This is what an accelerometer attached to the body would read.
    #[must_use]
    pub fn acceleration_moments_except_gravity(&self) -> &AccelerationMoments<WorldSpace> {
        &self.acceleration_moments_except_gravity
    }

    pub(crate) fn set_acceleration_moments_except_gravity(
        &mut self,
        acceleration_moments: AccelerationMoments<WorldSpace>,
    ) {
        self.acceleration_moments_except_gravity = acceleration_moments;
    }

    /// Mass moments about the center of mass, in the body frame.
    #[must_use]
    pub fn mass_moments(&self) -> &MassMoments<BodyCom> {
        &self.mass_moments
    }

    /// Mass moments in world space.
    #[must_use]
    pub fn world_mass_moments(&self) -> MassMoments<WorldSpace> {
        self.mass_moments.rotated(&self.placement.body_to_base())
    }

    /// Replace the mass moments.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Body::new`]; the body is unchanged on error.
    pub fn set_mass_moments(&mut self, mass_moments: MassMoments<BodyCom>) -> Result<()> {
        mass_moments.validate()?;
        self.mass_moments = mass_moments;
        Ok(())
    }

    /// True for bodies with infinite mass.
    #[must_use]
    pub fn is_immovable(&self) -> bool {
        self.mass_moments.is_immovable()
    }

    /// Attached shape.
    #[must_use]
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Snapshot for the constraint solver.
    #[must_use]
    pub fn state(&self) -> BodyState {
        BodyState::new(self.placement, self.velocity_moments, &self.mass_moments)
    }

    // =========================================================================
    // External forces
    // =========================================================================

    /// Apply force moments about the center of mass during the next step.
    ///
    /// Applied impulses accumulate until the solver consumes them.
    pub fn apply_impulse(&mut self, force_moments: ForceMoments<WorldSpace>) {
        self.applied_impulses += force_moments;
    }

    /// Apply force moments at a world-space point during the next step.
    pub fn apply_impulse_at(&mut self, force_moments: ForceMoments<WorldSpace>, position: W) {
        self.apply_wrench(&Wrench::new(force_moments, position - self.position()));
    }

    /// Apply a wrench whose position is relative to the center of mass.
    pub fn apply_wrench(&mut self, wrench: &Wrench<WorldSpace>) {
        self.apply_impulse(wrench.resultant_force_moments());
    }

    /// Impulses applied since the last step.
    #[must_use]
    pub fn applied_impulses(&self) -> &ForceMoments<WorldSpace> {
        &self.applied_impulses
    }

    /// Drop impulses applied since the last step.
    pub fn reset_applied_impulses(&mut self) {
        self.applied_impulses = ForceMoments::zero();
    }

    /// External force moments except gravitation: the force source plus
    /// applied impulses.
    #[must_use]
    pub fn external_force_moments(&self, atmosphere: Option<&dyn Atmosphere>) -> ForceMoments<WorldSpace> {
        let sourced = self
            .force_source
            .as_ref()
            .map_or_else(ForceMoments::zero, |source| {
                source.wrench(self, atmosphere).resultant_force_moments()
            });
        sourced + self.applied_impulses
    }

    // =========================================================================
    // Integration
    // =========================================================================

    /// Advance the body by `dt` under `force_moments` without clamping.
    pub fn act(&mut self, force_moments: &ForceMoments<WorldSpace>, dt: f64) {
        let _ = self.act_with_limits(force_moments, dt, &Limits::unlimited());
    }

    /// Advance the body by `dt` under `force_moments` and return the force
    /// moments actually integrated.
    ///
    /// Forces are clamped before integration and velocities after it.
    /// Integration is semi-implicit Euler: velocity first, then position and
    /// orientation with the new velocity.
    pub fn act_with_limits(
        &mut self,
        force_moments: &ForceMoments<WorldSpace>,
        dt: f64,
        limits: &Limits,
    ) -> ForceMoments<WorldSpace> {
        let force = clamp_norm(force_moments.force, limits.max_force);
        let torque = clamp_norm(force_moments.torque, limits.max_torque);

        let world = self.world_mass_moments();
        self.acceleration_moments = AccelerationMoments::new(
            force * world.inverse_mass(),
            world.inverse_inertia_tensor() * torque,
        );

        let vm = self.velocity_moments + self.acceleration_moments.integrate(dt);
        self.velocity_moments = VelocityMoments::new(
            clamp_norm(vm.velocity, limits.max_velocity),
            clamp_norm(vm.angular_velocity, limits.max_angular_velocity),
        );

        self.placement.translate(self.velocity_moments.velocity * dt);
        self.placement.rotate_body_frame(RotationQuaternion::from_rotation_vector(
            self.velocity_moments.angular_velocity * dt,
        ));
        self.placement.renormalize();

        ForceMoments::new(force, torque)
    }

    // =========================================================================
    // Kinematic edits
    // =========================================================================

    /// Rotate about the center of mass; velocities turn along.
    pub fn rotate_about_center_of_mass(&mut self, rotation: RotationQuaternion<WorldSpace, WorldSpace>) {
        self.placement.rotate_body_frame(rotation);
        self.rotate_dynamics(&rotation);
    }

    /// Rotate about the world origin; velocities turn along.
    pub fn rotate_about_world_origin(&mut self, rotation: RotationQuaternion<WorldSpace, WorldSpace>) {
        self.placement.rotate_base_frame(rotation);
        self.rotate_dynamics(&rotation);
    }

    /// Rotate about a world point; velocities turn along.
    pub fn rotate_about(&mut self, point: W, rotation: RotationQuaternion<WorldSpace, WorldSpace>) {
        self.placement.rotate_about(point, rotation);
        self.rotate_dynamics(&rotation);
    }

    /// Move by `translation`.
    pub fn translate(&mut self, translation: W) {
        self.placement.translate(translation);
    }

    /// Move the center of mass to `position`.
    pub fn move_to(&mut self, position: W) {
        self.placement.set_position(position);
    }

    fn rotate_dynamics(&mut self, rotation: &RotationQuaternion<WorldSpace, WorldSpace>) {
        self.velocity_moments = self.velocity_moments.rotated(rotation);
        let am = &self.acceleration_moments;
        self.acceleration_moments = AccelerationMoments::new(
            *rotation * am.acceleration,
            *rotation * am.angular_acceleration,
        );
        self.reset_applied_impulses();
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// `½·m·|v|²` (J). Zero for immovable bodies.
    #[must_use]
    pub fn translational_kinetic_energy(&self) -> f64 {
        if self.is_immovable() {
            return 0.0;
        }
        0.5 * self.mass_moments.mass() * self.velocity_moments.velocity.norm_squared()
    }

    /// `½·ωᵗ·I·ω` (J). Zero for immovable bodies.
    #[must_use]
    pub fn rotational_kinetic_energy(&self) -> f64 {
        if self.is_immovable() {
            return 0.0;
        }
        let omega = self.velocity_moments.angular_velocity;
        0.5 * omega.dot(&(self.world_mass_moments().inertia_tensor() * omega))
    }

    /// Linear momentum `m·v` (kg·m/s). Zero for immovable bodies.
    #[must_use]
    pub fn momentum(&self) -> W {
        if self.is_immovable() {
            return W::zeros();
        }
        self.velocity_moments.velocity * self.mass_moments.mass()
    }

    /// Angular momentum about the center of mass `I·ω` (kg·m²/s).
    #[must_use]
    pub fn angular_momentum(&self) -> W {
        if self.is_immovable() {
            return W::zeros();
        }
        self.world_mass_moments().inertia_tensor() * self.velocity_moments.angular_velocity
    }

    /// Fail if the body state contains `NaN` or infinities.
    pub fn validate(&self) -> Result<()> {
        if !self.placement.is_finite() {
            return Err(SimError::non_finite(format!("placement of body '{}'", self.label)));
        }
        if !self.velocity_moments.is_finite() {
            return Err(SimError::non_finite(format!("velocity of body '{}'", self.label)));
        }
        Ok(())
    }
}

/// Shorten `v` to at most `max`, keeping its direction.
fn clamp_norm(v: W, max: f64) -> W {
    let norm = v.norm();
    if norm > max {
        v * (max / norm)
    } else {
        v
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ball() -> Body {
        Body::new(MassMoments::sphere(2.0, 0.5)).unwrap()
    }

    #[test]
    fn test_rejects_bad_mass() {
        assert!(Body::new(MassMoments::sphere(0.0, 0.5)).is_err());
        assert!(Body::new(MassMoments::sphere(f64::NAN, 0.5)).is_err());
        assert!(Body::new(MassMoments::immovable()).is_ok());
    }

    #[test]
    fn test_act_is_semi_implicit() {
        let mut body = ball();
        let fm = ForceMoments::from_force(W::new(4.0, 0.0, 0.0));

        body.act(&fm, 0.5);

        // v = F/m·dt = 1, x = v·dt = 0.5
        assert_relative_eq!(body.velocity_moments().velocity.x(), 1.0);
        assert_relative_eq!(body.position().x(), 0.5);
        assert_relative_eq!(body.acceleration_moments().acceleration.x(), 2.0);
    }

    #[test]
    fn test_act_rotates_in_world_frame() {
        let mut body = ball().with_velocity_moments(VelocityMoments::new(
            W::zeros(),
            W::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        ));

        body.act(&ForceMoments::zero(), 1.0);

        let x = body.placement().unbound_transform_to_base(SpaceVector::x_axis());
        assert_relative_eq!(x.y(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_limits_clamp_force_and_velocity() {
        let mut body = ball();
        let limits = Limits {
            max_force: 2.0,
            max_velocity: 0.5,
            ..Limits::default()
        };
        let applied =
            body.act_with_limits(&ForceMoments::from_force(W::new(0.0, 100.0, 0.0)), 1.0, &limits);

        assert_relative_eq!(applied.force.y(), 2.0);
        assert_relative_eq!(body.acceleration_moments().acceleration.y(), 1.0);
        assert_relative_eq!(body.velocity_moments().velocity.y(), 0.5);
    }

    #[test]
    fn test_impulse_at_point_adds_torque() {
        let mut body = ball().with_position(W::new(1.0, 0.0, 0.0));
        body.apply_impulse_at(
            ForceMoments::from_force(W::new(0.0, 1.0, 0.0)),
            W::new(2.0, 0.0, 0.0),
        );

        let fm = body.external_force_moments(None);
        assert_relative_eq!(fm.force.y(), 1.0);
        assert_relative_eq!(fm.torque.z(), 1.0);

        body.reset_applied_impulses();
        assert_relative_eq!(body.external_force_moments(None).magnitude(), 0.0);
    }

    #[test]
    fn test_rotation_turns_velocity() {
        let mut body = ball()
            .with_position(W::new(1.0, 0.0, 0.0))
            .with_velocity_moments(VelocityMoments::new(W::new(1.0, 0.0, 0.0), W::zeros()));
        let quarter = RotationQuaternion::from_axis_angle(W::z_axis(), std::f64::consts::FRAC_PI_2);

        body.rotate_about_world_origin(quarter);

        assert_relative_eq!(body.position().y(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(body.velocity_moments().velocity.y(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_energy_and_momentum() {
        let body = ball().with_velocity_moments(VelocityMoments::new(
            W::new(3.0, 0.0, 0.0),
            W::new(0.0, 0.0, 2.0),
        ));

        assert_relative_eq!(body.translational_kinetic_energy(), 9.0);
        // I = 0.4·2·0.25 = 0.2, ½·0.2·4 = 0.4
        assert_relative_eq!(body.rotational_kinetic_energy(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(body.momentum().x(), 6.0);
        assert_relative_eq!(body.angular_momentum().z(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_body_from_shape() {
        let mut shape = Shape::centered_cube(2.0);
        shape.translate(SpaceVector::new(0.0, 0.0, 5.0));
        let body = Body::from_shape(shape, 10.0).unwrap();

        assert_relative_eq!(body.mass_moments().mass(), 80.0, epsilon = 1e-9);
        assert_relative_eq!(body.position().z(), 5.0, epsilon = 1e-9);
        assert!(body.shape().is_some());
    }
}
