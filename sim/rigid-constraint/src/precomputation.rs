//! Per-step geometry shared between constraints built on one joint.
//!
//! A hinge with a motor, a spring and limits has four constraints reading the
//! same anchor arms and axes. The geometry is computed once per step into a
//! [`Precomputations`] arena owned by the system; constraints refer to it
//! through typed handles.
//!
//! Every data record is stamped with the step it was computed for. Reading it
//! in any other step fails with [`SimError::StalePrecomputation`], so a
//! constraint can never act on geometry from a previous step.

use rigid_types::{
    BodyCom, BodyId, Result, RotationQuaternion, SimError, SpaceVector, WorldSpace,
};

use crate::hinge_precomputation::{HingeData, HingePrecomputation};
use crate::slider_precalculation::{SliderData, SliderPrecalculation};
use crate::state::BodyState;

/// A value tagged with the step it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCache<T> {
    entry: Option<(u64, T)>,
}

impl<T> StepCache<T> {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Replace the cached value.
    pub fn store(&mut self, step: u64, value: T) {
        self.entry = Some((step, value));
    }

    /// The value for `step`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StalePrecomputation`] if nothing was stored for
    /// `step`.
    pub fn get(&self, step: u64) -> Result<&T> {
        match &self.entry {
            Some((stamp, value)) if *stamp == step => Ok(value),
            other => Err(SimError::StalePrecomputation {
                computed_at: other.as_ref().map(|(stamp, _)| *stamp),
                requested_at: step,
            }),
        }
    }

    /// Step of the last stored value.
    #[must_use]
    pub fn computed_at(&self) -> Option<u64> {
        self.entry.as_ref().map(|(stamp, _)| *stamp)
    }
}

impl<T> Default for StepCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometry computed once per step for a pair of bodies.
pub trait Precomputation: Send {
    /// Data record produced by [`Self::compute`].
    type Data;

    /// The two bodies, in constraint order.
    fn bodies(&self) -> (BodyId, BodyId);

    /// Recompute the data record for `step`.
    fn compute(&mut self, step: u64, body_1: &BodyState, body_2: &BodyState);

    /// The data record for `step`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StalePrecomputation`] if [`Self::compute`] has not
    /// run for `step`.
    fn data(&self, step: u64) -> Result<&Self::Data>;
}

/// Snapshot of the relative orientation of two bodies.
///
/// Later orientations are compared against the snapshot to give a rotation
/// error that is zero in the initial pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedOrientationHelper {
    // Body 2 orientation seen from body 1, at construction.
    initial: RotationQuaternion<BodyCom, BodyCom>,
}

impl FixedOrientationHelper {
    /// Snapshot the relative orientation of two bodies.
    #[must_use]
    pub fn new(
        rotation_1: &RotationQuaternion<WorldSpace, BodyCom>,
        rotation_2: &RotationQuaternion<WorldSpace, BodyCom>,
    ) -> Self {
        Self {
            initial: rotation_1.inverse() * *rotation_2,
        }
    }

    /// World-space rotation vector taking the snapshot pose to the current one.
    ///
    /// Positive components mean body 2 has turned in the positive sense
    /// relative to body 1.
    #[must_use]
    pub fn rotation_error(
        &self,
        rotation_1: &RotationQuaternion<WorldSpace, BodyCom>,
        rotation_2: &RotationQuaternion<WorldSpace, BodyCom>,
    ) -> SpaceVector<WorldSpace> {
        let error: RotationQuaternion<WorldSpace, WorldSpace> =
            *rotation_2 * self.initial.inverse() * rotation_1.inverse();
        error.rotation_vector()
    }
}

/// Handle to a hinge precomputation in a [`Precomputations`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HingeHandle(usize);

/// Handle to a slider precalculation in a [`Precomputations`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliderHandle(usize);

impl HingeHandle {
    /// Position in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl SliderHandle {
    /// Position in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of all precomputations in a system.
#[derive(Debug, Default)]
pub struct Precomputations {
    hinges: Vec<HingePrecomputation>,
    sliders: Vec<SliderPrecalculation>,
}

impl Precomputations {
    /// Empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hinge precomputation.
    pub fn add_hinge(&mut self, hinge: HingePrecomputation) -> HingeHandle {
        self.hinges.push(hinge);
        HingeHandle(self.hinges.len() - 1)
    }

    /// Add a slider precalculation.
    pub fn add_slider(&mut self, slider: SliderPrecalculation) -> SliderHandle {
        self.sliders.push(slider);
        SliderHandle(self.sliders.len() - 1)
    }

    /// Look up a hinge.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidPrecomputation`] for a handle from another arena.
    pub fn hinge(&self, handle: HingeHandle) -> Result<&HingePrecomputation> {
        self.hinges
            .get(handle.0)
            .ok_or(SimError::InvalidPrecomputation(handle.0 as u64))
    }

    /// Look up a slider.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidPrecomputation`] for a handle from another arena.
    pub fn slider(&self, handle: SliderHandle) -> Result<&SliderPrecalculation> {
        self.sliders
            .get(handle.0)
            .ok_or(SimError::InvalidPrecomputation(handle.0 as u64))
    }

    /// Hinge geometry for `step`.
    pub fn hinge_data(&self, handle: HingeHandle, step: u64) -> Result<&HingeData> {
        self.hinge(handle)?.data(step)
    }

    /// Slider geometry for `step`.
    pub fn slider_data(&self, handle: SliderHandle, step: u64) -> Result<&SliderData> {
        self.slider(handle)?.data(step)
    }

    /// Number of precomputations of all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hinges.len() + self.sliders.len()
    }

    /// True if the arena holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refresh every precomputation for `step`.
    ///
    /// `bodies` is indexed by [`BodyId::index`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBodyId`] if a precomputation refers to a
    /// body missing from `bodies`. Nothing is refreshed in that case.
    pub fn compute_all(&mut self, step: u64, bodies: &[BodyState]) -> Result<()> {
        check_bodies(&self.hinges, bodies)?;
        check_bodies(&self.sliders, bodies)?;
        refresh(&mut self.hinges, step, bodies);
        refresh(&mut self.sliders, step, bodies);
        Ok(())
    }
}

fn check_bodies<P: Precomputation>(items: &[P], bodies: &[BodyState]) -> Result<()> {
    for item in items {
        let (b1, b2) = item.bodies();
        for id in [b1, b2] {
            if id.index() >= bodies.len() {
                return Err(SimError::InvalidBodyId(id.raw()));
            }
        }
    }
    Ok(())
}

fn refresh<P: Precomputation>(items: &mut [P], step: u64, bodies: &[BodyState]) {
    for item in items {
        let (b1, b2) = item.bodies();
        if let (Some(s1), Some(s2)) = (bodies.get(b1.index()), bodies.get(b2.index())) {
            item.compute(step, s1, s2);
        }
    }
}
