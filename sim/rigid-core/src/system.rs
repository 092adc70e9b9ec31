//! Container for bodies, constraints and shared precomputations.

use std::any::type_name;
use std::fmt;

use rigid_constraint::{
    BodyRef, Constraint, FixedConstraint, HingeHandle, HingePrecomputation, Precomputation,
    Precomputations, SliderHandle, SliderPrecalculation,
};
use rigid_types::{BodyId, ConstraintId, Result, SimError, SpaceVector, WorldSpace};

use crate::body::Body;
use crate::forces::Atmosphere;

/// Bodies and the constraints between them.
///
/// Bodies and constraints are never removed; their ids are positions in
/// insertion order, which is also the order the solver visits them in.
#[derive(Default)]
pub struct System {
    pub(crate) bodies: Vec<Body>,
    pub(crate) gravitating: Vec<bool>,
    pub(crate) constraints: Vec<Box<dyn Constraint>>,
    pub(crate) precomputations: Precomputations,
    pub(crate) atmosphere: Option<Box<dyn Atmosphere>>,
}

impl System {
    /// Empty system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    /// Add a body that does not attract other bodies.
    ///
    /// It is still attracted by gravitating bodies.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        self.push_body(body, false)
    }

    /// Add a body that attracts every other body.
    pub fn add_gravitating_body(&mut self, body: Body) -> BodyId {
        self.push_body(body, true)
    }

    fn push_body(&mut self, body: Body, gravitating: bool) -> BodyId {
        let id = BodyId::new(self.bodies.len() as u64);
        self.bodies.push(body);
        self.gravitating.push(gravitating);
        id
    }

    /// Get a body.
    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.bodies
            .get(id.index())
            .ok_or(SimError::InvalidBodyId(id.raw()))
    }

    /// Get a body mutably.
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body> {
        self.bodies
            .get_mut(id.index())
            .ok_or(SimError::InvalidBodyId(id.raw()))
    }

    /// All bodies in insertion order.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// All bodies, mutably.
    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Iterate over all body IDs.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        (0..self.bodies.len()).map(|index| BodyId::new(index as u64))
    }

    /// Number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether a body attracts other bodies.
    pub fn is_gravitating(&self, id: BodyId) -> Result<bool> {
        self.gravitating
            .get(id.index())
            .copied()
            .ok_or(SimError::InvalidBodyId(id.raw()))
    }

    /// Make a body attract other bodies, or stop it from doing so.
    pub fn set_gravitating(&mut self, id: BodyId, gravitating: bool) -> Result<()> {
        let flag = self
            .gravitating
            .get_mut(id.index())
            .ok_or(SimError::InvalidBodyId(id.raw()))?;
        *flag = gravitating;
        Ok(())
    }

    /// Body id together with its placement, for building constraints.
    pub fn body_ref(&self, id: BodyId) -> Result<BodyRef<'_>> {
        Ok(BodyRef::new(id, self.body(id)?.placement()))
    }

    fn check_pair(&self, (body_1, body_2): (BodyId, BodyId)) -> Result<()> {
        self.body(body_1)?;
        self.body(body_2)?;
        if body_1 == body_2 {
            return Err(SimError::invalid_constraint(format!(
                "both ends connect to {body_1}"
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Precomputations
    // =========================================================================

    /// Register hinge geometry shared by the constraints of one joint.
    ///
    /// # Errors
    ///
    /// Fails if either body is missing or both ends are the same body.
    pub fn add_hinge_precomputation(&mut self, hinge: HingePrecomputation) -> Result<HingeHandle> {
        self.check_pair(hinge.bodies())?;
        Ok(self.precomputations.add_hinge(hinge))
    }

    /// Register slider geometry shared by the constraints of one joint.
    ///
    /// # Errors
    ///
    /// Fails if either body is missing or both ends are the same body.
    pub fn add_slider_precalculation(&mut self, slider: SliderPrecalculation) -> Result<SliderHandle> {
        self.check_pair(slider.bodies())?;
        Ok(self.precomputations.add_slider(slider))
    }

    /// Hinge through a world-space anchor about a world-space axis, taken
    /// from the current placements.
    pub fn add_hinge(
        &mut self,
        body_1: BodyId,
        body_2: BodyId,
        anchor: SpaceVector<WorldSpace>,
        axis: SpaceVector<WorldSpace>,
    ) -> Result<HingeHandle> {
        let hinge =
            HingePrecomputation::from_world(self.body_ref(body_1)?, self.body_ref(body_2)?, anchor, axis)?;
        self.add_hinge_precomputation(hinge)
    }

    /// Slider along a world-space axis, taken from the current placements.
    pub fn add_slider(
        &mut self,
        body_1: BodyId,
        body_2: BodyId,
        axis: SpaceVector<WorldSpace>,
    ) -> Result<SliderHandle> {
        let slider = SliderPrecalculation::new(self.body_ref(body_1)?, self.body_ref(body_2)?, axis)?;
        self.add_slider_precalculation(slider)
    }

    /// Shared precomputation arena.
    #[must_use]
    pub fn precomputations(&self) -> &Precomputations {
        &self.precomputations
    }

    // =========================================================================
    // Constraints
    // =========================================================================

    /// Add a constraint. It is solved after every constraint added before it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBodyId`] for a body not in the system,
    /// [`SimError::InvalidConstraint`] when both ends are the same body, and
    /// whatever [`Constraint::validate`] reports.
    pub fn add_constraint(&mut self, constraint: impl Constraint + 'static) -> Result<ConstraintId> {
        self.check_pair(constraint.bodies())?;
        constraint.validate(&self.precomputations)?;

        let id = ConstraintId::new(self.constraints.len() as u64);
        self.constraints.push(Box::new(constraint));
        Ok(id)
    }

    /// Weld two bodies in their current relative pose.
    pub fn add_fixed(&mut self, body_1: BodyId, body_2: BodyId) -> Result<ConstraintId> {
        let fixed = FixedConstraint::new(self.body_ref(body_1)?, self.body_ref(body_2)?)?;
        self.add_constraint(fixed)
    }

    /// Get a constraint of a known type.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraintId`] for an unknown id and
    /// [`SimError::InvalidConstraint`] if the constraint is not a `T`.
    pub fn constraint<T: Constraint + 'static>(&self, id: ConstraintId) -> Result<&T> {
        let constraint = self.dyn_constraint(id)?;
        constraint
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| wrong_type::<T>(id, constraint.label()))
    }

    /// Get a constraint of a known type mutably, for example to change a
    /// setpoint.
    pub fn constraint_mut<T: Constraint + 'static>(&mut self, id: ConstraintId) -> Result<&mut T> {
        let constraint = self
            .constraints
            .get_mut(id.index())
            .ok_or(SimError::InvalidConstraintId(id.raw()))?;
        if !(**constraint).as_any().is::<T>() {
            return Err(wrong_type::<T>(id, constraint.label()));
        }
        (**constraint)
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(SimError::InvalidConstraintId(id.raw()))
    }

    /// Get a constraint without knowing its type.
    pub fn dyn_constraint(&self, id: ConstraintId) -> Result<&dyn Constraint> {
        self.constraints
            .get(id.index())
            .map(|constraint| &**constraint)
            .ok_or(SimError::InvalidConstraintId(id.raw()))
    }

    /// Get a constraint mutably without knowing its type.
    pub fn dyn_constraint_mut(&mut self, id: ConstraintId) -> Result<&mut dyn Constraint> {
        match self.constraints.get_mut(id.index()) {
            Some(constraint) => Ok(&mut **constraint),
            None => Err(SimError::InvalidConstraintId(id.raw())),
        }
    }

    /// All constraints in solve order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &dyn Constraint)> + '_ {
        self.constraints
            .iter()
            .enumerate()
            .map(|(index, constraint)| (ConstraintId::new(index as u64), &**constraint))
    }

    /// Number of constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Set the Baumgarte factor of every constraint.
    pub fn set_baumgarte_factor(&mut self, factor: f64) {
        for constraint in &mut self.constraints {
            constraint.settings_mut().set_baumgarte_factor(factor);
        }
    }

    // =========================================================================
    // Environment
    // =========================================================================

    /// Set the atmosphere that force sources see.
    pub fn set_atmosphere(&mut self, atmosphere: impl Atmosphere + 'static) {
        self.atmosphere = Some(Box::new(atmosphere));
    }

    /// Remove the atmosphere.
    pub fn clear_atmosphere(&mut self) {
        self.atmosphere = None;
    }

    /// Atmosphere, if any.
    #[must_use]
    pub fn atmosphere(&self) -> Option<&dyn Atmosphere> {
        self.atmosphere.as_deref()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Sum of translational kinetic energies (J).
    #[must_use]
    pub fn translational_kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::translational_kinetic_energy).sum()
    }

    /// Sum of rotational kinetic energies (J).
    #[must_use]
    pub fn rotational_kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::rotational_kinetic_energy).sum()
    }

    /// Total kinetic energy (J).
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        self.translational_kinetic_energy() + self.rotational_kinetic_energy()
    }

    /// Total linear momentum (kg·m/s).
    #[must_use]
    pub fn momentum(&self) -> SpaceVector<WorldSpace> {
        self.bodies.iter().map(Body::momentum).sum()
    }
}

fn wrong_type<T>(id: ConstraintId, label: &str) -> SimError {
    SimError::invalid_constraint(format!(
        "{id} ('{label}') is not a {}",
        type_name::<T>()
    ))
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("bodies", &self.bodies.len())
            .field("constraints", &self.constraints.len())
            .field("precomputations", &self.precomputations.len())
            .field("atmosphere", &self.atmosphere.is_some())
            .finish()
    }
}
