//! Named selections of bodies that move together.

use rigid_types::{
    BodyId, MassMomentsAtArm, Result, RotationQuaternion, SimError, SpaceVector, WorldSpace,
};

use crate::body::Body;
use crate::system::System;

/// A list of bodies in a [`System`], without owning them.
///
/// Operations check every id first, so a failing call leaves the system
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    label: String,
    bodies: Vec<BodyId>,
}

impl Group {
    /// Empty group.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bodies: Vec::new(),
        }
    }

    /// Group of the given bodies.
    #[must_use]
    pub fn with_bodies(mut self, bodies: impl IntoIterator<Item = BodyId>) -> Self {
        self.bodies.extend(bodies);
        self
    }

    /// Label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Add a body; adding one twice has no effect.
    pub fn add(&mut self, body: BodyId) {
        if !self.contains(body) {
            self.bodies.push(body);
        }
    }

    /// Member ids.
    #[must_use]
    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    /// Whether `body` is a member.
    #[must_use]
    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.contains(&body)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True when the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn members<'a>(&'a self, system: &'a System) -> impl Iterator<Item = Result<&'a Body>> + 'a {
        self.bodies.iter().map(move |&id| system.body(id))
    }

    fn check(&self, system: &System) -> Result<()> {
        self.members(system).try_for_each(|body| body.map(|_| ()))
    }

    /// Move every member by `translation`.
    pub fn translate(&self, system: &mut System, translation: SpaceVector<WorldSpace>) -> Result<()> {
        self.check(system)?;
        for &id in &self.bodies {
            system.body_mut(id)?.translate(translation);
        }
        Ok(())
    }

    /// Rotate every member about a world point; velocities turn along.
    pub fn rotate_about(
        &self,
        system: &mut System,
        point: SpaceVector<WorldSpace>,
        rotation: RotationQuaternion<WorldSpace, WorldSpace>,
    ) -> Result<()> {
        self.check(system)?;
        for &id in &self.bodies {
            system.body_mut(id)?.rotate_about(point, rotation);
        }
        Ok(())
    }

    /// Sum of the members' translational kinetic energies (J).
    pub fn translational_kinetic_energy(&self, system: &System) -> Result<f64> {
        self.members(system)
            .map(|body| body.map(Body::translational_kinetic_energy))
            .sum()
    }

    /// Sum of the members' rotational kinetic energies (J).
    pub fn rotational_kinetic_energy(&self, system: &System) -> Result<f64> {
        self.members(system)
            .map(|body| body.map(Body::rotational_kinetic_energy))
            .sum()
    }

    /// Total kinetic energy of the members (J).
    pub fn kinetic_energy(&self, system: &System) -> Result<f64> {
        Ok(self.translational_kinetic_energy(system)? + self.rotational_kinetic_energy(system)?)
    }

    /// Combined mass moments in world space, about the combined center of mass.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for an empty group and
    /// [`SimError::InvalidMassProperties`] if a member is immovable.
    pub fn mass_moments(&self, system: &System) -> Result<MassMomentsAtArm<WorldSpace>> {
        let mut total: Option<MassMomentsAtArm<WorldSpace>> = None;
        for body in self.members(system) {
            let body = body?;
            if body.is_immovable() {
                return Err(SimError::invalid_mass(format!(
                    "group '{}' contains immovable body '{}'",
                    self.label,
                    body.label()
                )));
            }
            let part = MassMomentsAtArm::new(body.world_mass_moments(), body.position());
            total = Some(match total {
                Some(sum) => sum + part,
                None => part,
            });
        }
        total.ok_or_else(|| SimError::invalid_config(format!("group '{}' is empty", self.label)))
    }
}
