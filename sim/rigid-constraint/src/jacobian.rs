//! Jacobian rows and the velocity-level multiplier solve.
//!
//! A constraint with `n` rows contributes the velocity equation
//! `J·v + bias = 0`, where each row of `J` acts on both bodies' linear and
//! angular velocity. The force multiplier for one step is
//!
//! ```text
//! K = J · M⁻¹ · Jᵗ (+ CFM on the diagonal)
//! Z = −K⁻¹ / Δt
//! λ = Z · (J·v + bias)
//! ```
//!
//! and the forces on the bodies are `Jᵗ·λ`. Applying those forces for one
//! step brings `J·v` to `−bias`.

use nalgebra::{DMatrix, DVector};
use rigid_types::{ForceMoments, Result, SimError, SpaceVector, VelocityMoments, WorldSpace};

use crate::settings::{RowKind, Stabilization};
use crate::state::{BodyState, ConstraintForces};

type V = SpaceVector<WorldSpace>;

/// One row of a constraint Jacobian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianRow {
    /// Coefficients for body 1 linear velocity.
    pub jv1: V,
    /// Coefficients for body 1 angular velocity.
    pub jw1: V,
    /// Coefficients for body 2 linear velocity.
    pub jv2: V,
    /// Coefficients for body 2 angular velocity.
    pub jw2: V,
}

impl JacobianRow {
    /// Row keeping two attachment points from separating along `direction`.
    ///
    /// `arm_1` and `arm_2` run from each center of mass to its attachment
    /// point. When `direction` itself turns with body 1, `arm_1` must also
    /// include the current separation.
    #[must_use]
    pub fn linear(direction: V, arm_1: V, arm_2: V) -> Self {
        Self {
            jv1: -direction,
            jw1: -arm_1.cross(&direction),
            jv2: direction,
            jw2: arm_2.cross(&direction),
        }
    }

    /// Row acting on the relative angular velocity about `axis`.
    #[must_use]
    pub fn angular(axis: V) -> Self {
        Self {
            jv1: V::zeros(),
            jw1: -axis,
            jv2: V::zeros(),
            jw2: axis,
        }
    }

    /// `J·v` for this row.
    #[must_use]
    pub fn velocity(&self, vm_1: &VelocityMoments<WorldSpace>, vm_2: &VelocityMoments<WorldSpace>) -> f64 {
        self.jv1.dot(&vm_1.velocity)
            + self.jw1.dot(&vm_1.angular_velocity)
            + self.jv2.dot(&vm_2.velocity)
            + self.jw2.dot(&vm_2.angular_velocity)
    }

    /// Entry of `J · M⁻¹ · Jᵗ` coupling this row with `other`.
    #[must_use]
    pub fn effective_mass(&self, other: &Self, body_1: &BodyState, body_2: &BodyState) -> f64 {
        body_1.inverse_mass * self.jv1.dot(&other.jv1)
            + self.jw1.dot(&(body_1.inverse_inertia * other.jw1))
            + body_2.inverse_mass * self.jv2.dot(&other.jv2)
            + self.jw2.dot(&(body_2.inverse_inertia * other.jw2))
    }

    /// `Jᵗ·λ` for this row alone.
    #[must_use]
    pub fn forces(&self, lambda: f64) -> ConstraintForces {
        ConstraintForces::new(
            ForceMoments::new(self.jv1 * lambda, self.jw1 * lambda),
            ForceMoments::new(self.jv2 * lambda, self.jw2 * lambda),
        )
    }
}

/// A Jacobian row with its current position or rotation error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintRow {
    /// Jacobian coefficients.
    pub jacobian: JacobianRow,
    /// Constraint violation `C` whose rate is `J·v`.
    pub error: f64,
    /// Units of the error.
    pub kind: RowKind,
}

impl ConstraintRow {
    /// Create a row.
    #[must_use]
    pub fn new(jacobian: JacobianRow, error: f64, kind: RowKind) -> Self {
        Self {
            jacobian,
            error,
            kind,
        }
    }

    /// Three rows holding two anchors together, one per world axis.
    ///
    /// `u` is the anchor separation `x2 + r2 − x1 − r1`.
    #[must_use]
    pub fn coincident_points(r1: V, r2: V, u: V) -> [Self; 3] {
        [V::x_axis(), V::y_axis(), V::z_axis()]
            .map(|e| Self::new(JacobianRow::linear(e, r1, r2), e.dot(&u), RowKind::Linear))
    }

    /// Three rows locking relative orientation, given the rotation error of
    /// body 2 relative to body 1 as a world rotation vector.
    #[must_use]
    pub fn locked_rotation(rotation_error: V) -> [Self; 3] {
        [V::x_axis(), V::y_axis(), V::z_axis()].map(|e| {
            Self::new(
                JacobianRow::angular(e),
                e.dot(&rotation_error),
                RowKind::Angular,
            )
        })
    }
}

/// Effective-mass solve for one constraint, built once per step.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocitySolver {
    rows: Vec<JacobianRow>,
    z: DMatrix<f64>,
    bias: DVector<f64>,
}

impl VelocitySolver {
    /// Build the `Z` matrix and bias for `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SingularConstraint`] if `K` cannot be inverted or
    /// its inverse is not finite, which happens when rows are linearly
    /// dependent for the current geometry or both bodies are immovable.
    pub fn new(
        rows: &[ConstraintRow],
        body_1: &BodyState,
        body_2: &BodyState,
        stabilization: &Stabilization,
        dt: f64,
        label: &str,
    ) -> Result<Self> {
        let n = rows.len();
        let k = DMatrix::from_fn(n, n, |i, j| {
            let entry = rows[i]
                .jacobian
                .effective_mass(&rows[j].jacobian, body_1, body_2);
            if i == j {
                entry + stabilization.constraint_force_mixing
            } else {
                entry
            }
        });

        let k_inverse = k
            .try_inverse()
            .filter(|m| m.iter().all(|c| c.is_finite()))
            .ok_or_else(|| SimError::singular(label))?;

        let bias = DVector::from_iterator(
            n,
            rows.iter()
                .map(|row| stabilization.bias(row.error, row.kind, dt)),
        );

        Ok(Self {
            rows: rows.iter().map(|row| row.jacobian).collect(),
            z: k_inverse * (-1.0 / dt),
            bias,
        })
    }

    /// Drive row `row` toward relative velocity `target` instead of zero.
    #[must_use]
    pub fn with_target_velocity(mut self, row: usize, target: f64) -> Self {
        if let Some(bias) = self.bias.get_mut(row) {
            *bias -= target;
        }
        self
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Multipliers `λ = Z · (J·v + bias)` for the given velocities.
    #[must_use]
    pub fn lambda(
        &self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
    ) -> DVector<f64> {
        let jv = DVector::from_iterator(
            self.rows.len(),
            self.rows.iter().map(|row| row.velocity(vm_1, vm_2)),
        );
        &self.z * (jv + &self.bias)
    }

    /// Forces `Jᵗ·λ`.
    #[must_use]
    pub fn forces(&self, lambda: &DVector<f64>) -> ConstraintForces {
        self.rows
            .iter()
            .zip(lambda.iter())
            .fold(ConstraintForces::zero(), |acc, (row, &l)| acc + row.forces(l))
    }

    /// Forces correcting the given velocities in one go.
    #[must_use]
    pub fn solve(
        &self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
    ) -> ConstraintForces {
        self.forces(&self.lambda(vm_1, vm_2))
    }
}

/// One-row solve whose multiplier, accumulated over the iterations of a
/// step, is kept inside `[min, max]`.
///
/// Used for actuators with a force limit and for one-sided limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ClampedRow {
    row: JacobianRow,
    z: f64,
    bias: f64,
    min: f64,
    max: f64,
    accumulated: f64,
}

impl ClampedRow {
    /// Build the solve for `row` with multiplier range `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SingularConstraint`] if the row has no effective
    /// mass, e.g. both bodies are immovable, and
    /// [`SimError::InvalidConstraint`] if the range is NaN or empty.
    pub fn new(
        row: &ConstraintRow,
        body_1: &BodyState,
        body_2: &BodyState,
        stabilization: &Stabilization,
        dt: f64,
        label: &str,
        (min, max): (f64, f64),
    ) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(SimError::invalid_constraint(format!(
                "{label}: multiplier range [{min}, {max}] is empty"
            )));
        }

        let k = row.jacobian.effective_mass(&row.jacobian, body_1, body_2)
            + stabilization.constraint_force_mixing;
        let z = -1.0 / (k * dt);
        if k == 0.0 || !z.is_finite() {
            return Err(SimError::singular(label));
        }

        Ok(Self {
            row: row.jacobian,
            z,
            bias: stabilization.bias(row.error, row.kind, dt),
            min,
            max,
            accumulated: 0.0,
        })
    }

    /// Drive the row toward relative velocity `target` instead of zero.
    #[must_use]
    pub fn with_target_velocity(mut self, target: f64) -> Self {
        self.bias -= target;
        self
    }

    /// Multiplier accumulated so far in this step.
    #[must_use]
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Force increment for the given velocities, respecting the range.
    pub fn solve(
        &mut self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
    ) -> ConstraintForces {
        let delta = self.z * (self.row.velocity(vm_1, vm_2) + self.bias);
        let total = (self.accumulated + delta).max(self.min).min(self.max);
        let applied = total - self.accumulated;
        self.accumulated = total;
        self.row.forces(applied)
    }
}
