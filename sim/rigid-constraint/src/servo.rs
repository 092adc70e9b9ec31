//! Hobby-style angular servo built on an angular motor.

use std::f64::consts::PI;

use rigid_types::{BodyId, Result, SimError, VelocityMoments, WorldSpace};
use tracing::{trace, warn};

use crate::constraint::{Constraint, StepContext};
use crate::motor::AngularMotorConstraint;
use crate::pid::{PidController, PidSettings};
use crate::precomputation::{HingeHandle, Precomputations};
use crate::settings::ConstraintSettings;
use crate::state::ConstraintForces;

const DEGREE: f64 = PI / 180.0;

/// Arm speed per volt of a standard servo: 60° in 0.20 s at 6 V (rad/s/V).
pub const STANDARD_ANGULAR_VELOCITY_POTENTIAL: f64 = 60.0 * DEGREE / 0.20 / 6.0;

/// Stall torque per volt of a standard servo: 0.4 N·m at 6 V (N·m/V).
pub const STANDARD_TORQUE_POTENTIAL: f64 = 0.4 / 6.0;

/// Arm speed per volt of a 9-gram micro servo: 60° in 0.15 s at 6 V (rad/s/V).
pub const NINE_GRAM_ANGULAR_VELOCITY_POTENTIAL: f64 = 60.0 * DEGREE / 0.15 / 6.0;

/// Stall torque per volt of a 9-gram micro servo: 0.144 N·m at 6 V (N·m/V).
pub const NINE_GRAM_TORQUE_POTENTIAL: f64 = 0.144 / 6.0;

/// Direction in which the servo arm turns for positive setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServoOrientation {
    /// Positive setpoint turns body 2 positively about the hinge axis.
    #[default]
    Normal,
    /// Positive setpoint turns body 2 negatively about the hinge axis.
    Reversed,
}

impl ServoOrientation {
    fn sign(self) -> f64 {
        match self {
            Self::Normal => 1.0,
            Self::Reversed => -1.0,
        }
    }
}

/// Position-controlled actuator on a hinge.
///
/// A PID loop compares the hinge angle with the setpoint once per step and
/// commands the inner [`AngularMotorConstraint`]: full stall torque at a
/// speed proportional to the PID output, or no drive at all while the error
/// is inside the backlash.
///
/// Setpoints are quantized to the device resolution and clamped to the
/// angle range; out-of-range commands saturate instead of failing.
#[derive(Debug)]
pub struct AngularServoConstraint {
    motor: AngularMotorConstraint,
    hinge: HingeHandle,
    pid: PidController,
    angle_range: (f64, f64),
    backlash: f64,
    resolution: f64,
    orientation: ServoOrientation,
    voltage: f64,
    angular_velocity_potential: f64,
    torque_potential: f64,
    setpoint: f64,
    arm_angle: f64,
    arm_angular_velocity: f64,
    arm_torque: f64,
}

impl AngularServoConstraint {
    /// Default supply voltage (V).
    pub const DEFAULT_VOLTAGE: f64 = 6.0;

    /// Default setpoint resolution (rad).
    pub const DEFAULT_RESOLUTION: f64 = 0.1 * DEGREE;

    /// Servo on a registered hinge.
    ///
    /// `angular_velocity_potential` is arm speed per supply volt (rad/s/V);
    /// `torque_potential` is stall torque per supply volt (N·m/V).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] for an empty angle range, a
    /// negative backlash or non-positive potentials.
    pub fn new(
        precomputations: &Precomputations,
        hinge: HingeHandle,
        angle_range: (f64, f64),
        backlash: f64,
        angular_velocity_potential: f64,
        torque_potential: f64,
    ) -> Result<Self> {
        let (min, max) = angle_range;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(SimError::invalid_constraint(format!(
                "servo angle range [{min}, {max}] is empty"
            )));
        }
        if !(backlash.is_finite() && backlash >= 0.0) {
            return Err(SimError::invalid_constraint(format!(
                "servo backlash must be non-negative, got {backlash}"
            )));
        }

        let voltage = Self::DEFAULT_VOLTAGE;
        let mut motor = AngularMotorConstraint::new(
            precomputations,
            hinge,
            angular_velocity_potential * voltage,
            torque_potential * voltage,
        )?;
        motor.settings_mut().set_label("angular servo");

        let pid = PidController::new(PidSettings::new(50.0, 1.0, 1.0), 0.0)
            .with_integral_limit(-0.1 * DEGREE, 0.1 * DEGREE)
            .with_output_limit(-1.0, 1.0);

        Ok(Self {
            motor,
            hinge,
            pid,
            angle_range,
            backlash,
            resolution: Self::DEFAULT_RESOLUTION,
            orientation: ServoOrientation::Normal,
            voltage,
            angular_velocity_potential,
            torque_potential,
            setpoint: 0.0,
            arm_angle: 0.0,
            arm_angular_velocity: 0.0,
            arm_torque: 0.0,
        })
    }

    /// Set the setpoint resolution (rad); zero disables quantization.
    #[must_use]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution.abs();
        self
    }

    /// Set the arm orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: ServoOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the supply voltage.
    #[must_use]
    pub fn with_voltage(mut self, voltage: f64) -> Self {
        self.set_voltage(voltage);
        self
    }

    /// Supply voltage (V).
    #[must_use]
    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    /// Change the supply voltage; speed and torque scale with it.
    ///
    /// Negative values count as zero; non-finite values are ignored.
    pub fn set_voltage(&mut self, voltage: f64) {
        if !voltage.is_finite() {
            warn!(constraint = %self.motor.label(), voltage, "ignoring non-finite servo voltage");
            return;
        }
        self.voltage = voltage.max(0.0);
    }

    /// Applied setpoint in arm coordinates (rad), after quantization and clamping.
    #[must_use]
    pub fn setpoint(&self) -> f64 {
        self.orientation.sign() * self.setpoint
    }

    /// Command an arm angle (rad).
    ///
    /// The value is quantized to the resolution and clamped to the angle
    /// range. Applying an already applied setpoint changes nothing. NaN is
    /// ignored and the previous setpoint kept.
    pub fn set_setpoint(&mut self, angle: f64) {
        if angle.is_nan() {
            warn!(constraint = %self.motor.label(), "ignoring NaN servo setpoint");
            return;
        }
        let hinge_angle = self.orientation.sign() * angle;
        let applied = self.clamp_setpoint(hinge_angle);
        if applied != hinge_angle {
            trace!(
                constraint = %self.motor.label(),
                requested = angle,
                applied = self.orientation.sign() * applied,
                "servo setpoint quantized or clamped"
            );
        }
        self.setpoint = applied;
    }

    /// Angle range in hinge coordinates (rad).
    #[must_use]
    pub fn angle_range(&self) -> (f64, f64) {
        self.angle_range
    }

    /// Arm angle at the last step (rad).
    #[must_use]
    pub fn arm_angle(&self) -> f64 {
        self.orientation.sign() * self.arm_angle
    }

    /// Arm angular velocity at the last step (rad/s).
    #[must_use]
    pub fn arm_angular_velocity(&self) -> f64 {
        self.orientation.sign() * self.arm_angular_velocity
    }

    /// Torque the servo applied to the arm in the last step (N·m).
    #[must_use]
    pub fn arm_torque(&self) -> f64 {
        self.orientation.sign() * self.arm_torque
    }

    /// The inner motor.
    #[must_use]
    pub fn motor(&self) -> &AngularMotorConstraint {
        &self.motor
    }

    fn clamp_setpoint(&self, angle: f64) -> f64 {
        let (min, max) = self.angle_range;
        if angle >= max {
            return max;
        }
        if angle <= min {
            return min;
        }
        let quantized = if self.resolution > 0.0 {
            (angle / self.resolution).round() * self.resolution
        } else {
            angle
        };
        quantized.clamp(min, max)
    }

    fn update_pid(&mut self, dt: f64) {
        let error = self.arm_angle - self.setpoint;
        if error.abs() < self.backlash {
            self.motor.set_max_torque(0.0);
            self.motor.set_max_angular_velocity(0.0);
        } else {
            let factor = self.pid.process_with_setpoint(self.setpoint, self.arm_angle, dt);
            let max_speed = self.angular_velocity_potential * self.voltage;
            self.motor.set_max_torque(self.torque_potential * self.voltage);
            self.motor.set_max_angular_velocity(max_speed);
            self.motor.set_setpoint(factor * max_speed);
        }
    }
}

impl Constraint for AngularServoConstraint {
    fn bodies(&self) -> (BodyId, BodyId) {
        self.motor.bodies()
    }

    fn settings(&self) -> &ConstraintSettings {
        self.motor.settings()
    }

    fn settings_mut(&mut self) -> &mut ConstraintSettings {
        self.motor.settings_mut()
    }

    fn validate(&self, precomputations: &Precomputations) -> Result<()> {
        self.motor.validate(precomputations)
    }

    fn initialize_step(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        self.motor.initialize_step(ctx)
    }

    fn constraint_forces(
        &mut self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
        ctx: &StepContext<'_>,
    ) -> ConstraintForces {
        self.motor.constraint_forces(vm_1, vm_2, ctx)
    }

    fn computed_constraint_forces(&mut self, total: &ConstraintForces, ctx: &StepContext<'_>) {
        self.motor.computed_constraint_forces(total, ctx);

        if let Ok(data) = ctx.hinge(self.hinge) {
            self.arm_angle = data.angle;
            self.arm_angular_velocity = data.angular_velocity;
            self.arm_torque = total.body_2.torque.dot(&data.a1);
            self.update_pid(ctx.dt);
        }
    }
}

/// Standard-size hobby servo, optionally scaled.
///
/// Scaling multiplies torque by `scale` and divides speed by `scale^0.25`.
pub fn make_standard_servo(
    precomputations: &Precomputations,
    hinge: HingeHandle,
    scale: f64,
) -> Result<AngularServoConstraint> {
    make_servo(
        precomputations,
        hinge,
        scale,
        STANDARD_ANGULAR_VELOCITY_POTENTIAL,
        STANDARD_TORQUE_POTENTIAL,
    )
}

/// 9-gram micro servo, optionally scaled.
pub fn make_standard_9gram_servo(
    precomputations: &Precomputations,
    hinge: HingeHandle,
    scale: f64,
) -> Result<AngularServoConstraint> {
    make_servo(
        precomputations,
        hinge,
        scale,
        NINE_GRAM_ANGULAR_VELOCITY_POTENTIAL,
        NINE_GRAM_TORQUE_POTENTIAL,
    )
}

fn make_servo(
    precomputations: &Precomputations,
    hinge: HingeHandle,
    scale: f64,
    angular_velocity_potential: f64,
    torque_potential: f64,
) -> Result<AngularServoConstraint> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(SimError::invalid_constraint(format!(
            "servo scale must be positive, got {scale}"
        )));
    }

    AngularServoConstraint::new(
        precomputations,
        hinge,
        (-90.0 * DEGREE, 90.0 * DEGREE),
        0.5 * DEGREE,
        angular_velocity_potential / scale.powf(0.25),
        torque_potential * scale,
    )
}
