//! PID controller used by servos.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidSettings {
    /// Proportional gain.
    pub p: f64,
    /// Integral gain (per second).
    pub i: f64,
    /// Derivative gain (seconds).
    pub d: f64,
}

impl PidSettings {
    /// Create gains.
    #[must_use]
    pub const fn new(p: f64, i: f64, d: f64) -> Self {
        Self { p, i, d }
    }
}

/// PID controller acting against the error `measured − setpoint`.
///
/// The output is the negated weighted sum of error, integrated error and
/// error derivative, clamped to the output limit. A measured value above the
/// setpoint therefore gives a negative output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidController {
    settings: PidSettings,
    setpoint: f64,
    integral_limit: Option<(f64, f64)>,
    output_limit: (f64, f64),
    previous_error: f64,
    integrated_error: f64,
    output: f64,
}

impl PidController {
    /// Controller with unlimited integral and output.
    #[must_use]
    pub fn new(settings: PidSettings, setpoint: f64) -> Self {
        Self {
            settings,
            setpoint,
            integral_limit: None,
            output_limit: (f64::MIN, f64::MAX),
            previous_error: 0.0,
            integrated_error: 0.0,
            output: 0.0,
        }
    }

    /// Limit the integrated error to `[min, max]`.
    #[must_use]
    pub fn with_integral_limit(mut self, min: f64, max: f64) -> Self {
        self.integral_limit = Some((min, max));
        self
    }

    /// Limit the output to `[min, max]`.
    #[must_use]
    pub fn with_output_limit(mut self, min: f64, max: f64) -> Self {
        self.output_limit = (min, max);
        self
    }

    /// Gains.
    #[must_use]
    pub fn settings(&self) -> PidSettings {
        self.settings
    }

    /// Replace the gains.
    pub fn set_settings(&mut self, settings: PidSettings) {
        self.settings = settings;
    }

    /// Current setpoint.
    #[must_use]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Last output.
    #[must_use]
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Last error.
    #[must_use]
    pub fn error(&self) -> f64 {
        self.previous_error
    }

    /// Update the setpoint and process one measurement.
    pub fn process_with_setpoint(&mut self, setpoint: f64, measured: f64, dt: f64) -> f64 {
        self.setpoint = setpoint;
        self.process(measured, dt)
    }

    /// Process one measurement taken `dt` seconds after the previous one.
    pub fn process(&mut self, measured: f64, dt: f64) -> f64 {
        let error = measured - self.setpoint;

        self.integrated_error += error * dt;
        if let Some((min, max)) = self.integral_limit {
            self.integrated_error = self.integrated_error.clamp(min, max);
        }

        let mut derivative = (error - self.previous_error) / dt;
        if !derivative.is_finite() {
            derivative = 0.0;
        }

        let action = -(self.settings.p * error
            + self.settings.i * self.integrated_error
            + self.settings.d * derivative);
        let (min, max) = self.output_limit;
        self.output = action.clamp(min, max);
        self.previous_error = error;
        self.output
    }

    /// Clear the integrator and history.
    pub fn reset(&mut self) {
        self.previous_error = 0.0;
        self.integrated_error = 0.0;
        self.output = 0.0;
    }
}
