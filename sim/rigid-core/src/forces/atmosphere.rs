//! International Standard Atmosphere (ISA 1976).
//!
//! Layer data comes from the ISA table between −0.61 km and 84.852 km.
//! Temperature is interpolated linearly inside a layer; pressure and density
//! follow the barometric formulas for the layer's lapse rate. Altitudes
//! outside the table are clamped to its ends.

use std::fmt;
use std::sync::OnceLock;

use rigid_types::{SpaceVector, WorldSpace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::earth::EARTH_MEAN_RADIUS;

/// Standard gravitational acceleration (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.806_65;

/// Molar mass of dry air (kg/mol).
pub const AIR_MOLAR_MASS: f64 = 0.028_964_4;

/// Universal gas constant (J/(mol·K)).
pub const UNIVERSAL_GAS_CONSTANT: f64 = 8.314_459_8;

/// Heat capacity ratio of air.
const AIR_ADIABATIC_INDEX: f64 = 1.4;

/// Specific gas constant of dry air (J/(kg·K)).
const AIR_SPECIFIC_GAS_CONSTANT: f64 = 287.05;

/// Air properties and wind at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AtmosphereState {
    /// Density (kg/m³).
    pub density: f64,
    /// Static pressure (Pa).
    pub pressure: f64,
    /// Static temperature (K).
    pub temperature: f64,
    /// Dynamic viscosity (Pa·s).
    pub dynamic_viscosity: f64,
    /// Speed of sound (m/s).
    pub speed_of_sound: f64,
    /// Wind velocity (m/s).
    pub wind: SpaceVector<WorldSpace>,
}

/// Air model queried by force sources.
pub trait Atmosphere: Send + fmt::Debug {
    /// Air at a world-space position.
    fn state_at(&self, position: SpaceVector<WorldSpace>) -> AtmosphereState;
}

/// How a world position maps to altitude above mean sea level.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AltitudeModel {
    /// Distance from `center` minus `radius`.
    Spherical {
        /// Planet center.
        center: SpaceVector<WorldSpace>,
        /// Sea-level radius (m).
        radius: f64,
    },
    /// World Y is altitude.
    Flat,
}

impl AltitudeModel {
    /// Altitude of `position` (m).
    #[must_use]
    pub fn altitude(&self, position: SpaceVector<WorldSpace>) -> f64 {
        match *self {
            Self::Spherical { center, radius } => (position - center).norm() - radius,
            Self::Flat => position.y(),
        }
    }
}

/// The ISA with a constant wind.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StandardAtmosphere {
    altitude_model: AltitudeModel,
    wind: SpaceVector<WorldSpace>,
}

impl Default for StandardAtmosphere {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardAtmosphere {
    /// ISA around an Earth centered at the world origin, no wind.
    #[must_use]
    pub fn new() -> Self {
        Self {
            altitude_model: AltitudeModel::Spherical {
                center: SpaceVector::zeros(),
                radius: EARTH_MEAN_RADIUS,
            },
            wind: SpaceVector::zeros(),
        }
    }

    /// ISA over a flat ground at `y = 0`, with Y pointing up.
    #[must_use]
    pub fn flat() -> Self {
        Self {
            altitude_model: AltitudeModel::Flat,
            ..Self::new()
        }
    }

    /// Use another altitude model.
    #[must_use]
    pub fn with_altitude_model(mut self, altitude_model: AltitudeModel) -> Self {
        self.altitude_model = altitude_model;
        self
    }

    /// Blow a constant wind.
    #[must_use]
    pub fn with_wind(mut self, wind: SpaceVector<WorldSpace>) -> Self {
        self.wind = wind;
        self
    }

    /// Altitude model in use.
    #[must_use]
    pub fn altitude_model(&self) -> &AltitudeModel {
        &self.altitude_model
    }

    /// Air at a geometric altitude above mean sea level.
    #[must_use]
    pub fn at_altitude(&self, altitude: f64) -> AtmosphereState {
        let temperature = standard_temperature(altitude);
        AtmosphereState {
            density: standard_density(altitude),
            pressure: standard_pressure(altitude),
            temperature,
            dynamic_viscosity: dynamic_air_viscosity(temperature),
            speed_of_sound: speed_of_sound(temperature),
            wind: self.wind,
        }
    }
}

impl Atmosphere for StandardAtmosphere {
    fn state_at(&self, position: SpaceVector<WorldSpace>) -> AtmosphereState {
        self.at_altitude(self.altitude_model.altitude(position))
    }
}

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct IsaLayer {
    altitude: f64,
    pressure: f64,
    temperature: f64,
    density: f64,
}

const fn layer(altitude_km: f64, pressure: f64, temperature: f64, density: f64) -> IsaLayer {
    IsaLayer {
        altitude: altitude_km * 1000.0,
        pressure,
        temperature,
        density,
    }
}

fn isa_layers() -> &'static [IsaLayer] {
    static LAYERS: OnceLock<Vec<IsaLayer>> = OnceLock::new();
    LAYERS.get_or_init(|| {
        vec![
            layer(-0.61, 108_900.0, 292.15, 1.2985),
            layer(0.0, 101_325.0, 288.15, 1.2250),
            layer(11.0, 22_632.10, 216.65, 0.36391),
            layer(20.0, 5_474.89, 216.65, 0.08803),
            layer(32.0, 868.02, 228.65, 0.01322),
            layer(47.0, 110.91, 270.65, 0.0020),
            layer(51.0, 66.939, 270.65, 0.00086),
            layer(71.0, 3.9564, 214.65, 0.000_064_211),
            layer(84.852, 0.3734, 186.87, 8.0510e-6),
        ]
    })
}

/// Temperature (K) to dynamic viscosity of air (Pa·s).
fn viscosity_table() -> &'static [(f64, f64)] {
    static TABLE: OnceLock<Vec<(f64, f64)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            (-40.0, 157.591),
            (-20.0, 159.986),
            (0.0, 157.591),
            (10.0, 164.776),
            (20.0, 167.650),
            (30.0, 171.482),
            (40.0, 172.440),
            (50.0, 176.272),
            (60.0, 179.625),
            (70.0, 182.978),
            (80.0, 184.894),
            (90.0, 186.810),
            (100.0, 188.726),
            (120.0, 192.558),
            (140.0, 197.827),
            (160.0, 202.138),
            (180.0, 207.886),
            (200.0, 215.071),
            (300.0, 238.063),
            (400.0, 250.996),
            (500.0, 277.820),
            (750.0, 326.199),
            (1000.0, 376.015),
            (1500.0, 455.050),
        ]
        .iter()
        .map(|&(fahrenheit, viscosity)| (fahrenheit_to_kelvin(fahrenheit), viscosity * 1e-7))
        .collect()
    })
}

fn fahrenheit_to_kelvin(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0 + 273.15
}

/// Piecewise-linear lookup, clamped at both ends.
fn interpolate(table: &[(f64, f64)], x: f64) -> f64 {
    let (Some(first), Some(last)) = (table.first(), table.last()) else {
        return f64::NAN;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    let upper = table.partition_point(|&(key, _)| key <= x);
    let (x0, y0) = table[upper - 1];
    let (x1, y1) = table[upper];
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Clamped altitude with the layers below and above it.
fn bracket(altitude: f64) -> (f64, IsaLayer, IsaLayer) {
    let layers = isa_layers();
    let bottom = layers[0].altitude;
    let top = layers[layers.len() - 1].altitude;
    let h = altitude.clamp(bottom, top);
    let upper = layers
        .partition_point(|l| l.altitude <= h)
        .clamp(1, layers.len() - 1);
    (h, layers[upper - 1], layers[upper])
}

fn lapse_rate(lower: &IsaLayer, upper: &IsaLayer) -> f64 {
    (upper.temperature - lower.temperature) / (upper.altitude - lower.altitude)
}

/// Exponent `g·M/(R·L)` of the barometric formula.
fn barometric_exponent(lapse_rate: f64) -> f64 {
    STANDARD_GRAVITY * AIR_MOLAR_MASS / (UNIVERSAL_GAS_CONSTANT * lapse_rate)
}

/// `exp(−g·M·Δh/(R·T))` for isothermal layers.
fn isothermal_ratio(delta_h: f64, temperature: f64) -> f64 {
    (-STANDARD_GRAVITY * AIR_MOLAR_MASS * delta_h / (UNIVERSAL_GAS_CONSTANT * temperature)).exp()
}

// ============================================================================
// Standard quantities
// ============================================================================

/// ISA temperature (K) at a geometric altitude (m).
#[must_use]
pub fn standard_temperature(altitude: f64) -> f64 {
    let (h, lower, upper) = bracket(altitude);
    lower.temperature + lapse_rate(&lower, &upper) * (h - lower.altitude)
}

/// ISA temperature gradient (K/m) of the layer containing `altitude`.
///
/// Zero above the table.
#[must_use]
pub fn standard_temperature_gradient(altitude: f64) -> f64 {
    let layers = isa_layers();
    if layers.last().is_some_and(|top| altitude >= top.altitude) {
        return 0.0;
    }
    let (_, lower, upper) = bracket(altitude);
    lapse_rate(&lower, &upper)
}

/// ISA static pressure (Pa) at a geometric altitude (m).
#[must_use]
pub fn standard_pressure(altitude: f64) -> f64 {
    let (h, lower, upper) = bracket(altitude);
    let lapse = lapse_rate(&lower, &upper);
    let delta_h = h - lower.altitude;

    if lapse.abs() > 0.0 {
        let ratio = lower.temperature / (lower.temperature + lapse * delta_h);
        lower.pressure * ratio.powf(barometric_exponent(lapse))
    } else {
        lower.pressure * isothermal_ratio(delta_h, lower.temperature)
    }
}

/// ISA density (kg/m³) at a geometric altitude (m).
#[must_use]
pub fn standard_density(altitude: f64) -> f64 {
    let (h, lower, upper) = bracket(altitude);
    let lapse = lapse_rate(&lower, &upper);
    let delta_h = h - lower.altitude;

    if lapse.abs() > 0.0 {
        let ratio = lower.temperature / (lower.temperature + lapse * delta_h);
        lower.density * ratio.powf(1.0 + barometric_exponent(lapse))
    } else {
        lower.density * isothermal_ratio(delta_h, lower.temperature)
    }
}

/// Dynamic viscosity of air (Pa·s) at `temperature` (K).
#[must_use]
pub fn dynamic_air_viscosity(temperature: f64) -> f64 {
    interpolate(viscosity_table(), temperature)
}

/// Speed of sound in dry air (m/s) at `temperature` (K).
#[must_use]
pub fn speed_of_sound(temperature: f64) -> f64 {
    (AIR_ADIABATIC_INDEX * AIR_SPECIFIC_GAS_CONSTANT * temperature).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sea_level() {
        let air = StandardAtmosphere::new().at_altitude(0.0);

        assert_relative_eq!(air.temperature, 288.15);
        assert_relative_eq!(air.pressure, 101_325.0);
        assert_relative_eq!(air.density, 1.2250);
        assert_relative_eq!(air.speed_of_sound, 340.3, epsilon = 0.1);
        assert_relative_eq!(air.dynamic_viscosity, 1.79e-5, epsilon = 0.02e-5);
    }

    #[test]
    fn test_layers_join_continuously() {
        // Barometric formulas from one layer base reproduce the next base
        for km in [11.0, 20.0, 32.0, 47.0] {
            let below = standard_pressure(km * 1000.0 - 1e-6);
            let at = standard_pressure(km * 1000.0);
            assert_relative_eq!(below, at, max_relative = 1e-2);
        }
    }

    #[test]
    fn test_troposphere_values() {
        // Textbook ISA at 5 km
        assert_relative_eq!(standard_temperature(5000.0), 255.65, epsilon = 1e-9);
        assert_relative_eq!(standard_pressure(5000.0), 54_048.0, max_relative = 2e-3);
        assert_relative_eq!(standard_density(5000.0), 0.7364, max_relative = 2e-3);
        assert_relative_eq!(standard_temperature_gradient(5000.0), -0.0065, epsilon = 1e-12);
    }

    #[test]
    fn test_isothermal_layer() {
        assert_relative_eq!(standard_temperature_gradient(15_000.0), 0.0);
        let ratio = standard_pressure(15_000.0) / standard_pressure(11_000.0);
        assert_relative_eq!(ratio, isothermal_ratio(4000.0, 216.65), epsilon = 1e-12);
    }

    #[test]
    fn test_altitude_is_clamped() {
        assert_relative_eq!(standard_pressure(-5000.0), 108_900.0);
        assert_relative_eq!(standard_temperature(200_000.0), 186.87, epsilon = 1e-9);
        assert_relative_eq!(standard_temperature_gradient(200_000.0), 0.0);
    }

    #[test]
    fn test_viscosity_is_clamped() {
        assert_relative_eq!(dynamic_air_viscosity(0.0), 157.591e-7);
        assert_relative_eq!(dynamic_air_viscosity(5000.0), 455.050e-7);
    }

    #[test]
    fn test_spherical_and_flat_altitude() {
        let spherical = StandardAtmosphere::new()
            .state_at(SpaceVector::new(0.0, EARTH_MEAN_RADIUS + 11_000.0, 0.0));
        assert_relative_eq!(spherical.temperature, 216.65, epsilon = 1e-6);

        let wind = SpaceVector::new(3.0, 0.0, 0.0);
        let flat = StandardAtmosphere::flat()
            .with_wind(wind)
            .state_at(SpaceVector::new(100.0, 11_000.0, 100.0));
        assert_relative_eq!(flat.temperature, 216.65, epsilon = 1e-9);
        assert_eq!(flat.wind, wind);
    }

    #[test]
    fn test_flat_altitude_follows_y() {
        let flat = StandardAtmosphere::flat();

        let up = flat.state_at(SpaceVector::new(0.0, 10_000.0, 0.0));
        assert_relative_eq!(up.density, standard_density(10_000.0), epsilon = 1e-12);
        assert!(up.density < 0.5 * standard_density(0.0));

        // Horizontal offsets do not change the air
        let aside = flat.state_at(SpaceVector::new(5_000.0, 0.0, 10_000.0));
        assert_relative_eq!(aside.density, standard_density(0.0), epsilon = 1e-12);
        assert_relative_eq!(
            AltitudeModel::Flat.altitude(SpaceVector::new(1.0, 2.0, 3.0)),
            2.0
        );
    }
}
