//! Shared configuration for the vase generator
//!
//! This crate provides the single source of truth for the parameter set that
//! drives one generation pass, the documented defaults, structural validation,
//! and the JSON interchange used to persist and share parameter sets.

mod store;

pub use store::{ConfigError, ParameterStore};

use serde::{Deserialize, Serialize};

/// Default vase height in model units
pub const DEFAULT_HEIGHT: f32 = 100.0;

/// Default diameter of the top opening
pub const DEFAULT_TOP_DIAMETER: f32 = 60.0;

/// Default diameter of the base
pub const DEFAULT_BOTTOM_DIAMETER: f32 = 40.0;

/// Default number of radial waves around the circumference
pub const DEFAULT_RADIAL_FREQUENCY: f32 = 6.0;

/// Default radial wave amplitude
pub const DEFAULT_RADIAL_AMPLITUDE: f32 = 2.0;

/// Default number of vertical waves over the full height
pub const DEFAULT_VERTICAL_FREQUENCY: f32 = 2.0;

/// Default vertical wave amplitude
pub const DEFAULT_VERTICAL_AMPLITUDE: f32 = 0.0;

/// Default noise coordinate scale
pub const DEFAULT_NOISE_SCALE: f32 = 1.0;

/// Default noise displacement
pub const DEFAULT_NOISE_AMOUNT: f32 = 1.0;

/// Default segments around the circumference
pub const DEFAULT_RADIAL_SEGMENTS: u32 = 64;

/// Default segments along the height
pub const DEFAULT_VERTICAL_SEGMENTS: u32 = 64;

/// Identity radius formula, also the radius fallback
pub const DEFAULT_RADIUS_FORMULA: &str = "r";

/// Identity vertical formula, also the vertical fallback
pub const DEFAULT_VERTICAL_FORMULA: &str = "y";

/// Smallest radial segment count that still encloses a volume
pub const MIN_RADIAL_SEGMENTS: u32 = 3;

/// Smallest vertical segment count
pub const MIN_VERTICAL_SEGMENTS: u32 = 1;

/// Periodic waveform used for radial or vertical modulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveType {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// Mapping from height fraction to accumulated twist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwistRate {
    /// Twist grows proportionally with height
    #[default]
    Linear,
    /// Twist grows with the square of the height fraction
    Exponential,
}

/// Direction the surface rotates as it rises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwistDirection {
    #[default]
    Clockwise,
    Counterclockwise,
}

impl TwistDirection {
    /// Sign applied to the twist angle.
    pub fn sign(self) -> f64 {
        match self {
            TwistDirection::Clockwise => 1.0,
            TwistDirection::Counterclockwise => -1.0,
        }
    }
}

/// Coherent noise used to roughen the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    #[default]
    None,
    Perlin,
    Simplex,
    Voronoi,
}

/// Parameter set for one generation pass.
///
/// Serialized field-for-field with camelCase keys. Missing keys take the
/// documented defaults and unknown keys are ignored, so older and newer
/// parameter files both import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaseParameters {
    /// Height of the generated surface, excluding tabs
    pub height: f32,
    pub top_diameter: f32,
    pub bottom_diameter: f32,
    /// Straight rim added above the top ring (0 = none)
    pub top_tab_height: f32,
    /// Straight rim added below the bottom ring (0 = none)
    pub bottom_tab_height: f32,

    pub radial_wave_type: WaveType,
    /// Number of wave periods around the circumference
    pub radial_frequency: f32,
    pub radial_amplitude: f32,

    pub vertical_wave_type: WaveType,
    /// Number of wave periods over the full height
    pub vertical_frequency: f32,
    pub vertical_amplitude: f32,

    /// Total twist at the top ring, in degrees
    pub twist_angle_degrees: f32,
    pub twist_rate: TwistRate,
    pub twist_direction: TwistDirection,

    pub surface_noise_type: NoiseType,
    pub surface_noise_scale: f32,
    pub surface_noise_amount: f32,
    /// Seed for the noise source; identical seeds give identical meshes
    pub noise_seed: u32,

    /// Expression overriding the radius at each surface point
    pub radius_formula: String,
    /// Expression producing the deformed height at each surface point
    pub vertical_deformation_formula: String,

    pub radial_segments: u32,
    pub vertical_segments: u32,
}

impl Default for VaseParameters {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            top_diameter: DEFAULT_TOP_DIAMETER,
            bottom_diameter: DEFAULT_BOTTOM_DIAMETER,
            top_tab_height: 0.0,
            bottom_tab_height: 0.0,
            radial_wave_type: WaveType::Sine,
            radial_frequency: DEFAULT_RADIAL_FREQUENCY,
            radial_amplitude: DEFAULT_RADIAL_AMPLITUDE,
            vertical_wave_type: WaveType::Sine,
            vertical_frequency: DEFAULT_VERTICAL_FREQUENCY,
            vertical_amplitude: DEFAULT_VERTICAL_AMPLITUDE,
            twist_angle_degrees: 0.0,
            twist_rate: TwistRate::Linear,
            twist_direction: TwistDirection::Clockwise,
            surface_noise_type: NoiseType::None,
            surface_noise_scale: DEFAULT_NOISE_SCALE,
            surface_noise_amount: DEFAULT_NOISE_AMOUNT,
            noise_seed: 0,
            radius_formula: DEFAULT_RADIUS_FORMULA.to_string(),
            vertical_deformation_formula: DEFAULT_VERTICAL_FORMULA.to_string(),
            radial_segments: DEFAULT_RADIAL_SEGMENTS,
            vertical_segments: DEFAULT_VERTICAL_SEGMENTS,
        }
    }
}

/// Structural parameter problems that must be rejected before generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("radialSegments must be at least 3, got {0}")]
    TooFewRadialSegments(u32),

    #[error("verticalSegments must be at least 1, got {0}")]
    TooFewVerticalSegments(u32),

    #[error("{radial}x{vertical} segments exceed the 32-bit vertex index range")]
    TooManyVertices { radial: u32, vertical: u32 },
}

impl VaseParameters {
    /// Number of vertices in one ring (the seam column is duplicated).
    pub fn ring_len(&self) -> usize {
        self.radial_segments as usize + 1
    }

    /// Number of rings in the untabbed surface grid.
    pub fn ring_count(&self) -> usize {
        self.vertical_segments as usize + 1
    }

    /// Whether the top rim extrusion will run.
    pub fn has_top_tab(&self) -> bool {
        self.top_tab_height > 0.0
    }

    /// Whether the bottom rim extrusion will run.
    pub fn has_bottom_tab(&self) -> bool {
        self.bottom_tab_height > 0.0
    }

    /// Check the structural contract required before generation starts.
    ///
    /// Only parameters that would make the grid or its indices degenerate are
    /// rejected. Amplitudes, frequencies and formulas can produce odd shapes
    /// but never an invalid buffer.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let scalars = [
            ("height", self.height),
            ("topDiameter", self.top_diameter),
            ("bottomDiameter", self.bottom_diameter),
            ("topTabHeight", self.top_tab_height),
            ("bottomTabHeight", self.bottom_tab_height),
            ("radialFrequency", self.radial_frequency),
            ("radialAmplitude", self.radial_amplitude),
            ("verticalFrequency", self.vertical_frequency),
            ("verticalAmplitude", self.vertical_amplitude),
            ("twistAngleDegrees", self.twist_angle_degrees),
            ("surfaceNoiseScale", self.surface_noise_scale),
            ("surfaceNoiseAmount", self.surface_noise_amount),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite { field, value });
            }
        }

        for (field, value) in [
            ("height", self.height),
            ("topDiameter", self.top_diameter),
            ("bottomDiameter", self.bottom_diameter),
        ] {
            if value <= 0.0 {
                return Err(ParameterError::NotPositive { field, value });
            }
        }

        if self.radial_segments < MIN_RADIAL_SEGMENTS {
            return Err(ParameterError::TooFewRadialSegments(self.radial_segments));
        }
        if self.vertical_segments < MIN_VERTICAL_SEGMENTS {
            return Err(ParameterError::TooFewVerticalSegments(
                self.vertical_segments,
            ));
        }

        // Grid plus up to two tab rings must be addressable with u32 indices
        let total = (self.ring_len() as u64) * (self.ring_count() as u64 + 2);
        if total > u32::MAX as u64 {
            return Err(ParameterError::TooManyVertices {
                radial: self.radial_segments,
                vertical: self.vertical_segments,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        let params = VaseParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.radius_formula, "r");
        assert_eq!(params.vertical_deformation_formula, "y");
        assert_eq!(params.ring_len(), 65);
        assert_eq!(params.ring_count(), 65);
    }

    #[test]
    fn test_rejects_non_positive_height() {
        let params = VaseParameters {
            height: 0.0,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParameterError::NotPositive {
                field: "height",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_rejects_non_positive_diameter() {
        let params = VaseParameters {
            bottom_diameter: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::NotPositive {
                field: "bottomDiameter",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_degenerate_segments() {
        let params = VaseParameters {
            radial_segments: 2,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParameterError::TooFewRadialSegments(2))
        );

        let params = VaseParameters {
            vertical_segments: 0,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParameterError::TooFewVerticalSegments(0))
        );
    }

    #[test]
    fn test_rejects_non_finite_scalar() {
        let params = VaseParameters {
            radial_amplitude: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::NonFinite {
                field: "radialAmplitude",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_index_overflow() {
        let params = VaseParameters {
            radial_segments: 100_000,
            vertical_segments: 100_000,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::TooManyVertices { .. })
        ));
    }

    #[test]
    fn test_tab_flags() {
        let params = VaseParameters {
            top_tab_height: 5.0,
            bottom_tab_height: -2.0,
            ..Default::default()
        };
        assert!(params.has_top_tab());
        assert!(!params.has_bottom_tab());
    }

    #[test]
    fn test_twist_direction_sign() {
        assert_eq!(TwistDirection::Clockwise.sign(), 1.0);
        assert_eq!(TwistDirection::Counterclockwise.sign(), -1.0);
    }
}
