//! Core types and settings for the fusion compass

use core::time::Duration;

use nalgebra::Vector3;

use crate::error::{CompassError, Result};

/// Name of the event published on every successful fusion
pub const AZIMUTH_CHANGED: &str = "azimuthChanged";

/// Default exponential smoothing coefficient applied to both sensor streams
pub const DEFAULT_SMOOTHING: f32 = 0.97;

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Free-fall threshold used by mobile platforms: gravity below 10% of its
/// normal magnitude, compared in squared form
pub const PLATFORM_FREE_FALL_THRESHOLD: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

/// Source of a raw sample
///
/// # Example
/// ```
/// use fusion_compass::SensorKind;
///
/// assert_eq!(SensorKind::Gravity.to_string(), "gravity");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SensorKind {
    /// Accelerometer reading, dominated by gravity when the device is at rest
    Gravity,
    /// Geomagnetic field reading
    Magnetic,
}

impl core::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SensorKind::Gravity => f.write_str("gravity"),
            SensorKind::Magnetic => f.write_str("magnetic"),
        }
    }
}

/// A raw reading tagged with the stream it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Stream the reading belongs to
    pub kind: SensorKind,
    /// Reading in device coordinates
    pub values: Vector3<f32>,
}

impl SensorSample {
    pub fn gravity(values: Vector3<f32>) -> Self {
        Self {
            kind: SensorKind::Gravity,
            values,
        }
    }

    pub fn magnetic(values: Vector3<f32>) -> Self {
        Self {
            kind: SensorKind::Magnetic,
            values,
        }
    }
}

/// Delivery cadence requested from the sensor provider
///
/// The named rates follow the usual mobile platform presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingRate {
    /// As fast as the hardware delivers
    Fastest,
    /// 50 Hz, suitable for games and compasses
    #[default]
    Game,
    /// About 15 Hz, suitable for UI updates
    Ui,
    /// 5 Hz, suitable for screen orientation changes
    Normal,
    /// Explicit sampling period
    Custom(Duration),
}

impl SamplingRate {
    /// Nominal period between two samples
    pub fn period(&self) -> Duration {
        match self {
            SamplingRate::Fastest => Duration::ZERO,
            SamplingRate::Game => Duration::from_micros(20_000),
            SamplingRate::Ui => Duration::from_micros(66_667),
            SamplingRate::Normal => Duration::from_micros(200_000),
            SamplingRate::Custom(period) => *period,
        }
    }
}

/// Heading estimator settings
///
/// # Example
/// ```
/// use fusion_compass::{EstimatorSettings, SamplingRate};
///
/// let settings = EstimatorSettings {
///     smoothing: 0.9,                        // Faster response, more jitter
///     sampling_rate: SamplingRate::Fastest,
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorSettings {
    /// Exponential smoothing coefficient α in `[0, 1)`
    ///
    /// Each update computes `α·previous + (1−α)·sample`. Higher values
    /// suppress more noise but take longer to converge from zero.
    pub smoothing: f32,
    /// Cadence requested for both sensor streams
    pub sampling_rate: SamplingRate,
    /// Minimum gravity magnitude squared accepted by fusion
    ///
    /// When set, a smoothed gravity vector shorter than this is treated as
    /// free fall and fusion fails. `None` only rejects near-zero vectors, so
    /// the first sample pair of a session already yields a heading. Use
    /// [`PLATFORM_FREE_FALL_THRESHOLD`] for the usual platform behavior.
    pub free_fall_threshold: Option<f32>,
}

impl EstimatorSettings {
    /// Check that the settings describe a usable filter
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(CompassError::InvalidSettings(
                "smoothing must be in [0, 1)",
            ));
        }
        match self.free_fall_threshold {
            Some(threshold) if !(threshold.is_finite() && threshold >= 0.0) => Err(
                CompassError::InvalidSettings("free fall threshold must be finite and non-negative"),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            sampling_rate: SamplingRate::default(),
            free_fall_threshold: None,
        }
    }
}

/// Heading change notification
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AzimuthChanged {
    /// New heading in degrees, `[0, 360)`
    pub new_azimuth: f64,
}

impl AzimuthChanged {
    pub fn new(azimuth: f32) -> Self {
        Self {
            new_azimuth: f64::from(azimuth),
        }
    }

    /// Event name used by bridges that route on names
    pub fn name(&self) -> &'static str {
        AZIMUTH_CHANGED
    }
}
