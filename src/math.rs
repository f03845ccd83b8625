//! Mathematical utilities and nalgebra extensions for the fusion compass

use nalgebra::Vector3;

/// Mathematical constants
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Full turn in degrees
pub const FULL_TURN: f32 = 360.0;

/// Wrap an angle in degrees into `[0, 360)`
///
/// `rem_euclid` can round a tiny negative input up to exactly 360.0 in
/// single precision, so that case folds back to zero. Adding `0.0` turns a
/// `-0.0` heading into `+0.0`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(FULL_TURN);
    if wrapped >= FULL_TURN { 0.0 } else { wrapped + 0.0 }
}

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Whether every component is finite
    fn is_finite(&self) -> bool;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn is_finite(&self) -> bool {
        self.iter().all(|component| component.is_finite())
    }

    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}
