//! One-shot tilt-compensated compass heading

use nalgebra::Vector3;

use crate::orientation::OrientationEstimate;

/// Calculate tilt-compensated magnetic heading
///
/// Fuses a single gravity/magnetic pair without smoothing. Callers that
/// filter their own readings can use this directly; [`HeadingEstimator`]
/// uses the same fusion on its smoothed vectors.
///
/// # Arguments
/// * `gravity` - Accelerometer reading, pointing up when the device is at rest
/// * `magnetic` - Magnetometer reading
///
/// # Returns
/// Heading in degrees (range: 0° to 360°, 0° = magnetic north, clockwise),
/// or `None` when the vectors are degenerate
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_compass::compass::calculate_azimuth;
///
/// let gravity = Vector3::new(0.0, 0.0, 9.8);        // Level device
/// let magnetic = Vector3::new(-30.0, 0.0, -40.0);   // North to the left
/// let heading = calculate_azimuth(gravity, magnetic).unwrap();
/// assert!((heading - 90.0).abs() < 1e-3);           // Facing east
/// ```
///
/// [`HeadingEstimator`]: crate::HeadingEstimator
pub fn calculate_azimuth(gravity: Vector3<f32>, magnetic: Vector3<f32>) -> Option<f32> {
    OrientationEstimate::from_vectors(gravity, magnetic).map(|orientation| orientation.azimuth_degrees())
}
