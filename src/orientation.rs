//! Rotation-matrix fusion of gravity and geomagnetic vectors
//!
//! The rotation matrix maps device coordinates into a world frame where X
//! points east, Y points magnetic north and Z points up. Its rows are built
//! from cross products of the gravity vector `A` and the geomagnetic vector
//! `E`:
//!
//! - `H = E × A` (east), normalized
//! - `A` (up), normalized
//! - `M = A × H` (north)
//!
//! The inclination matrix rotates the geomagnetic vector into the world
//! frame's vertical plane and carries the magnetic dip angle.

use nalgebra::{Matrix3, Vector3};

use crate::math::{RAD_TO_DEG, Vector3Ext, normalize_degrees};

/// Squared magnitudes at or below this are treated as zero vectors
const MIN_MAGNITUDE_SQUARED: f32 = 1e-12;

/// Smallest `|E × A| / (|E|·|A|)` accepted, the sine of the angle between
/// gravity and the magnetic field
const MIN_SINE_ANGLE: f32 = 1e-4;

/// Device orientation derived from one gravity/magnetic pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationEstimate {
    rotation: Matrix3<f32>,
    inclination: Matrix3<f32>,
}

impl OrientationEstimate {
    /// Fuse gravity and magnetic vectors
    ///
    /// Returns `None` when either vector is non-finite or near zero length,
    /// or when the two are parallel.
    ///
    /// # Example
    /// ```
    /// use nalgebra::Vector3;
    /// use fusion_compass::OrientationEstimate;
    ///
    /// let gravity = Vector3::new(0.0, 0.0, 9.8);   // Lying flat
    /// let magnetic = Vector3::new(0.0, 22.0, -42.0); // Top edge towards north
    /// let orientation = OrientationEstimate::from_vectors(gravity, magnetic).unwrap();
    /// assert!(orientation.azimuth_degrees() < 1e-3);
    ///
    /// assert!(OrientationEstimate::from_vectors(gravity, Vector3::zeros()).is_none());
    /// ```
    pub fn from_vectors(gravity: Vector3<f32>, magnetic: Vector3<f32>) -> Option<Self> {
        Self::from_vectors_with_threshold(gravity, magnetic, None)
    }

    /// Fuse gravity and magnetic vectors, also rejecting a gravity vector
    /// whose squared magnitude is below `free_fall_threshold`
    pub fn from_vectors_with_threshold(
        gravity: Vector3<f32>,
        magnetic: Vector3<f32>,
        free_fall_threshold: Option<f32>,
    ) -> Option<Self> {
        if !gravity.is_finite() || !magnetic.is_finite() {
            return None;
        }

        let gravity_squared = gravity.magnitude_squared();
        let magnetic_squared = magnetic.magnitude_squared();
        if gravity_squared <= MIN_MAGNITUDE_SQUARED || magnetic_squared <= MIN_MAGNITUDE_SQUARED {
            return None;
        }
        if free_fall_threshold.is_some_and(|threshold| gravity_squared < threshold) {
            return None;
        }

        let gravity_norm = gravity_squared.sqrt();
        let magnetic_norm = magnetic_squared.sqrt();

        let east = magnetic.cross(&gravity);
        let east_norm = east.magnitude();
        if !east_norm.is_finite() || east_norm <= MIN_SINE_ANGLE * gravity_norm * magnetic_norm {
            return None;
        }

        let east = east / east_norm;
        let up = gravity / gravity_norm;
        let north = up.cross(&east);

        let rotation = Matrix3::from_rows(&[east.transpose(), north.transpose(), up.transpose()]);

        let cosine = magnetic.dot(&north) / magnetic_norm;
        let sine = magnetic.dot(&up) / magnetic_norm;
        #[rustfmt::skip]
        let inclination = Matrix3::new(
            1.0, 0.0,     0.0,
            0.0, cosine,  sine,
            0.0, -sine,   cosine,
        );

        Some(Self {
            rotation,
            inclination,
        })
    }

    /// Rotation matrix from device to world coordinates
    pub fn rotation(&self) -> Matrix3<f32> {
        self.rotation
    }

    /// Inclination matrix
    pub fn inclination(&self) -> Matrix3<f32> {
        self.inclination
    }

    /// Orientation angles in radians as (azimuth, pitch, roll)
    ///
    /// Azimuth is in `(-π, π]`, positive clockwise from magnetic north
    /// looking down on the device. Pitch is rotation about the X axis and
    /// roll about the Y axis.
    pub fn angles(&self) -> Vector3<f32> {
        let r = &self.rotation;
        let azimuth = r[(0, 1)].atan2(r[(1, 1)]);
        let pitch = (-r[(2, 1)]).clamp(-1.0, 1.0).asin();
        let roll = (-r[(2, 0)]).atan2(r[(2, 2)]);
        Vector3::new(azimuth, pitch, roll)
    }

    /// Orientation angles in degrees as (azimuth, pitch, roll)
    pub fn angles_degrees(&self) -> Vector3<f32> {
        self.angles().rad_to_deg()
    }

    /// Heading in degrees, `[0, 360)`
    pub fn azimuth_degrees(&self) -> f32 {
        normalize_degrees(self.angles().x * RAD_TO_DEG)
    }

    /// Magnetic dip angle in radians
    pub fn inclination_angle(&self) -> f32 {
        self.inclination[(1, 2)].atan2(self.inclination[(1, 1)])
    }
}
