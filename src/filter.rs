//! Exponential low-pass filter for three-axis sensor streams

use nalgebra::Vector3;

/// Exponentially smoothed three-axis reading
///
/// Each update computes `α·previous + (1−α)·sample` component-wise. The
/// filter starts at the zero vector, so the first few outputs are biased
/// toward zero until it converges.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_compass::SmoothedVector3;
///
/// let mut gravity = SmoothedVector3::new(0.97);
/// gravity.update(Vector3::new(0.0, 0.0, 9.8));
/// assert!((gravity.value().z - 0.294).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedVector3 {
    value: Vector3<f32>,
    alpha: f32,
    samples: u32,
}

impl SmoothedVector3 {
    /// Create a filter at the zero vector with smoothing coefficient `alpha`
    pub fn new(alpha: f32) -> Self {
        Self {
            value: Vector3::zeros(),
            alpha,
            samples: 0,
        }
    }

    /// Absorb a sample and return the new smoothed value
    pub fn update(&mut self, sample: Vector3<f32>) -> Vector3<f32> {
        self.value = self.value * self.alpha + sample * (1.0 - self.alpha);
        self.samples = self.samples.saturating_add(1);
        self.value
    }

    /// Return to the zero vector
    pub fn reset(&mut self) {
        self.value = Vector3::zeros();
        self.samples = 0;
    }

    pub fn value(&self) -> Vector3<f32> {
        self.value
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Number of samples absorbed since the last reset
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Whether at least one sample has been absorbed since the last reset
    pub fn is_seeded(&self) -> bool {
        self.samples > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let filter = SmoothedVector3::new(0.97);
        assert_eq!(filter.value(), Vector3::zeros());
        assert!(!filter.is_seeded());
        assert_eq!(filter.samples(), 0);
    }

    #[test]
    fn test_single_update_scales_sample() {
        let mut filter = SmoothedVector3::new(0.97);
        let smoothed = filter.update(Vector3::new(1.0, -2.0, 50.0));

        assert!((smoothed.x - 0.03).abs() < 1e-6);
        assert!((smoothed.y + 0.06).abs() < 1e-6);
        assert!((smoothed.z - 1.5).abs() < 1e-5);
        assert!(filter.is_seeded());
    }

    #[test]
    fn test_recurrence() {
        let alpha = 0.8;
        let mut filter = SmoothedVector3::new(alpha);
        let samples = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];

        let mut expected = Vector3::zeros();
        for sample in samples {
            expected = expected * alpha + sample * (1.0 - alpha);
            let smoothed = filter.update(sample);
            assert!((smoothed - expected).magnitude() < 1e-6);
        }
        assert_eq!(filter.samples(), 3);
    }

    #[test]
    fn test_converges_to_constant_input() {
        let mut filter = SmoothedVector3::new(0.97);
        let target = Vector3::new(0.0, 0.0, 9.8);
        for _ in 0..1000 {
            filter.update(target);
        }
        assert!((filter.value() - target).magnitude() < 1e-3);
    }

    #[test]
    fn test_reset() {
        let mut filter = SmoothedVector3::new(0.97);
        filter.update(Vector3::new(5.0, 5.0, 5.0));
        filter.reset();

        assert_eq!(filter.value(), Vector3::zeros());
        assert!(!filter.is_seeded());
        assert_eq!(filter.alpha(), 0.97);
    }

    #[test]
    fn test_zero_alpha_tracks_input() {
        let mut filter = SmoothedVector3::new(0.0);
        let sample = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(filter.update(sample), sample);
    }
}
