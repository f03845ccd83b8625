//! Smoothed gravity/magnetic heading estimator

use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};
use nalgebra::Vector3;

use crate::error::Result;
use crate::filter::SmoothedVector3;
use crate::math::Vector3Ext;
use crate::orientation::OrientationEstimate;
use crate::types::{AzimuthChanged, EstimatorSettings, SensorKind, SensorSample};

/// Receiver of heading change notifications
///
/// Delivery is fire-and-forget. Notifications are published while the
/// estimator's lock is held, so an implementation must not call back into
/// the same estimator.
///
/// Closures and channel senders implement this trait. A sender ignores
/// send errors once the receiver is gone.
///
/// ```
/// use std::sync::mpsc;
/// use nalgebra::Vector3;
/// use fusion_compass::{AzimuthChanged, HeadingEstimator};
///
/// let (sender, receiver) = mpsc::channel::<AzimuthChanged>();
/// let estimator = HeadingEstimator::new(sender);
///
/// estimator.start();
/// estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8));
/// estimator.on_magnetic_sample(Vector3::new(0.0, 22.0, -42.0));
///
/// let event = receiver.try_recv().unwrap();
/// assert!(event.new_azimuth < 1e-3);
/// ```
pub trait AzimuthSink: Send + Sync {
    fn azimuth_changed(&self, event: AzimuthChanged);
}

impl<F> AzimuthSink for F
where
    F: Fn(AzimuthChanged) + Send + Sync,
{
    fn azimuth_changed(&self, event: AzimuthChanged) {
        self(event)
    }
}

impl AzimuthSink for Sender<AzimuthChanged> {
    fn azimuth_changed(&self, event: AzimuthChanged) {
        let _ = self.send(event);
    }
}

/// Mutable state of one tracking session
#[derive(Debug)]
struct Session {
    tracking: bool,
    gravity: SmoothedVector3,
    magnetic: SmoothedVector3,
    azimuth: Option<f32>,
}

impl Session {
    fn new(smoothing: f32) -> Self {
        Self {
            tracking: false,
            gravity: SmoothedVector3::new(smoothing),
            magnetic: SmoothedVector3::new(smoothing),
            azimuth: None,
        }
    }

    fn reset(&mut self) {
        self.gravity.reset();
        self.magnetic.reset();
        self.azimuth = None;
    }
}

/// Heading estimator fed by independent gravity and magnetic streams
///
/// Each accepted sample updates its stream's low-pass filter and then
/// re-attempts fusion. Every successful fusion publishes exactly one
/// [`AzimuthChanged`] to the sink, even when the heading did not move.
///
/// All methods take `&self`; share an estimator between delivery threads
/// through an `Arc`. Sample handling, fusion and notification run under a
/// single lock, so notifications arrive in the order samples were processed
/// and none are published after [`stop`](Self::stop) returns.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use nalgebra::Vector3;
/// use fusion_compass::{AzimuthChanged, HeadingEstimator};
///
/// let headings = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&headings);
/// let estimator = HeadingEstimator::new(move |event: AzimuthChanged| {
///     sink.lock().unwrap().push(event.new_azimuth);
/// });
///
/// estimator.start();
/// estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8));
/// estimator.on_magnetic_sample(Vector3::new(-30.0, 0.0, -40.0));
/// estimator.stop();
///
/// let headings = headings.lock().unwrap();
/// assert_eq!(headings.len(), 1);
/// assert!((headings[0] - 90.0).abs() < 1e-3);
/// ```
pub struct HeadingEstimator<S> {
    settings: EstimatorSettings,
    session: Mutex<Session>,
    sink: S,
}

impl<S: AzimuthSink> HeadingEstimator<S> {
    /// Create an idle estimator with default settings
    pub fn new(sink: S) -> Self {
        let settings = EstimatorSettings::default();
        Self {
            session: Mutex::new(Session::new(settings.smoothing)),
            settings,
            sink,
        }
    }

    /// Create an idle estimator with specified settings
    pub fn with_settings(settings: EstimatorSettings, sink: S) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            session: Mutex::new(Session::new(settings.smoothing)),
            settings,
            sink,
        })
    }

    /// Begin a session
    ///
    /// Both filters and the last heading are reset to zero. Starting an
    /// active session restarts it.
    pub fn start(&self) {
        let mut session = self.lock();
        if session.tracking {
            debug!("restarting active heading session");
        } else {
            debug!("starting heading session");
        }
        session.reset();
        session.tracking = true;
    }

    /// End the session
    ///
    /// Returns `false` without side effects when no session is active.
    /// Samples delivered after this returns are dropped.
    pub fn stop(&self) -> bool {
        let mut session = self.lock();
        if !session.tracking {
            debug!("stop requested without an active heading session");
            return false;
        }
        session.tracking = false;
        debug!(
            "stopped heading session after {} gravity and {} magnetic samples",
            session.gravity.samples(),
            session.magnetic.samples()
        );
        true
    }

    pub fn is_tracking(&self) -> bool {
        self.lock().tracking
    }

    /// Absorb a gravity sample, returning the published heading if fusion succeeded
    pub fn on_gravity_sample(&self, values: Vector3<f32>) -> Option<f32> {
        self.process(SensorSample::gravity(values))
    }

    /// Absorb a magnetic sample, returning the published heading if fusion succeeded
    pub fn on_magnetic_sample(&self, values: Vector3<f32>) -> Option<f32> {
        self.process(SensorSample::magnetic(values))
    }

    /// Absorb a tagged sample, returning the published heading if fusion succeeded
    ///
    /// Samples with non-finite components are rejected without touching the
    /// filters. Samples outside a session are dropped.
    pub fn process(&self, sample: SensorSample) -> Option<f32> {
        let mut session = self.lock();
        if !session.tracking {
            trace!("dropping {} sample outside a session", sample.kind);
            return None;
        }
        if !sample.values.is_finite() {
            warn!("rejecting non-finite {} sample {:?}", sample.kind, sample.values);
            return None;
        }

        match sample.kind {
            SensorKind::Gravity => session.gravity.update(sample.values),
            SensorKind::Magnetic => session.magnetic.update(sample.values),
        };

        self.fuse(&mut session)
    }

    /// Fuse the current smoothed vectors and publish the heading
    ///
    /// Returns `None`, publishing nothing and keeping the previous heading,
    /// when no session is active, either stream has not delivered a sample
    /// yet, or the vectors are degenerate.
    pub fn compute_azimuth(&self) -> Option<f32> {
        let mut session = self.lock();
        if !session.tracking {
            return None;
        }
        self.fuse(&mut session)
    }

    /// Last published heading in degrees for the current or last session
    pub fn azimuth(&self) -> Option<f32> {
        self.lock().azimuth
    }

    /// Current smoothed gravity vector
    pub fn gravity(&self) -> Vector3<f32> {
        self.lock().gravity.value()
    }

    /// Current smoothed magnetic vector
    pub fn magnetic(&self) -> Vector3<f32> {
        self.lock().magnetic.value()
    }

    pub fn settings(&self) -> EstimatorSettings {
        self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn fuse(&self, session: &mut Session) -> Option<f32> {
        if !(session.gravity.is_seeded() && session.magnetic.is_seeded()) {
            return None;
        }

        let orientation = OrientationEstimate::from_vectors_with_threshold(
            session.gravity.value(),
            session.magnetic.value(),
            self.settings.free_fall_threshold,
        );
        let Some(orientation) = orientation else {
            trace!("fusion unavailable for current gravity/magnetic pair");
            return None;
        };

        let azimuth = orientation.azimuth_degrees();
        session.azimuth = Some(azimuth);
        trace!("azimuth {:.2}°", azimuth);
        self.sink.azimuth_changed(AzimuthChanged::new(azimuth));
        Some(azimuth)
    }

    // The session holds plain numbers, so a sink panic cannot leave it torn
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompassError;
    use crate::types::PLATFORM_FREE_FALL_THRESHOLD;
    use std::sync::Arc;

    fn recording_estimator() -> (HeadingEstimator<impl AzimuthSink>, Arc<Mutex<Vec<f64>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let estimator = HeadingEstimator::new(move |event: AzimuthChanged| {
            sink.lock().unwrap().push(event.new_azimuth);
        });
        (estimator, events)
    }

    #[test]
    fn test_idle_estimator_ignores_samples() {
        let (estimator, events) = recording_estimator();
        assert!(!estimator.is_tracking());
        assert_eq!(estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8)), None);
        assert_eq!(estimator.on_magnetic_sample(Vector3::new(0.0, 30.0, -40.0)), None);
        assert_eq!(estimator.gravity(), Vector3::zeros());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fusion_waits_for_both_streams() {
        let (estimator, events) = recording_estimator();
        estimator.start();

        for _ in 0..10 {
            assert_eq!(estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8)), None);
        }
        assert_eq!(estimator.compute_azimuth(), None);
        assert!(events.lock().unwrap().is_empty());

        let azimuth = estimator.on_magnetic_sample(Vector3::new(0.0, 30.0, -40.0));
        assert!(azimuth.is_some());
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_every_fusion_notifies() {
        let (estimator, events) = recording_estimator();
        estimator.start();
        estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8));

        for _ in 0..5 {
            estimator.on_magnetic_sample(Vector3::new(0.0, 30.0, -40.0));
        }
        estimator.compute_azimuth();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 6);
        assert!(events.iter().all(|azimuth| azimuth.abs() < 1e-3));
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let (estimator, events) = recording_estimator();
        estimator.start();
        estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8));
        let before = estimator.gravity();

        assert_eq!(estimator.on_gravity_sample(Vector3::new(f32::NAN, 0.0, 9.8)), None);
        assert_eq!(estimator.on_magnetic_sample(Vector3::new(0.0, f32::INFINITY, 0.0)), None);
        assert_eq!(estimator.gravity(), before);
        assert_eq!(estimator.magnetic(), Vector3::zeros());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_fusion_keeps_previous_azimuth() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let settings = EstimatorSettings {
            smoothing: 0.0,
            ..Default::default()
        };
        let estimator = HeadingEstimator::with_settings(settings, move |event: AzimuthChanged| {
            sink.lock().unwrap().push(event.new_azimuth);
        })
        .unwrap();
        estimator.start();
        estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8));
        let first = estimator.on_magnetic_sample(Vector3::new(-30.0, 0.0, -40.0)).unwrap();
        assert!((first - 90.0).abs() < 1e-3);

        // Field parallel to gravity
        assert_eq!(estimator.on_magnetic_sample(Vector3::new(0.0, 0.0, 50.0)), None);
        assert_eq!(estimator.azimuth(), Some(first));
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stop_policy() {
        let (estimator, _events) = recording_estimator();
        assert!(!estimator.stop());

        estimator.start();
        assert!(estimator.stop());
        assert!(!estimator.stop());
        assert_eq!(estimator.compute_azimuth(), None);
    }

    #[test]
    fn test_start_resets_session() {
        let (estimator, _events) = recording_estimator();
        estimator.start();
        estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8));
        estimator.on_magnetic_sample(Vector3::new(0.0, 30.0, -40.0));
        assert!(estimator.azimuth().is_some());

        estimator.start();
        assert_eq!(estimator.gravity(), Vector3::zeros());
        assert_eq!(estimator.magnetic(), Vector3::zeros());
        assert_eq!(estimator.azimuth(), None);
    }

    #[test]
    fn test_invalid_settings() {
        let settings = EstimatorSettings {
            smoothing: 1.0,
            ..Default::default()
        };
        let result = HeadingEstimator::with_settings(settings, |_: AzimuthChanged| {});
        assert!(matches!(result, Err(CompassError::InvalidSettings(_))));
    }

    #[test]
    fn test_free_fall_threshold_delays_fusion() {
        let settings = EstimatorSettings {
            free_fall_threshold: Some(PLATFORM_FREE_FALL_THRESHOLD),
            ..Default::default()
        };
        let estimator = HeadingEstimator::with_settings(settings, |_: AzimuthChanged| {}).unwrap();
        estimator.start();
        estimator.on_magnetic_sample(Vector3::new(0.0, 30.0, -40.0));

        // 1 - 0.97^n must reach 0.1 before gravity is trusted
        let mut first_fusion = None;
        for n in 1..=40 {
            if estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.81)).is_some() {
                first_fusion = Some(n);
                break;
            }
        }
        assert_eq!(first_fusion, Some(4));
    }

    #[test]
    fn test_poisoned_lock_recovers() {
        fn failing_sink(_: AzimuthChanged) {
            panic!("sink failure")
        }

        let estimator = Arc::new(HeadingEstimator::new(failing_sink));
        estimator.start();
        estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.8));

        let panicking = Arc::clone(&estimator);
        let result = std::thread::spawn(move || {
            panicking.on_magnetic_sample(Vector3::new(0.0, 30.0, -40.0));
        })
        .join();
        assert!(result.is_err());

        assert!(estimator.is_tracking());
        assert!(estimator.stop());
    }
}
