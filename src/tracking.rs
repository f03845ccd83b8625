//! Tracking control surface between a host sensor subsystem and the estimator
//!
//! The host implements [`SensorProvider`] to deliver raw samples from its
//! platform sensors. [`CompassModule`] owns the provider for a session and
//! exposes the `start_tracking`/`stop_tracking` pair the host UI layer calls.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{CompassError, Result};
use crate::estimator::{AzimuthSink, HeadingEstimator};
use crate::types::{SamplingRate, SensorKind, SensorSample};

/// Name the module is exposed under to host bridges
pub const MODULE_NAME: &str = "Compass";

/// Receiver of raw samples from a [`SensorProvider`]
pub trait SampleListener: Send + Sync {
    fn on_sample(&self, sample: SensorSample);
}

impl<S: AzimuthSink> SampleListener for HeadingEstimator<S> {
    fn on_sample(&self, sample: SensorSample) {
        self.process(sample);
    }
}

/// Platform sensor subsystem supplying gravity and magnetic streams
///
/// Deliveries may come from any thread, before or after `register` returns.
pub trait SensorProvider {
    /// Start delivering samples of `kind` to `listener` at `rate`
    fn register(
        &mut self,
        kind: SensorKind,
        rate: SamplingRate,
        listener: Arc<dyn SampleListener>,
    ) -> Result<()>;

    /// Stop all deliveries registered through this provider
    fn unregister(&mut self);
}

/// Compass tracking session driven by a host
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use fusion_compass::{
///     AzimuthChanged, CompassModule, HeadingEstimator, Result, SampleListener, SamplingRate,
///     SensorKind, SensorProvider,
/// };
///
/// #[derive(Default)]
/// struct NullProvider {
///     listeners: Vec<(SensorKind, Arc<dyn SampleListener>)>,
/// }
///
/// impl SensorProvider for NullProvider {
///     fn register(
///         &mut self,
///         kind: SensorKind,
///         _rate: SamplingRate,
///         listener: Arc<dyn SampleListener>,
///     ) -> Result<()> {
///         self.listeners.push((kind, listener));
///         Ok(())
///     }
///
///     fn unregister(&mut self) {
///         self.listeners.clear();
///     }
/// }
///
/// let estimator = Arc::new(HeadingEstimator::new(|event: AzimuthChanged| {
///     println!("heading {:.1}°", event.new_azimuth);
/// }));
/// let mut module = CompassModule::new(NullProvider::default(), estimator);
///
/// module.start_tracking().unwrap();
/// assert!(module.is_tracking());
/// module.stop_tracking();
/// assert!(!module.is_tracking());
/// ```
pub struct CompassModule<P, S>
where
    P: SensorProvider,
    S: AzimuthSink + 'static,
{
    provider: P,
    estimator: Arc<HeadingEstimator<S>>,
    subscribed: bool,
}

impl<P, S> CompassModule<P, S>
where
    P: SensorProvider,
    S: AzimuthSink + 'static,
{
    pub fn new(provider: P, estimator: Arc<HeadingEstimator<S>>) -> Self {
        Self {
            provider,
            estimator,
            subscribed: false,
        }
    }

    pub fn name(&self) -> &'static str {
        MODULE_NAME
    }

    /// Start a session and subscribe to both sensor streams
    ///
    /// Fails with [`CompassError::InvalidState`] when already tracking. A
    /// subscription left behind by a session stopped directly on the
    /// estimator is dropped first. A registration failure unwinds the partial
    /// subscription, ends the session and is returned to the caller.
    pub fn start_tracking(&mut self) -> Result<()> {
        if self.is_tracking() {
            return Err(CompassError::InvalidState("already tracking"));
        }
        if self.subscribed {
            debug!("dropping subscription of a session stopped outside the module");
            self.provider.unregister();
            self.subscribed = false;
        }

        self.estimator.start();
        let rate = self.estimator.settings().sampling_rate;
        let listener: Arc<dyn SampleListener> = self.estimator.clone();

        for kind in [SensorKind::Gravity, SensorKind::Magnetic] {
            if let Err(err) = self.provider.register(kind, rate, Arc::clone(&listener)) {
                warn!("compass tracking not started: {}", err);
                self.provider.unregister();
                self.estimator.stop();
                return Err(err);
            }
        }

        self.subscribed = true;
        info!("compass tracking started at {:?}", rate.period());
        Ok(())
    }

    /// Unsubscribe from both streams and end the session
    ///
    /// Does nothing when neither a subscription nor a session is active.
    pub fn stop_tracking(&mut self) {
        if !self.subscribed && !self.estimator.is_tracking() {
            debug!("compass tracking already stopped");
            return;
        }

        if self.subscribed {
            self.provider.unregister();
            self.subscribed = false;
        }
        self.estimator.stop();
        info!("compass tracking stopped");
    }

    /// Whether both streams are subscribed and the estimator session is active
    pub fn is_tracking(&self) -> bool {
        self.subscribed && self.estimator.is_tracking()
    }

    pub fn estimator(&self) -> &Arc<HeadingEstimator<S>> {
        &self.estimator
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }
}

impl<P, S> Drop for CompassModule<P, S>
where
    P: SensorProvider,
    S: AzimuthSink + 'static,
{
    fn drop(&mut self) {
        self.stop_tracking();
    }
}
