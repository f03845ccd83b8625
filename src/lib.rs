//! [![github]](https://github.com/wboayue/fusion-compass)&ensp;[![crates-io]](https://crates.io/crates/fusion-compass)&ensp;[![license]](https://opensource.org/licenses/MIT)
//!
//! [github]: https://img.shields.io/badge/github-8da0cb?style=for-the-badge&labelColor=555555&logo=github
//! [crates-io]: https://img.shields.io/badge/crates.io-fc8d62?style=for-the-badge&labelColor=555555&logo=rust
//! [license]: https://img.shields.io/badge/License-MIT-blue.svg?style=for-the-badge&labelColor=555555
//!
//! Fusion Compass - a compass heading estimator for accelerometer and magnetometer streams
//!
//! This library derives a stable azimuth from two independently delivered
//! sensor streams. Each stream is smoothed by an exponential low-pass filter,
//! the smoothed pair is fused into a rotation matrix, and every successful
//! fusion is published to a subscriber as an `azimuthChanged` notification.
//!
//! # Features
//!
//! - Exponential smoothing of gravity and geomagnetic vectors
//! - Rotation and inclination matrix fusion with degeneracy detection
//! - Tilt-compensated azimuth normalized to `[0, 360)` degrees
//! - Thread-safe estimator with ordered notifications
//! - Host-facing `start_tracking`/`stop_tracking` control surface
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use fusion_compass::{AzimuthChanged, HeadingEstimator};
//!
//! let estimator = HeadingEstimator::new(|event: AzimuthChanged| {
//!     println!("heading {:.1}°", event.new_azimuth);
//! });
//!
//! estimator.start();
//!
//! // Readings arrive independently from each sensor
//! estimator.on_gravity_sample(Vector3::new(0.0, 0.0, 9.81));     // m/s²
//! estimator.on_magnetic_sample(Vector3::new(0.0, 22.0, -42.0));  // µT
//!
//! let azimuth = estimator.azimuth().unwrap();
//! assert!(azimuth < 1e-3); // Top edge facing magnetic north
//!
//! estimator.stop();
//! ```
//!
//! For more documentation and examples, see: <https://github.com/wboayue/fusion-compass>

pub mod compass;
mod error;
mod estimator;
mod filter;
mod math;
mod orientation;
mod tracking;
mod types;

// Re-export all public types and functions
pub use compass::calculate_azimuth;
pub use error::{CompassError, Result};
pub use estimator::{AzimuthSink, HeadingEstimator};
pub use filter::SmoothedVector3;
pub use math::{RAD_TO_DEG, Vector3Ext, normalize_degrees};
pub use orientation::OrientationEstimate;
pub use tracking::{CompassModule, MODULE_NAME, SampleListener, SensorProvider};
pub use types::*;
