use fusion_compass::{AzimuthChanged, HeadingEstimator};
use nalgebra::Vector3;

const SAMPLE_COUNT: usize = 50; // 1 s at the 50 Hz game rate

fn main() {
    let estimator = HeadingEstimator::new(|event: AzimuthChanged| {
        println!("{}: {:.2}°", event.name(), event.new_azimuth);
    });

    estimator.start();

    for i in 0..SAMPLE_COUNT {
        // this loop should run each time the platform delivers new readings
        let heading = (i as f32 * 2.0).to_radians();
        let gravity = Vector3::new(0.0, 0.0, 9.81); // replace this with actual accelerometer data in m/s²
        let magnetic = Vector3::new(-22.0 * heading.sin(), 22.0 * heading.cos(), -42.0); // replace this with actual magnetometer data in µT

        estimator.on_gravity_sample(gravity);
        estimator.on_magnetic_sample(magnetic);
    }

    estimator.stop();
}
