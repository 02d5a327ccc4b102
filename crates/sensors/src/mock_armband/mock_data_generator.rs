//! Synthetic armband telemetry.
//!
//! EMG amplitude follows the current pose: each gesture drives a subset of
//! electrodes, rest leaves only baseline noise. Orientation drifts slowly
//! around all three axes and the accelerometer reports gravity in the
//! sensor frame plus noise.

use std::f32::consts::PI;

use log::trace;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use emg_types::{EmgSample, Pose, Quaternion, SensorError, Vector3, EMG_CHANNELS};

/// Baseline noise amplitude on a relaxed arm.
const REST_AMPLITUDE: f32 = 4.0;
/// Peak amplitude of an active electrode.
const ACTIVE_AMPLITUDE: f32 = 70.0;

/// Relative activation of each electrode for a pose.
pub fn activation(pose: Pose) -> [f32; EMG_CHANNELS] {
    match pose {
        Pose::Fist => [1.0; EMG_CHANNELS],
        Pose::WaveIn => [1.0, 0.9, 0.7, 0.3, 0.1, 0.1, 0.3, 0.7],
        Pose::WaveOut => [0.1, 0.3, 0.7, 1.0, 0.9, 0.7, 0.3, 0.1],
        Pose::FingersSpread => [0.6, 0.4, 0.6, 0.4, 0.6, 0.4, 0.6, 0.4],
        Pose::DoubleTap => [0.3; EMG_CHANNELS],
        Pose::Rest | Pose::Unknown => [0.0; EMG_CHANNELS],
    }
}

pub fn quaternion_from_euler(roll: f32, pitch: f32, yaw: f32) -> Quaternion {
    let (sr, cr) = (roll / 2.0).sin_cos();
    let (sp, cp) = (pitch / 2.0).sin_cos();
    let (sy, cy) = (yaw / 2.0).sin_cos();
    Quaternion {
        w: cr * cp * cy + sr * sp * sy,
        x: sr * cp * cy - cr * sp * sy,
        y: cr * sp * cy + sr * cp * sy,
        z: cr * cp * sy - sr * sp * cy,
    }
}

/// Slowly wandering arm orientation at `t_secs`.
pub fn gen_orientation(t_secs: f32) -> Quaternion {
    let roll = 0.6 * (2.0 * PI * 0.05 * t_secs).sin();
    let pitch = 0.4 * (2.0 * PI * 0.08 * t_secs).sin();
    let yaw = 1.2 * (2.0 * PI * 0.03 * t_secs).sin();
    quaternion_from_euler(roll, pitch, yaw)
}

/// Next pose in the simulated gesture sequence; rest between gestures.
pub fn next_pose<R: Rng>(rng: &mut R, current: Pose) -> Pose {
    if current.is_gesture() {
        Pose::Rest
    } else {
        Pose::GESTURES[rng.gen_range(0..Pose::GESTURES.len())]
    }
}

/// Noise sources for the simulated sensors.
#[derive(Debug, Clone)]
pub struct SignalModel {
    emg_noise: Normal<f32>,
    accel_noise: Normal<f32>,
    gyro_noise: Normal<f32>,
}

impl SignalModel {
    pub fn new() -> Result<Self, SensorError> {
        let normal = |sigma: f32| {
            Normal::new(0.0f32, sigma)
                .map_err(|e| SensorError::InvalidConfig(format!("noise sigma {}: {}", sigma, e)))
        };
        Ok(Self {
            emg_noise: normal(1.0)?,
            accel_noise: normal(0.02)?,
            gyro_noise: normal(1.5)?,
        })
    }

    pub fn emg<R: Rng>(&self, rng: &mut R, pose: Pose) -> EmgSample {
        let levels = activation(pose);
        let mut out = [0i8; EMG_CHANNELS];
        for (value, level) in out.iter_mut().zip(levels) {
            let amplitude = REST_AMPLITUDE + ACTIVE_AMPLITUDE * level;
            let x = self.emg_noise.sample(rng) * amplitude;
            *value = x.round().clamp(i8::MIN as f32, i8::MAX as f32) as i8;
        }
        trace!("EMG frame for {}: {:?}", pose, out);
        EmgSample(out)
    }

    /// Gravity in the sensor frame for orientation `q`, in g.
    pub fn accelerometer<R: Rng>(&self, rng: &mut R, q: &Quaternion) -> Vector3 {
        // World z expressed in the body frame.
        let gx = 2.0 * (q.x * q.z - q.w * q.y);
        let gy = 2.0 * (q.y * q.z + q.w * q.x);
        let gz = 1.0 - 2.0 * (q.x * q.x + q.y * q.y);
        Vector3::new(
            gx + self.accel_noise.sample(rng),
            gy + self.accel_noise.sample(rng),
            gz + self.accel_noise.sample(rng),
        )
    }

    pub fn gyroscope<R: Rng>(&self, rng: &mut R) -> Vector3 {
        Vector3::new(
            self.gyro_noise.sample(rng),
            self.gyro_noise.sample(rng),
            self.gyro_noise.sample(rng),
        )
    }
}
