pub mod mock_armband;
pub mod orientation;
pub mod scripted;
pub mod snapshot;
pub mod types;

// Re-export the main types that users need
pub use mock_armband::MockHub;
pub use orientation::{buckets, discretize, euler_angles, EulerAngles, OrientationBuckets};
pub use scripted::ScriptedHub;
pub use snapshot::{DeviceSnapshot, SnapshotListener, ACCEL_SCALE};
pub use types::{dispatch, DeviceControl, DeviceListener, Hub};

use emg_types::{HubBackend, HubConfig, SensorError};

/// Build the hub selected by `config`.
pub fn create_hub(config: &HubConfig) -> Result<Box<dyn Hub>, SensorError> {
    match config.backend {
        HubBackend::Mock => Ok(Box::new(MockHub::new(
            config.application_id.clone(),
            config.mock.clone(),
        )?)),
    }
}
