use serde::{Deserialize, Serialize};

/// Errors raised by device backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum SensorError {
    /// No armband paired within the discovery timeout.
    #[error("Unable to find an armband within {timeout_ms} ms")]
    DeviceNotFound { timeout_ms: u64 },
    /// The hub has no connected device.
    #[error("Armband disconnected")]
    Disconnected,
    /// A backend-specific fault.
    #[error("Armband hardware fault: {0}")]
    HardwareFault(String),
    /// The event or command channel to the backend was closed.
    #[error("Device channel closed")]
    ChannelClosed,
    /// The backend rejected its configuration.
    #[error("Invalid device configuration: {0}")]
    InvalidConfig(String),
}
