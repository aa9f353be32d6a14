//! Device-transport boundary.
//!
//! A [`ToyDevice`] is one physical device exposed by the underlying transport
//! library (connect/disconnect events and primitive commands). The core never
//! enumerates or pairs devices itself; the host hands it connected handles.
//!
//! ## Attribute map
//! Each device advertises which command kinds it accepts
//! ([`MessageAttributeType`]) together with per-kind [`MessageAttributes`].
//! Only the presence of an entry and its `step_count` drive behaviour; the
//! remaining fields are logged at connect time for diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Command kinds a device may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageAttributeType {
    VibrateCmd,
    LinearCmd,
    RotateCmd,
    BatteryLevelCmd,
    StopDeviceCmd,
}

/// Attributes attached to one advertised command kind.
///
/// All fields are optional; transports populate what the device reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageAttributes {
    /// Actuator kinds (e.g. `"Vibrate"`, `"Oscillate"`).
    pub actuator_type: Option<Vec<String>>,
    /// Step count per actuator. Two entries means two independent channels.
    pub step_count: Option<Vec<u32>>,
    pub endpoints: Option<Vec<String>>,
    pub max_duration: Option<Vec<u32>>,
    pub patterns: Option<Vec<Vec<String>>>,
}

impl MessageAttributes {
    /// Attributes carrying only step counts.
    pub fn with_steps(steps: &[u32]) -> Self {
        Self {
            step_count: Some(steps.to_vec()),
            ..Default::default()
        }
    }
}

/// Advertised command kinds of a device.
pub type AttributeMap = HashMap<MessageAttributeType, MessageAttributes>;

/// Failure reported by a device primitive.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeviceError {
    /// The device went away or refused the command.
    #[error("device is not connected")]
    Unavailable,

    /// The device does not accept this command kind.
    #[error("device does not support {0:?}")]
    Unsupported(MessageAttributeType),
}

/// A connected device handle owned by this process.
///
/// Primitives are fire-and-forget from the caller's point of view: they return
/// once the transport has accepted (or rejected) the command.
/// `battery_level` may block and is only ever called off the control thread.
pub trait ToyDevice: Send + Sync {
    /// Transport-assigned device index.
    fn index(&self) -> u32;

    /// Raw device name as reported by the transport.
    fn name(&self) -> &str;

    fn attributes(&self) -> &AttributeMap;

    /// Single-channel vibration at `ratio` in `[0, 1]`.
    fn send_vibrate(&self, ratio: f64) -> Result<(), DeviceError>;

    /// Two-channel vibration, one ratio per actuator.
    fn send_vibrate_channels(&self, ratios: [f64; 2]) -> Result<(), DeviceError>;

    /// Move the linear axis to `position` over `duration_ms`.
    fn send_linear(&self, duration_ms: u32, position: f64) -> Result<(), DeviceError>;

    fn send_rotate(&self, speed: f64, clockwise: bool) -> Result<(), DeviceError>;

    /// Battery level in `[0, 1]`.
    fn battery_level(&self) -> Result<f64, DeviceError>;
}
