//! The Toy entity.
//!
//! A [`Toy`] is one haptic device, either attached to this process (local) or
//! owned by a peer (remote). Every state-changing operation follows the same
//! shape:
//! 1. drop the call if the stored value already matches,
//! 2. store the new value,
//! 3. drive the device if local, otherwise emit a [`SyncMessage`] so the
//!    owning peer applies it to its own hardware.
//!
//! Device failures are logged and the command is dropped; the stored value is
//! kept so repeating the call stays a no-op.

use crate::capabilities::Capabilities;
use crate::config::SessionConfig;
use crate::device::{DeviceError, ToyDevice};
use crate::message::{Notifier, SyncMessage};
use crate::role::Role;
use std::fmt;
use std::sync::Arc;

/// Device identifier, unique within its registry table.
pub type ToyId = u32;

pub struct Toy {
    id: ToyId,
    name: String,
    role: Role,
    active: bool,
    device: Option<Arc<dyn ToyDevice>>,
    caps: Capabilities,
    last_speed: i32,
    last_edge_speed: i32,
    last_contraction: i32,
    clockwise: bool,
    battery_level: Option<f64>,
    linear_move_ms: u32,
}

impl Toy {
    /// Toy backed by a device attached to this process.
    pub(crate) fn local(device: Arc<dyn ToyDevice>, config: &SessionConfig) -> Self {
        let caps = Capabilities::from_attributes(device.attributes(), config);
        Toy {
            id: device.index(),
            name: config.display_name(device.name()),
            role: Role::None,
            active: true,
            device: Some(device),
            caps,
            last_speed: 0,
            last_edge_speed: 0,
            last_contraction: 0,
            clockwise: false,
            battery_level: None,
            linear_move_ms: config.linear_move_ms,
        }
    }

    /// Toy announced by a peer. It arrives already shared with us.
    pub(crate) fn remote(id: ToyId, name: &str, caps: Capabilities, config: &SessionConfig) -> Self {
        Toy {
            id,
            name: name.to_string(),
            role: Role::Shared,
            active: true,
            device: None,
            caps,
            last_speed: 0,
            last_edge_speed: 0,
            last_contraction: 0,
            clockwise: false,
            battery_level: None,
            linear_move_ms: config.linear_move_ms,
        }
    }

    pub fn id(&self) -> ToyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True iff a device handle is attached.
    pub fn is_local(&self) -> bool {
        self.device.is_some()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn supports_rotate(&self) -> bool {
        self.caps.supports_rotate
    }

    pub fn supports_linear(&self) -> bool {
        self.caps.supports_linear
    }

    pub fn supports_two_vibrators(&self) -> bool {
        self.caps.supports_two_vibrators
    }

    pub fn supports_battery_level(&self) -> bool {
        self.caps.supports_battery_level
    }

    pub fn max_speed(&self) -> i32 {
        self.caps.max_speed
    }

    pub fn max_speed2(&self) -> i32 {
        self.caps.max_speed2
    }

    pub fn max_linear(&self) -> i32 {
        self.caps.max_linear
    }

    pub fn last_speed(&self) -> i32 {
        self.last_speed
    }

    pub fn last_edge_speed(&self) -> i32 {
        self.last_edge_speed
    }

    pub fn last_contraction(&self) -> i32 {
        self.last_contraction
    }

    pub fn clockwise(&self) -> bool {
        self.clockwise
    }

    /// Last reported battery level, if the device has answered yet.
    pub fn battery_level(&self) -> Option<f64> {
        self.battery_level
    }

    pub(crate) fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.caps
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Attach a fresh handle. The new device starts idle, so the stored
    /// command state is cleared and the next command is always sent.
    pub(crate) fn attach(&mut self, device: Arc<dyn ToyDevice>) {
        self.device = Some(device);
        self.last_speed = 0;
        self.last_edge_speed = 0;
        self.last_contraction = 0;
        self.clockwise = false;
    }

    pub(crate) fn set_battery_level(&mut self, level: f64) {
        self.battery_level = Some(level);
    }

    /// Offer an active local toy to peers.
    ///
    /// Cycling never reaches [`Role::Shared`]; this is the only way in. The
    /// next [`change_role`](Self::change_role) withdraws the offer.
    pub fn share(&mut self, notifier: &dyn Notifier) {
        if !self.active || !self.is_local() || self.role == Role::Shared {
            return;
        }
        self.role = Role::Shared;
        log::info!("Sharing toy: {}", self);
        notifier.send_message(SyncMessage::add_toy(self));
    }

    /// Advance to the next role. Ignored while inactive.
    ///
    /// A local toy leaving [`Role::Shared`] withdraws its offer from peers.
    pub fn change_role(&mut self, notifier: &dyn Notifier) {
        if !self.active {
            return;
        }
        let previous = self.role;
        self.role = previous.next(self.caps.supports_two_vibrators);
        log::debug!("{} role {:?} -> {:?}", self, previous, self.role);

        if self.is_local() && previous == Role::Shared {
            notifier.send_message(SyncMessage::RemoveToy { id: self.id });
        }
    }

    /// Deactivate and unassign. A local toy withdraws itself from peers.
    pub fn disable(&mut self, notifier: &dyn Notifier) {
        if !self.active {
            return;
        }
        self.active = false;
        self.role = Role::None;
        log::info!("Disabled toy: {}", self);

        if self.is_local() {
            notifier.send_message(SyncMessage::RemoveToy { id: self.id });
        }
    }

    /// Reactivate. The role stays as it was.
    pub fn enable(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        log::info!("Enabled toy: {}", self);
    }

    pub fn set_speed(&mut self, speed: i32, notifier: &dyn Notifier) {
        if speed == self.last_speed {
            return;
        }
        self.last_speed = speed;

        match &self.device {
            Some(device) => {
                let sent = if self.caps.supports_two_vibrators {
                    device.send_vibrate_channels(self.channel_ratios())
                } else {
                    device.send_vibrate(ratio(speed, self.caps.max_speed))
                };
                self.report(sent);
            }
            None => notifier.send_message(SyncMessage::SetSpeed { id: self.id, value: speed }),
        }
    }

    /// Secondary channel. Only meaningful on two-vibrator toys.
    pub fn set_edge_speed(&mut self, speed: i32, notifier: &dyn Notifier) {
        if speed == self.last_edge_speed {
            return;
        }
        self.last_edge_speed = speed;

        match &self.device {
            Some(device) => self.report(device.send_vibrate_channels(self.channel_ratios())),
            None => notifier.send_message(SyncMessage::SetSpeedEdge { id: self.id, value: speed }),
        }
    }

    /// Move the linear axis to step `position`.
    pub fn set_contraction(&mut self, position: i32, notifier: &dyn Notifier) {
        if position == self.last_contraction {
            return;
        }
        self.last_contraction = position;

        match &self.device {
            Some(device) => self.report(
                device.send_linear(self.linear_move_ms, ratio(position, self.caps.max_linear)),
            ),
            None => notifier.send_message(SyncMessage::SetAir { id: self.id, value: position }),
        }
    }

    /// Flip rotation direction at the current speed.
    ///
    /// A remote toy leaves `clockwise` alone; the owning peer flips its own.
    pub fn rotate(&mut self, notifier: &dyn Notifier) {
        match &self.device {
            Some(device) => {
                self.clockwise = !self.clockwise;
                let speed = ratio(self.last_speed, self.caps.max_speed);
                self.report(device.send_rotate(speed, self.clockwise));
            }
            None => notifier.send_message(SyncMessage::SetRotate { id: self.id }),
        }
    }

    fn channel_ratios(&self) -> [f64; 2] {
        [
            ratio(self.last_speed, self.caps.max_speed),
            ratio(self.last_edge_speed, self.caps.max_speed2),
        ]
    }

    fn report(&self, sent: Result<(), DeviceError>) {
        match sent {
            Ok(()) => {}
            Err(DeviceError::Unavailable) => log::error!("Toy not connected: {}", self),
            Err(DeviceError::Unsupported(kind)) => {
                log::warn!("Toy {} does not accept {:?}, command dropped", self, kind)
            }
        }
    }
}

impl fmt::Display for Toy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

impl fmt::Debug for Toy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toy")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("active", &self.active)
            .field("local", &self.is_local())
            .field("caps", &self.caps)
            .field("last_speed", &self.last_speed)
            .field("last_edge_speed", &self.last_edge_speed)
            .field("last_contraction", &self.last_contraction)
            .field("clockwise", &self.clockwise)
            .field("battery_level", &self.battery_level)
            .finish()
    }
}

/// `value / max`, or 0 when the channel has no capacity.
fn ratio(value: i32, max: i32) -> f64 {
    if max <= 0 {
        0.0
    } else {
        f64::from(value) / f64::from(max)
    }
}
