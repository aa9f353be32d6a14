//! Peer synchronization messages.
//!
//! [`SyncMessage`] is the logical schema exchanged with peers. The JSON form
//! is tagged by `"command"` and uses camelCase fields; capacities a device
//! does not have are encoded as `-1`.
//!
//! Delivery is fire-and-forget: a [`Notifier`] hands the message to the peer
//! channel and returns. Nothing is acknowledged or retried.

use crate::error::Error;
use crate::toy::{Toy, ToyId};
use crossbeam::channel::Sender;
use serde::{Deserialize, Serialize};

/// One notification sent to (or received from) peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all_fields = "camelCase")]
pub enum SyncMessage {
    /// A toy is offered to peers.
    AddToy {
        id: ToyId,
        name: String,
        max_speed: i32,
        max_speed2: i32,
        max_linear: i32,
        supports_rotate: bool,
    },
    /// A previously offered toy is withdrawn.
    RemoveToy { id: ToyId },
    SetSpeed { id: ToyId, value: i32 },
    /// Secondary vibration channel.
    SetSpeedEdge { id: ToyId, value: i32 },
    /// Linear contraction position.
    SetAir { id: ToyId, value: i32 },
    /// Flip rotation direction. The receiver performs the toggle.
    SetRotate { id: ToyId },
}

impl SyncMessage {
    /// Announcement describing `toy`.
    pub fn add_toy(toy: &Toy) -> Self {
        SyncMessage::AddToy {
            id: toy.id(),
            name: toy.name().to_string(),
            max_speed: toy.max_speed(),
            max_speed2: toy.max_speed2(),
            max_linear: toy.max_linear(),
            supports_rotate: toy.supports_rotate(),
        }
    }

    /// Id of the toy this message is about.
    pub fn toy_id(&self) -> ToyId {
        match *self {
            SyncMessage::AddToy { id, .. }
            | SyncMessage::RemoveToy { id }
            | SyncMessage::SetSpeed { id, .. }
            | SyncMessage::SetSpeedEdge { id, .. }
            | SyncMessage::SetAir { id, .. }
            | SyncMessage::SetRotate { id } => id,
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Outbound peer channel injected into state-mutating toy operations.
pub trait Notifier {
    fn send_message(&self, message: SyncMessage);
}

impl Notifier for Sender<SyncMessage> {
    fn send_message(&self, message: SyncMessage) {
        if let Err(e) = self.send(message) {
            log::warn!("peer channel closed, dropping {:?}", e.into_inner());
        }
    }
}

/// Discards every message. For sessions without peers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Offline;

impl Notifier for Offline {
    fn send_message(&self, message: SyncMessage) {
        log::debug!("offline, not sending {:?}", message);
    }
}
