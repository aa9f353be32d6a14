//! Point-in-time view of all toys.
//!
//! [`Snapshot`] is an **owned**, read-only copy of every toy's state, produced
//! by [`ToyRegistry::snapshot`](crate::registry::ToyRegistry::snapshot). It
//! holds no device handles, so it can be cloned, sent to another thread or
//! serialized for a UI.
//!
//! Rows are ordered by id. That order is for display only.

use crate::capabilities::Capabilities;
use crate::error::Error;
use crate::role::Role;
use crate::toy::{Toy, ToyId};
use serde::{Deserialize, Serialize};

/// State of one toy at snapshot time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToyState {
    pub id: ToyId,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub local: bool,
    pub capabilities: Capabilities,
    pub last_speed: i32,
    pub last_edge_speed: i32,
    pub last_contraction: i32,
    pub clockwise: bool,
    /// `None` until the device answers a battery query.
    pub battery_level: Option<f64>,
}

impl From<&Toy> for ToyState {
    fn from(toy: &Toy) -> Self {
        Self {
            id: toy.id(),
            name: toy.name().to_string(),
            role: toy.role(),
            active: toy.is_active(),
            local: toy.is_local(),
            capabilities: toy.capabilities().clone(),
            last_speed: toy.last_speed(),
            last_edge_speed: toy.last_edge_speed(),
            last_contraction: toy.last_contraction(),
            clockwise: toy.clockwise(),
            battery_level: toy.battery_level(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot(pub Vec<ToyState>);

impl Snapshot {
    pub fn from_toys<'a>(toys: impl Iterator<Item = &'a Toy>) -> Self {
        let mut rows: Vec<ToyState> = toys.map(ToyState::from).collect();
        rows.sort_by_key(|row| (row.id, !row.local));
        Snapshot(rows)
    }

    #[inline]
    pub fn get(&self, id: ToyId) -> Option<&ToyState> {
        self.0.iter().find(|row| row.id == id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ToyState> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<ToyState> {
        self.0
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}
