//! Registry of local and remote toys.
//!
//! [`ToyRegistry`] owns two tables keyed by [`ToyId`]: toys attached to this
//! process and toys announced by peers. An id lives in at most one table, and
//! entries are never removed: a disconnect disables the toy so a later
//! reconnect finds and reuses it.
//!
//! The registry is a single-writer structure. Hosts that reach it from
//! several threads wrap it in a [`SharedRegistry`].

use crate::capabilities::Capabilities;
use crate::config::SessionConfig;
use crate::device::{AttributeMap, MessageAttributes, ToyDevice};
use crate::message::{Notifier, SyncMessage};
use crate::snapshot::Snapshot;
use crate::toy::{Toy, ToyId};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Registry guarded for access from several threads.
pub type SharedRegistry = Arc<Mutex<ToyRegistry>>;

/// Result of a background battery query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatteryReport {
    pub id: ToyId,
    pub level: f64,
}

pub struct ToyRegistry {
    config: SessionConfig,
    local: HashMap<ToyId, Toy>,
    remote: HashMap<ToyId, Toy>,
    battery_tx: Sender<BatteryReport>,
    battery_rx: Receiver<BatteryReport>,
}

impl Default for ToyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToyRegistry {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let (battery_tx, battery_rx) = unbounded();
        Self {
            config,
            local: HashMap::new(),
            remote: HashMap::new(),
            battery_tx,
            battery_rx,
        }
    }

    /// Wrap for use from several threads.
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register a device from the transport's "connected" event.
    ///
    /// A known id is reconnected in place: the new handle is attached, newly
    /// reported capabilities are merged in and the toy is re-enabled. The
    /// stored speeds are cleared since the fresh device starts idle. Returns
    /// `None` if the id already belongs to a remote toy.
    pub fn connect(&mut self, device: Arc<dyn ToyDevice>) -> Option<&Toy> {
        let id = device.index();
        if self.remote.contains_key(&id) {
            log::warn!("Device [{}] conflicts with a remote toy, ignoring", id);
            return None;
        }
        let name = self.config.display_name(device.name());

        match self.local.entry(id) {
            Entry::Occupied(entry) => {
                log::info!("Device reconnected: {} [{}]", name, id);
                let toy = entry.into_mut();
                toy.capabilities_mut()
                    .merge_attributes(device.attributes(), &self.config);
                toy.set_name(name);
                toy.attach(device);
                toy.enable();
                Some(&*toy)
            }
            Entry::Vacant(entry) => {
                log::info!("Device connected: {} [{}]", name, id);
                log_attributes(id, device.attributes());

                let toy = Toy::local(device.clone(), &self.config);
                if toy.supports_battery_level() {
                    spawn_battery_query(self.battery_tx.clone(), device);
                }
                Some(&*entry.insert(toy))
            }
        }
    }

    /// Register a toy from a peer's announcement.
    ///
    /// A known id is updated in place and re-enabled. Returns `None` if the
    /// id already belongs to a local toy.
    pub fn announce(
        &mut self,
        name: &str,
        id: ToyId,
        max_speed: i32,
        max_speed2: i32,
        max_linear: i32,
        supports_rotate: bool,
    ) -> Option<&Toy> {
        if self.local.contains_key(&id) {
            log::warn!("Remote toy {} [{}] conflicts with a local device, ignoring", name, id);
            return None;
        }
        let report = Capabilities::announced(max_speed, max_speed2, max_linear, supports_rotate);

        let toy = match self.remote.entry(id) {
            Entry::Occupied(entry) => {
                let toy = entry.into_mut();
                toy.capabilities_mut().merge_announced(&report);
                toy.set_name(name.to_string());
                toy.enable();
                log::info!("Reconnected toy {}", describe(toy));
                toy
            }
            Entry::Vacant(entry) => {
                let toy = entry.insert(Toy::remote(id, name, report, &self.config));
                log::info!("Added toy {}", describe(toy));
                toy
            }
        };
        Some(&*toy)
    }

    /// Handle the transport's "disconnected" event. The entry is kept.
    pub fn disconnect(&mut self, id: ToyId, notifier: &dyn Notifier) -> bool {
        match self.local.get_mut(&id) {
            Some(toy) => {
                toy.disable(notifier);
                true
            }
            None => {
                log::debug!("Disconnect for unknown device [{}]", id);
                false
            }
        }
    }

    pub fn local(&self, id: ToyId) -> Option<&Toy> {
        self.local.get(&id)
    }

    pub fn local_mut(&mut self, id: ToyId) -> Option<&mut Toy> {
        self.local.get_mut(&id)
    }

    pub fn remote(&self, id: ToyId) -> Option<&Toy> {
        self.remote.get(&id)
    }

    pub fn remote_mut(&mut self, id: ToyId) -> Option<&mut Toy> {
        self.remote.get_mut(&id)
    }

    /// Every toy from both tables, in no particular order.
    pub fn all_toys(&self) -> impl Iterator<Item = &Toy> {
        self.local.values().chain(self.remote.values())
    }

    pub fn all_toys_mut(&mut self) -> impl Iterator<Item = &mut Toy> {
        self.local.values_mut().chain(self.remote.values_mut())
    }

    pub fn len(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    pub fn remote_len(&self) -> usize {
        self.remote.len()
    }

    /// Apply a message received from a peer.
    ///
    /// Announcements and withdrawals update the remote table. Commands drive
    /// the local toy the peer is controlling. Messages naming an unknown or
    /// inactive toy are dropped.
    pub fn handle_message(&mut self, message: SyncMessage, notifier: &dyn Notifier) {
        match message {
            SyncMessage::AddToy {
                id,
                name,
                max_speed,
                max_speed2,
                max_linear,
                supports_rotate,
            } => {
                self.announce(&name, id, max_speed, max_speed2, max_linear, supports_rotate);
            }
            SyncMessage::RemoveToy { id } => match self.remote.get_mut(&id) {
                Some(toy) => toy.disable(notifier),
                None => log::debug!("RemoveToy for unknown toy [{}]", id),
            },
            SyncMessage::SetSpeed { id, value } => {
                self.drive_local(id, |toy| toy.set_speed(value, notifier))
            }
            SyncMessage::SetSpeedEdge { id, value } => {
                self.drive_local(id, |toy| toy.set_edge_speed(value, notifier))
            }
            SyncMessage::SetAir { id, value } => {
                self.drive_local(id, |toy| toy.set_contraction(value, notifier))
            }
            SyncMessage::SetRotate { id } => self.drive_local(id, |toy| toy.rotate(notifier)),
        }
    }

    fn drive_local(&mut self, id: ToyId, command: impl FnOnce(&mut Toy)) {
        match self.local.get_mut(&id) {
            Some(toy) if toy.is_active() => command(toy),
            Some(toy) => log::debug!("Ignoring command for inactive toy {}", toy),
            None => log::debug!("Ignoring command for unknown toy [{}]", id),
        }
    }

    /// Apply finished battery queries without blocking. Returns how many.
    pub fn process_battery_reports(&mut self) -> usize {
        let reports: Vec<BatteryReport> = self.battery_rx.try_iter().collect();
        let count = reports.len();
        for report in reports {
            self.apply_battery(report);
        }
        count
    }

    /// Block up to `timeout` for one battery report and apply it.
    pub fn wait_battery_report(&mut self, timeout: Duration) -> bool {
        match self.battery_rx.recv_timeout(timeout) {
            Ok(report) => {
                self.apply_battery(report);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn apply_battery(&mut self, report: BatteryReport) {
        match self.local.get_mut(&report.id) {
            Some(toy) => {
                log::debug!("Battery {} at {:.0}%", toy, report.level * 100.0);
                toy.set_battery_level(report.level);
            }
            None => log::debug!("Battery report for unknown toy [{}]", report.id),
        }
    }

    /// Owned view of every toy, ordered by id.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_toys(self.all_toys())
    }
}

fn spawn_battery_query(tx: Sender<BatteryReport>, device: Arc<dyn ToyDevice>) {
    let id = device.index();
    let spawned = thread::Builder::new()
        .name(format!("toyhub-battery-{}", id))
        .spawn(move || match device.battery_level() {
            Ok(level) => {
                // Receiver gone means the registry was dropped; nothing to update.
                let _ = tx.send(BatteryReport { id, level });
            }
            Err(e) => log::warn!("Battery query for [{}] failed: {}", id, e),
        });
    if let Err(e) = spawned {
        log::warn!("Could not start battery query for [{}]: {}", id, e);
    }
}

fn log_attributes(id: ToyId, attributes: &AttributeMap) {
    for (kind, attrs) in attributes {
        log::info!("[{}] Allowed Message: {:?}", id, kind);
        log_attribute_details(id, attrs);
    }
}

fn log_attribute_details(id: ToyId, attrs: &MessageAttributes) {
    if let Some(actuators) = attrs.actuator_type.as_deref().filter(|a| !a.is_empty()) {
        log::debug!("[{}] ActuatorType {}", id, actuators.join(", "));
    }
    if let Some(steps) = attrs.step_count.as_deref().filter(|s| !s.is_empty()) {
        log::debug!("[{}] StepCount {:?}", id, steps);
    }
    if let Some(endpoints) = attrs.endpoints.as_deref().filter(|e| !e.is_empty()) {
        log::debug!("[{}] Endpoints {}", id, endpoints.join(", "));
    }
    if let Some(durations) = attrs.max_duration.as_deref().filter(|d| !d.is_empty()) {
        log::debug!("[{}] MaxDuration {:?}", id, durations);
    }
    for pattern in attrs.patterns.iter().flatten() {
        log::debug!("[{}] Pattern {}", id, pattern.join(", "));
    }
}

fn describe(toy: &Toy) -> String {
    let mut out = format!("Name: {}, ID: {} Max Speed: {}", toy.name(), toy.id(), toy.max_speed());
    if toy.supports_two_vibrators() {
        out.push_str(&format!(", Max Speed 2: {}", toy.max_speed2()));
    }
    if toy.supports_linear() {
        out.push_str(&format!(", Max Linear Speed: {}", toy.max_linear()));
    }
    if toy.supports_rotate() {
        out.push_str(", Supports Rotation");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_toy::VirtualToy;
    use crate::capabilities::UNSUPPORTED;
    use crate::role::Role;
    use crossbeam::channel::unbounded;

    fn hush(index: u32) -> Arc<VirtualToy> {
        Arc::new(VirtualToy::new(index, "Lovense Hush").with_vibrators(&[20]))
    }

    #[test]
    fn connect_registers_local_toy() {
        let mut reg = ToyRegistry::new();
        let toy = reg.connect(hush(1)).unwrap();
        assert_eq!(toy.name(), "Hush");
        assert!(toy.is_local());
        assert_eq!(reg.local_len(), 1);
        assert_eq!(reg.remote_len(), 0);
    }

    #[test]
    fn reconnect_reuses_entry() {
        let (tx, _rx) = unbounded::<SyncMessage>();
        let mut reg = ToyRegistry::new();
        reg.connect(hush(1));
        reg.disconnect(1, &tx);
        assert!(!reg.local(1).unwrap().is_active());

        let edge = Arc::new(VirtualToy::new(1, "Lovense Edge").with_vibrators(&[20, 20]));
        let toy = reg.connect(edge).unwrap();
        assert!(toy.is_active());
        assert_eq!(toy.name(), "Edge");
        assert!(toy.supports_two_vibrators());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn reconnect_keeps_learned_speed_steps() {
        let (tx, _rx) = unbounded::<SyncMessage>();
        let mut reg = ToyRegistry::new();
        reg.connect(Arc::new(VirtualToy::new(1, "Hush").with_vibrators(&[10])));
        reg.disconnect(1, &tx);

        let toy = reg
            .connect(Arc::new(VirtualToy::new(1, "Hush").with_linear(&[100])))
            .unwrap();
        assert_eq!(toy.max_speed(), 10);
        assert_eq!(toy.max_linear(), 100);
    }

    #[test]
    fn reconnect_resends_previous_speed() {
        let (tx, _rx) = unbounded::<SyncMessage>();
        let mut reg = ToyRegistry::new();
        reg.connect(hush(1));
        reg.local_mut(1).unwrap().set_speed(6, &tx);
        reg.disconnect(1, &tx);

        let fresh = hush(1);
        reg.connect(fresh.clone());
        assert_eq!(reg.local(1).unwrap().last_speed(), 0);
        reg.local_mut(1).unwrap().set_speed(6, &tx);
        assert_eq!(fresh.commands().len(), 1);
    }

    #[test]
    fn announce_then_reannounce() {
        let mut reg = ToyRegistry::new();
        reg.announce("Hush", 4, 20, UNSUPPORTED, UNSUPPORTED, false);
        let toy = reg.announce("Edge", 4, 20, 10, 30, true).unwrap();
        assert_eq!(toy.name(), "Edge");
        assert!(toy.supports_two_vibrators());
        assert!(toy.supports_linear());
        assert!(toy.supports_rotate());
        assert_eq!(toy.max_speed2(), 10);
        assert_eq!(reg.remote_len(), 1);
    }

    #[test]
    fn ids_stay_in_one_table() {
        let mut reg = ToyRegistry::new();
        reg.connect(hush(2));
        assert!(reg.announce("Hush", 2, 20, UNSUPPORTED, UNSUPPORTED, false).is_none());

        reg.announce("Nora", 3, 20, UNSUPPORTED, UNSUPPORTED, true);
        assert!(reg.connect(hush(3)).is_none());
        assert_eq!(reg.local_len(), 1);
        assert_eq!(reg.remote_len(), 1);
    }

    #[test]
    fn inbound_commands_drive_local_toys() {
        let (tx, rx) = unbounded::<SyncMessage>();
        let device = hush(0);
        let mut reg = ToyRegistry::new();
        reg.connect(device.clone());

        reg.handle_message(SyncMessage::SetSpeed { id: 0, value: 10 }, &tx);
        reg.handle_message(SyncMessage::SetSpeed { id: 99, value: 10 }, &tx);
        assert_eq!(reg.local(0).unwrap().last_speed(), 10);
        assert_eq!(device.commands().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn inbound_commands_skip_inactive_toys() {
        let (tx, _rx) = unbounded::<SyncMessage>();
        let device = hush(0);
        let mut reg = ToyRegistry::new();
        reg.connect(device.clone());
        reg.disconnect(0, &tx);

        reg.handle_message(SyncMessage::SetSpeed { id: 0, value: 10 }, &tx);
        assert_eq!(reg.local(0).unwrap().last_speed(), 0);
        assert!(device.commands().is_empty());
    }

    #[test]
    fn inbound_add_and_remove() {
        let (tx, rx) = unbounded::<SyncMessage>();
        let mut reg = ToyRegistry::new();
        reg.handle_message(
            SyncMessage::AddToy {
                id: 8,
                name: "Max".into(),
                max_speed: 20,
                max_speed2: UNSUPPORTED,
                max_linear: 10,
                supports_rotate: false,
            },
            &tx,
        );
        assert_eq!(reg.remote(8).unwrap().role(), Role::Shared);

        reg.handle_message(SyncMessage::RemoveToy { id: 8 }, &tx);
        reg.handle_message(SyncMessage::RemoveToy { id: 9 }, &tx);
        let toy = reg.remote(8).unwrap();
        assert!(!toy.is_active());
        assert_eq!(toy.role(), Role::None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn battery_is_read_in_background() {
        let mut reg = ToyRegistry::new();
        let device = Arc::new(VirtualToy::new(5, "Hush").with_vibrators(&[20]).with_battery(0.75));
        let toy = reg.connect(device).unwrap();
        assert!(toy.supports_battery_level());

        assert!(reg.wait_battery_report(Duration::from_secs(5)));
        assert_eq!(reg.local(5).unwrap().battery_level(), Some(0.75));
    }

    #[test]
    fn no_battery_query_without_support() {
        let mut reg = ToyRegistry::new();
        reg.connect(hush(1));
        assert!(!reg.wait_battery_report(Duration::from_millis(50)));
        assert_eq!(reg.process_battery_reports(), 0);
        assert_eq!(reg.local(1).unwrap().battery_level(), None);
    }

    #[test]
    fn describe_lists_capabilities() {
        let mut reg = ToyRegistry::new();
        let toy = reg.announce("Edge", 1, 20, 10, UNSUPPORTED, true).unwrap();
        assert_eq!(
            describe(toy),
            "Name: Edge, ID: 1 Max Speed: 20, Max Speed 2: 10, Supports Rotation"
        );
    }
}
