use crate::device::{AttributeMap, DeviceError, MessageAttributeType, MessageAttributes, ToyDevice};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A primitive command as received by a [`VirtualToy`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Vibrate(f64),
    VibrateChannels([f64; 2]),
    Linear(u32, f64),
    Rotate(f64, bool),
}

/// In-process device that records commands instead of driving hardware.
pub struct VirtualToy {
    index: u32,
    name: String,
    attributes: AttributeMap,
    battery: Option<f64>,
    connected: AtomicBool,
    commands: Mutex<Vec<Command>>,
}

impl VirtualToy {
    pub fn new(index: u32, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            attributes: AttributeMap::new(),
            battery: None,
            connected: AtomicBool::new(true),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Advertise vibration with one step count per channel.
    pub fn with_vibrators(mut self, steps: &[u32]) -> Self {
        self.attributes
            .insert(MessageAttributeType::VibrateCmd, MessageAttributes::with_steps(steps));
        self
    }

    pub fn with_linear(mut self, steps: &[u32]) -> Self {
        self.attributes
            .insert(MessageAttributeType::LinearCmd, MessageAttributes::with_steps(steps));
        self
    }

    pub fn with_rotate(mut self) -> Self {
        self.attributes
            .insert(MessageAttributeType::RotateCmd, MessageAttributes::default());
        self
    }

    /// Advertise a battery that reports `level`.
    pub fn with_battery(mut self, level: f64) -> Self {
        self.attributes
            .insert(MessageAttributeType::BatteryLevelCmd, MessageAttributes::default());
        self.battery = Some(level);
        self
    }

    /// Simulate the device dropping off (or coming back).
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Commands accepted so far, oldest first.
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn last_command(&self) -> Option<Command> {
        self.commands.lock().last().cloned()
    }

    fn record(&self, kind: MessageAttributeType, command: Command) -> Result<(), DeviceError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DeviceError::Unavailable);
        }
        if !self.attributes.contains_key(&kind) {
            return Err(DeviceError::Unsupported(kind));
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

impl ToyDevice for VirtualToy {
    fn index(&self) -> u32 {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    fn send_vibrate(&self, ratio: f64) -> Result<(), DeviceError> {
        self.record(MessageAttributeType::VibrateCmd, Command::Vibrate(ratio))
    }

    fn send_vibrate_channels(&self, ratios: [f64; 2]) -> Result<(), DeviceError> {
        self.record(MessageAttributeType::VibrateCmd, Command::VibrateChannels(ratios))
    }

    fn send_linear(&self, duration_ms: u32, position: f64) -> Result<(), DeviceError> {
        self.record(MessageAttributeType::LinearCmd, Command::Linear(duration_ms, position))
    }

    fn send_rotate(&self, speed: f64, clockwise: bool) -> Result<(), DeviceError> {
        self.record(MessageAttributeType::RotateCmd, Command::Rotate(speed, clockwise))
    }

    fn battery_level(&self) -> Result<f64, DeviceError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DeviceError::Unavailable);
        }
        self.battery
            .ok_or(DeviceError::Unsupported(MessageAttributeType::BatteryLevelCmd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_supported_commands() {
        let toy = VirtualToy::new(0, "Hush").with_vibrators(&[20]);
        toy.send_vibrate(0.5).unwrap();
        assert_eq!(
            toy.send_rotate(0.5, true),
            Err(DeviceError::Unsupported(MessageAttributeType::RotateCmd))
        );
        assert_eq!(toy.commands(), vec![Command::Vibrate(0.5)]);
    }

    #[test]
    fn disconnected_rejects_everything() {
        let toy = VirtualToy::new(0, "Hush").with_vibrators(&[20]).with_battery(0.9);
        toy.set_connected(false);
        assert_eq!(toy.send_vibrate(0.1), Err(DeviceError::Unavailable));
        assert_eq!(toy.battery_level(), Err(DeviceError::Unavailable));
        assert!(toy.commands().is_empty());
    }
}
