//! Capability and capacity record of a toy.
//!
//! [`Capabilities`] is derived from a device's attribute map at connect time,
//! or from an `AddToy` announcement for remote toys. Step counts use `-1` for
//! "not supported", matching the peer wire format.

use crate::config::SessionConfig;
use crate::device::{AttributeMap, MessageAttributeType};
use serde::{Deserialize, Serialize};

/// Capacity value meaning "no such channel".
pub const UNSUPPORTED: i32 = -1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_rotate: bool,
    pub supports_linear: bool,
    pub supports_two_vibrators: bool,
    pub supports_battery_level: bool,
    /// Primary vibration step count.
    pub max_speed: i32,
    /// Secondary vibration step count.
    pub max_speed2: i32,
    /// Linear axis step count.
    pub max_linear: i32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_rotate: false,
            supports_linear: false,
            supports_two_vibrators: false,
            supports_battery_level: false,
            max_speed: 20,
            max_speed2: UNSUPPORTED,
            max_linear: UNSUPPORTED,
        }
    }
}

impl Capabilities {
    /// Read capabilities from a device attribute map.
    pub fn from_attributes(attrs: &AttributeMap, config: &SessionConfig) -> Self {
        let mut caps = Capabilities {
            max_speed: config.default_max_speed,
            ..Default::default()
        };

        if let Some(linear) = attrs.get(&MessageAttributeType::LinearCmd) {
            caps.supports_linear = true;
            caps.max_linear = first_step(linear.step_count.as_deref())
                .unwrap_or(config.default_max_speed);
        }
        caps.supports_rotate = attrs.contains_key(&MessageAttributeType::RotateCmd);
        caps.supports_battery_level = attrs.contains_key(&MessageAttributeType::BatteryLevelCmd);

        if let Some(vibrate) = attrs.get(&MessageAttributeType::VibrateCmd) {
            let steps = vibrate.step_count.as_deref().unwrap_or_default();
            if let Some(max) = first_step(Some(steps)) {
                caps.max_speed = max;
            }
            if steps.len() == 2 {
                if let Ok(max2) = i32::try_from(steps[1]) {
                    caps.supports_two_vibrators = true;
                    caps.max_speed2 = max2;
                }
            }
        }
        caps
    }

    /// Capabilities carried by a peer announcement.
    pub fn announced(max_speed: i32, max_speed2: i32, max_linear: i32, supports_rotate: bool) -> Self {
        Capabilities {
            supports_rotate,
            supports_linear: max_linear != UNSUPPORTED,
            supports_two_vibrators: max_speed2 != UNSUPPORTED,
            supports_battery_level: false,
            max_speed,
            max_speed2,
            max_linear,
        }
    }

    /// Fold a reconnected device's attribute map into the existing record.
    ///
    /// Flags only ever turn on. Capacities change only where the device
    /// reported a step count.
    pub fn merge_attributes(&mut self, attrs: &AttributeMap, config: &SessionConfig) {
        let report = Capabilities::from_attributes(attrs, config);
        self.supports_rotate |= report.supports_rotate;
        self.supports_linear |= report.supports_linear;
        self.supports_two_vibrators |= report.supports_two_vibrators;
        self.supports_battery_level |= report.supports_battery_level;
        let vibrate_steps = attrs
            .get(&MessageAttributeType::VibrateCmd)
            .and_then(|v| first_step(v.step_count.as_deref()));
        if let Some(max) = vibrate_steps {
            self.max_speed = max;
        }
        if report.max_speed2 != UNSUPPORTED {
            self.max_speed2 = report.max_speed2;
        }
        if report.max_linear != UNSUPPORTED {
            self.max_linear = report.max_linear;
        }
    }

    /// Fold a repeated peer announcement into the existing record.
    ///
    /// Newly announced channels are enabled; capacities and the rotate flag are
    /// replaced as announced.
    pub fn merge_announced(&mut self, report: &Capabilities) {
        self.supports_two_vibrators |= report.supports_two_vibrators;
        self.supports_linear |= report.supports_linear;
        self.supports_rotate = report.supports_rotate;
        self.max_speed = report.max_speed;
        self.max_speed2 = report.max_speed2;
        self.max_linear = report.max_linear;
    }
}

/// First step count, if present and representable.
fn first_step(steps: Option<&[u32]>) -> Option<i32> {
    steps
        .and_then(|s| s.first())
        .and_then(|&n| i32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MessageAttributes;

    fn attrs(entries: &[(MessageAttributeType, &[u32])]) -> AttributeMap {
        entries
            .iter()
            .map(|(kind, steps)| (*kind, MessageAttributes::with_steps(steps)))
            .collect()
    }

    #[test]
    fn single_vibrator() {
        let caps = Capabilities::from_attributes(
            &attrs(&[(MessageAttributeType::VibrateCmd, &[10])]),
            &SessionConfig::default(),
        );
        assert_eq!(caps.max_speed, 10);
        assert_eq!(caps.max_speed2, UNSUPPORTED);
        assert!(!caps.supports_two_vibrators);
        assert!(!caps.supports_linear);
    }

    #[test]
    fn two_vibrators_rotate_battery() {
        let caps = Capabilities::from_attributes(
            &attrs(&[
                (MessageAttributeType::VibrateCmd, &[20, 10]),
                (MessageAttributeType::RotateCmd, &[]),
                (MessageAttributeType::BatteryLevelCmd, &[]),
            ]),
            &SessionConfig::default(),
        );
        assert!(caps.supports_two_vibrators);
        assert_eq!(caps.max_speed2, 10);
        assert!(caps.supports_rotate);
        assert!(caps.supports_battery_level);
    }

    #[test]
    fn linear_without_steps_uses_default() {
        let caps = Capabilities::from_attributes(
            &attrs(&[(MessageAttributeType::LinearCmd, &[])]),
            &SessionConfig::default(),
        );
        assert!(caps.supports_linear);
        assert_eq!(caps.max_linear, 20);
        assert_eq!(caps.max_speed, 20);
    }

    #[test]
    fn announced_flags_follow_capacities() {
        let caps = Capabilities::announced(20, 5, UNSUPPORTED, true);
        assert!(caps.supports_two_vibrators);
        assert!(!caps.supports_linear);
        assert!(caps.supports_rotate);
    }

    #[test]
    fn local_merge_is_a_union() {
        let config = SessionConfig::default();
        let mut caps = Capabilities::from_attributes(
            &attrs(&[
                (MessageAttributeType::VibrateCmd, &[20, 10]),
                (MessageAttributeType::RotateCmd, &[]),
            ]),
            &config,
        );
        caps.merge_attributes(
            &attrs(&[
                (MessageAttributeType::VibrateCmd, &[15]),
                (MessageAttributeType::LinearCmd, &[50]),
            ]),
            &config,
        );
        assert!(caps.supports_two_vibrators);
        assert!(caps.supports_linear);
        assert!(caps.supports_rotate);
        assert_eq!(caps.max_speed, 15);
        assert_eq!(caps.max_speed2, 10);
        assert_eq!(caps.max_linear, 50);
    }

    #[test]
    fn reconnect_without_vibrate_keeps_step_count() {
        let config = SessionConfig::default();
        let mut caps =
            Capabilities::from_attributes(&attrs(&[(MessageAttributeType::VibrateCmd, &[10])]), &config);
        caps.merge_attributes(&attrs(&[(MessageAttributeType::LinearCmd, &[100])]), &config);
        assert_eq!(caps.max_speed, 10);
        assert_eq!(caps.max_linear, 100);
    }

    #[test]
    fn oversized_step_counts_are_unsupported() {
        let big = i32::MAX as u32 + 1;
        let caps = Capabilities::from_attributes(
            &attrs(&[
                (MessageAttributeType::VibrateCmd, &[big, big]),
                (MessageAttributeType::LinearCmd, &[big]),
            ]),
            &SessionConfig::default(),
        );
        assert_eq!(caps.max_speed, 20);
        assert!(!caps.supports_two_vibrators);
        assert_eq!(caps.max_speed2, UNSUPPORTED);
        assert_eq!(caps.max_linear, 20);
    }
}
