//! Button mapping — the immutable `(remote, button)` → target table.
//!
//! Loaded once at process start from configuration; no runtime mutation.

use std::collections::HashMap;

use crate::command::AbstractCommand;
use crate::id::{DeviceId, GroupId};

/// What a button press resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum ButtonTarget {
    /// A single device receiving the command as-is (toggle templates are
    /// resolved against that device's own state).
    Device {
        device: DeviceId,
        command: AbstractCommand,
    },
    /// Every member of a group receiving one identical command (toggle
    /// templates are resolved against the first member's state).
    Group {
        group: GroupId,
        command: AbstractCommand,
    },
}

/// Immutable lookup table keyed by `(remote_name, button_number)`.
#[derive(Debug, Default, Clone)]
pub struct ButtonMap {
    entries: HashMap<(String, u8), ButtonTarget>,
}

impl ButtonMap {
    /// Build a map from `(remote, button, target)` entries. Later duplicates
    /// replace earlier ones.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, u8, ButtonTarget)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(remote, button, target)| ((remote, button), target))
                .collect(),
        }
    }

    /// Look up the target for a press, if one is configured.
    #[must_use]
    pub fn lookup(&self, remote_name: &str, button_number: u8) -> Option<&ButtonTarget> {
        self.entries
            .get(&(remote_name.to_string(), button_number))
    }

    /// Number of configured bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no bindings are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PowerState;

    fn sample_map() -> ButtonMap {
        ButtonMap::from_entries([
            (
                "living-room".to_string(),
                1,
                ButtonTarget::Device {
                    device: DeviceId::from("light-1"),
                    command: AbstractCommand::Turn(PowerState::On),
                },
            ),
            (
                "living-room".to_string(),
                2,
                ButtonTarget::Group {
                    group: GroupId::new(4),
                    command: AbstractCommand::Toggle(50),
                },
            ),
        ])
    }

    #[test]
    fn should_find_configured_binding() {
        let map = sample_map();
        let target = map.lookup("living-room", 1).unwrap();
        assert!(matches!(target, ButtonTarget::Device { .. }));
    }

    #[test]
    fn should_return_none_for_unmapped_combination() {
        let map = sample_map();
        assert!(map.lookup("living-room", 9).is_none());
        assert!(map.lookup("bedroom", 1).is_none());
    }

    #[test]
    fn should_replace_earlier_duplicate_binding() {
        let map = ButtonMap::from_entries([
            (
                "r".to_string(),
                1,
                ButtonTarget::Device {
                    device: DeviceId::from("a"),
                    command: AbstractCommand::Turn(PowerState::On),
                },
            ),
            (
                "r".to_string(),
                1,
                ButtonTarget::Device {
                    device: DeviceId::from("b"),
                    command: AbstractCommand::Turn(PowerState::Off),
                },
            ),
        ]);
        assert_eq!(map.len(), 1);
        let target = map.lookup("r", 1).unwrap();
        assert!(
            matches!(target, ButtonTarget::Device { device, .. } if device.as_str() == "b")
        );
    }
}
