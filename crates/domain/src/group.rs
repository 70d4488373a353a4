//! Device groups — ordered member lists, read-only for the pipeline.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, GroupId};

/// An ordered set of devices addressed as one unit.
///
/// Members are assumed synchronized: only the FIRST member's power state is
/// sampled when resolving a group toggle. If members desynchronize, toggle
/// resolution acts on that sampled state for the whole group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub id: GroupId,
    /// Member device ids, in configuration order.
    pub devices: Vec<DeviceId>,
}

impl DeviceGroup {
    /// The member whose state represents the group.
    #[must_use]
    pub fn first_member(&self) -> Option<&DeviceId> {
        self.devices.first()
    }
}
