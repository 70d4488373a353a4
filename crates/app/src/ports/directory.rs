//! Directory ports — read-only lookups maintained by external collaborators.

use std::future::Future;

use lumeq_domain::device::Device;
use lumeq_domain::error::LumeqError;
use lumeq_domain::group::DeviceGroup;
use lumeq_domain::id::{DeviceId, GroupId};

/// Lookup of device metadata (`device id → model, brand, power state`).
pub trait DeviceDirectory: Send + Sync {
    fn get_device(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LumeqError>> + Send;
}

/// Lookup of group membership (`group id → ordered device ids`).
pub trait GroupDirectory: Send + Sync {
    fn get_group(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<DeviceGroup>, LumeqError>> + Send;
}
