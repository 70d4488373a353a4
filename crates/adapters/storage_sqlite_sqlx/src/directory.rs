//! `SQLite` implementations of the read-only directory ports.

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumeq_app::ports::{DeviceDirectory, GroupDirectory};
use lumeq_domain::device::{Brand, Device, PowerState};
use lumeq_domain::error::LumeqError;
use lumeq_domain::group::DeviceGroup;
use lumeq_domain::id::{DeviceId, GroupId};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Device`].
struct DeviceWrapper(Device);

impl DeviceWrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for DeviceWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device: String = row.try_get("device")?;
        let model: String = row.try_get("model")?;
        let brand: String = row.try_get("brand")?;
        let power_state: String = row.try_get("power_state")?;

        let brand = Brand::from_str(&brand).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let power_state =
            PowerState::from_str(&power_state).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Device {
            device: DeviceId::from(device),
            model,
            brand,
            power_state,
        }))
    }
}

const SELECT_DEVICE: &str = "SELECT * FROM devices WHERE device = ?";
const SELECT_GROUP: &str = "SELECT id, devices FROM device_groups WHERE id = ?";

/// `SQLite`-backed device directory.
pub struct SqliteDeviceDirectory {
    pool: SqlitePool,
}

impl SqliteDeviceDirectory {
    /// Create a new directory using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceDirectory for SqliteDeviceDirectory {
    fn get_device(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LumeqError>> + Send {
        let pool = self.pool.clone();
        let id = id.as_str().to_string();
        async move {
            let row: Option<DeviceWrapper> = sqlx::query_as(SELECT_DEVICE)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(DeviceWrapper::maybe(row))
        }
    }
}

/// `SQLite`-backed group directory. Member lists live in a JSON column.
pub struct SqliteGroupDirectory {
    pool: SqlitePool,
}

impl SqliteGroupDirectory {
    /// Create a new directory using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl GroupDirectory for SqliteGroupDirectory {
    fn get_group(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<DeviceGroup>, LumeqError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<(i64, String)> = sqlx::query_as(SELECT_GROUP)
                .bind(id.as_i64())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some((id, devices_json)) = row else {
                return Ok(None);
            };

            let devices: Vec<String> =
                serde_json::from_str(&devices_json).map_err(StorageError::from)?;

            Ok(Some(DeviceGroup {
                id: GroupId::new(id),
                devices: devices.into_iter().map(DeviceId::from).collect(),
            }))
        }
    }
}
