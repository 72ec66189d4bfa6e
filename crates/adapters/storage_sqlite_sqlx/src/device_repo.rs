//! `SQLite` implementation of [`DeviceRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use statehub_app::ports::DeviceRepository;
use statehub_domain::Timestamp;
use statehub_domain::device::{Device, DeviceType};
use statehub_domain::error::{ConflictError, HubError, NotFoundError};
use statehub_domain::id::DeviceId;

use crate::error::{StorageError, decode};

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device_id: String = row.try_get("device_id")?;
        let device_type: String = row.try_get("device_type")?;
        let last_state: Option<String> = row.try_get("last_state")?;
        let last_updated: Option<String> = row.try_get("last_updated")?;

        let device_id = DeviceId::new(device_id).map_err(decode)?;
        let device_type = DeviceType::from_str(&device_type).map_err(decode)?;
        let last_updated = last_updated
            .map(|s| chrono::DateTime::parse_from_rfc3339(&s).map(|t| t.to_utc()))
            .transpose()
            .map_err(decode)?;

        Ok(Self(Device {
            device_id,
            device_type,
            last_state,
            last_updated,
        }))
    }
}

const INSERT: &str = "INSERT INTO devices (device_id, device_type, last_state, last_updated) VALUES (?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE device_id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY device_id";
const UPDATE: &str =
    "UPDATE devices SET device_type = ?, last_state = ?, last_updated = ? WHERE device_id = ?";
const UPDATE_STATE: &str =
    "UPDATE devices SET last_state = ?, last_updated = ? WHERE device_id = ?";
const DELETE_BY_ID: &str = "DELETE FROM devices WHERE device_id = ?";

fn not_found(id: &DeviceId) -> HubError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed device registry.
#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    async fn create(&self, device: Device) -> Result<Device, HubError> {
        let result = sqlx::query(INSERT)
            .bind(device.device_id.as_str())
            .bind(device.device_type.as_str())
            .bind(&device.last_state)
            .bind(device.last_updated.map(|t| t.to_rfc3339()))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(device),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(ConflictError {
                entity: "Device",
                id: device.device_id.to_string(),
            }
            .into()),
            Err(err) => Err(StorageError::from(err).into()),
        }
    }

    async fn get_by_id(&self, id: &DeviceId) -> Result<Option<Device>, HubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Device>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, device: Device) -> Result<Device, HubError> {
        let result = sqlx::query(UPDATE)
            .bind(device.device_type.as_str())
            .bind(&device.last_state)
            .bind(device.last_updated.map(|t| t.to_rfc3339()))
            .bind(device.device_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(&device.device_id));
        }
        Ok(device)
    }

    async fn update_state(
        &self,
        id: &DeviceId,
        state: &str,
        at: Timestamp,
    ) -> Result<(), HubError> {
        let result = sqlx::query(UPDATE_STATE)
            .bind(state)
            .bind(at.to_rfc3339())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: &DeviceId) -> Result<(), HubError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
