//! `SQLite` implementation of [`EventStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use statehub_app::ports::EventStore;
use statehub_domain::error::HubError;
use statehub_domain::event::Event;
use statehub_domain::id::{DeviceId, EventId};

use crate::error::{StorageError, decode};

struct Wrapper(Event);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let device_id: String = row.try_get("device_id")?;
        let payload: String = row.try_get("payload")?;
        let created_at: String = row.try_get("created_at")?;

        let device_id = DeviceId::new(device_id).map_err(decode)?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(decode)?
            .to_utc();

        Ok(Self(Event {
            id: EventId::from_uuid(id),
            device_id,
            payload,
            created_at,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO events (id, device_id, payload, created_at)
    VALUES (?, ?, ?, ?)
";

// `seq` rather than `created_at`: clocks may step backwards
const SELECT_RECENT: &str = "SELECT * FROM events ORDER BY seq DESC LIMIT ?";
const SELECT_BY_DEVICE: &str =
    "SELECT * FROM events WHERE device_id = ? ORDER BY seq DESC LIMIT ?";

/// `SQLite`-backed append-only event log.
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Create a new event store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EventStore for SqliteEventStore {
    async fn append(&self, event: Event) -> Result<Event, HubError> {
        sqlx::query(INSERT)
            .bind(event.id.as_uuid())
            .bind(event.device_id.as_str())
            .bind(&event.payload)
            .bind(event.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(event)
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<Event>, HubError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> Result<Vec<Event>, HubError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE)
            .bind(device_id.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
