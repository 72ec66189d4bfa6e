//! `SQLite` implementation of [`RuleRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use statehub_app::ports::RuleRepository;
use statehub_domain::error::{HubError, NotFoundError};
use statehub_domain::id::RuleId;
use statehub_domain::rule::Rule;

use crate::error::StorageError;

struct Wrapper(Rule);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Rule> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;

        // stored text is returned as-is; the engine decides what compiles
        Ok(Self(
            Rule::builder()
                .id(RuleId::from_uuid(id))
                .name(row.try_get::<String, _>("name")?)
                .condition(row.try_get::<String, _>("condition")?)
                .action(row.try_get::<String, _>("action")?)
                .build_unchecked(),
        ))
    }
}

const INSERT: &str = "INSERT INTO rules (id, name, condition, action) VALUES (?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM rules WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM rules ORDER BY seq";
const DELETE_BY_ID: &str = "DELETE FROM rules WHERE id = ?";

/// `SQLite`-backed rule registry.
#[derive(Clone)]
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RuleRepository for SqliteRuleRepository {
    async fn create(&self, rule: Rule) -> Result<Rule, HubError> {
        sqlx::query(INSERT)
            .bind(rule.id.as_uuid())
            .bind(&rule.name)
            .bind(&rule.condition)
            .bind(&rule.action)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<Rule>, HubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Rule>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn delete(&self, id: RuleId) -> Result<(), HubError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
