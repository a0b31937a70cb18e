use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{StorageError, StorageResult};

/// Kind of finance record, one table per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Income,
    Expense,
    Salary,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Income, RecordKind::Expense, RecordKind::Salary];

    /// Table backing this kind
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expense",
            RecordKind::Salary => "salary",
        }
    }

    /// Parse a URL path segment into a record kind
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "income" => Some(RecordKind::Income),
            "expense" => Some(RecordKind::Expense),
            "salary" => Some(RecordKind::Salary),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Income => "Income",
            RecordKind::Expense => "Expense",
            RecordKind::Salary => "Salary",
        };
        write!(f, "{name}")
    }
}

/// Stored finance record
#[derive(Debug, Clone)]
pub struct Record {
    pub id: i64,
    pub value: f64,
    pub category: String,
    pub day: Option<i64>,
    pub month: String,
}

/// New record to insert
#[derive(Debug)]
pub struct NewRecord {
    pub value: f64,
    pub category: String,
    pub day: Option<i64>,
    pub month: String,
}

/// Fields updated on an existing record
#[derive(Debug)]
pub struct RecordUpdate {
    pub value: f64,
    pub category: String,
    pub day: Option<i64>,
}

/// Finance record store trait
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record for a user, returning its id
    async fn insert(
        &self,
        kind: RecordKind,
        user_email: &str,
        record: NewRecord,
    ) -> StorageResult<i64>;

    /// List a user's records for a month, day descending with day-less
    /// records last, ties newest-first
    async fn list_for_month(
        &self,
        kind: RecordKind,
        user_email: &str,
        month: &str,
    ) -> StorageResult<Vec<Record>>;

    /// Update a user's record
    async fn update(
        &self,
        kind: RecordKind,
        user_email: &str,
        id: i64,
        update: RecordUpdate,
    ) -> StorageResult<()>;

    /// Delete a user's record
    async fn delete(&self, kind: RecordKind, user_email: &str, id: i64) -> StorageResult<()>;
}

/// SQLite implementation of RecordStore
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for all record kinds
    pub async fn initialize(&self) -> StorageResult<()> {
        for kind in RecordKind::ALL {
            // Table names come from RecordKind::table, never from input
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_email TEXT NOT NULL,
                    value REAL NOT NULL,
                    category TEXT NOT NULL,
                    day INTEGER,
                    month TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
                kind.table()
            ))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(
        &self,
        kind: RecordKind,
        user_email: &str,
        record: NewRecord,
    ) -> StorageResult<i64> {
        let now = Utc::now();

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (user_email, value, category, day, month, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            kind.table()
        ))
        .bind(user_email)
        .bind(record.value)
        .bind(&record.category)
        .bind(record.day)
        .bind(&record.month)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_for_month(
        &self,
        kind: RecordKind,
        user_email: &str,
        month: &str,
    ) -> StorageResult<Vec<Record>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, value, category, day, month
            FROM {}
            WHERE user_email = ? AND month = ?
            ORDER BY COALESCE(day, 0) DESC, id DESC
            "#,
            kind.table()
        ))
        .bind(user_email)
        .bind(month)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Record {
                id: row.get("id"),
                value: row.get("value"),
                category: row.get("category"),
                day: row.get("day"),
                month: row.get("month"),
            })
            .collect())
    }

    async fn update(
        &self,
        kind: RecordKind,
        user_email: &str,
        id: i64,
        update: RecordUpdate,
    ) -> StorageResult<()> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET value = ?, category = ?, day = ?, updated_at = ?
            WHERE id = ? AND user_email = ?
            "#,
            kind.table()
        ))
        .bind(update.value)
        .bind(&update.category)
        .bind(update.day)
        .bind(Utc::now())
        .bind(id)
        .bind(user_email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::RecordNotFound(id));
        }

        Ok(())
    }

    async fn delete(&self, kind: RecordKind, user_email: &str, id: i64) -> StorageResult<()> {
        let result = sqlx::query(&format!(
            r#"
            DELETE FROM {} WHERE id = ? AND user_email = ?
            "#,
            kind.table()
        ))
        .bind(id)
        .bind(user_email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::RecordNotFound(id));
        }

        Ok(())
    }
}
