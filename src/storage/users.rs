use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::{StorageError, StorageResult};

/// User account in the system
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User creation request
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
}

/// User store trait
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user
    async fn create_user(&self, user: CreateUser) -> StorageResult<User>;

    /// Get user by email
    async fn get_user_by_email(&self, email: &str) -> StorageResult<User>;

    /// List all users
    async fn list_users(&self) -> StorageResult<Vec<User>>;

    /// Update a user's password hash
    async fn update_password(&self, email: &str, password_hash: &str) -> StorageResult<()>;

    /// Check if any users exist
    async fn has_users(&self) -> StorageResult<bool>;
}

/// SQLite implementation of UserStore
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for users
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, user: CreateUser) -> StorageResult<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StorageError::DuplicateEmail(user.email.clone());
                }
            }
            StorageError::Database(e)
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<User> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::UserNotFound(email.to_string()))?;

        Ok(row_to_user(&row))
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET password_hash = ?, updated_at = ? WHERE email = ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::UserNotFound(email.to_string()));
        }

        Ok(())
    }

    async fn has_users(&self) -> StorageResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(SELECT 1 FROM users) as has_users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("has_users"))
    }
}
