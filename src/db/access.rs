//! Access record repository.

use sqlx::SqlitePool;

use crate::Result;

/// One row of the `file_access` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AccessRecord {
    /// Row ID.
    pub id: i64,
    /// Key of the blob this record guards.
    pub file_key: String,
    /// Owner name (not unique).
    pub user_name: String,
    /// Argon2 hash of the password given at upload time.
    pub password_hash: String,
    /// Creation timestamp (SQLite `datetime('now')`, UTC).
    pub created_at: String,
}

/// Data for inserting a new access record.
#[derive(Debug, Clone)]
pub struct NewAccessRecord {
    /// Key of the blob.
    pub file_key: String,
    /// Owner name.
    pub user_name: String,
    /// Password hash.
    pub password_hash: String,
}

impl NewAccessRecord {
    /// Create a new record.
    pub fn new(
        file_key: impl Into<String>,
        user_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            file_key: file_key.into(),
            user_name: user_name.into(),
            password_hash: password_hash.into(),
        }
    }
}

/// Repository for access record operations.
pub struct AccessRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccessRepository<'a> {
    /// Create a new repository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record and return it with its assigned ID.
    pub async fn insert(&self, record: &NewAccessRecord) -> Result<AccessRecord> {
        let created = sqlx::query_as::<_, AccessRecord>(
            "INSERT INTO file_access (file_key, user_name, password_hash)
             VALUES (?, ?, ?)
             RETURNING id, file_key, user_name, password_hash, created_at",
        )
        .bind(&record.file_key)
        .bind(&record.user_name)
        .bind(&record.password_hash)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// All records for a user name, in insertion order.
    pub async fn list_by_user(&self, user_name: &str) -> Result<Vec<AccessRecord>> {
        let records = sqlx::query_as::<_, AccessRecord>(
            "SELECT id, file_key, user_name, password_hash, created_at
             FROM file_access WHERE user_name = ? ORDER BY id",
        )
        .bind(user_name)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Get the record for a file key.
    pub async fn get_by_key(&self, file_key: &str) -> Result<Option<AccessRecord>> {
        let record = sqlx::query_as::<_, AccessRecord>(
            "SELECT id, file_key, user_name, password_hash, created_at
             FROM file_access WHERE file_key = ?",
        )
        .bind(file_key)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Every record, used by the reconciliation scan.
    pub async fn list_all(&self) -> Result<Vec<AccessRecord>> {
        let records = sqlx::query_as::<_, AccessRecord>(
            "SELECT id, file_key, user_name, password_hash, created_at
             FROM file_access ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Delete the record for a file key.
    ///
    /// Returns true if a row was removed.
    pub async fn delete_by_key(&self, file_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM file_access WHERE file_key = ?")
            .bind(file_key)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count records for a user name.
    pub async fn count_by_user(&self, user_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM file_access WHERE user_name = ?")
            .bind(user_name)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
