//! Uploaded file metadata repository
//!
//! Each row links a stored blob (named by `filename`, served at `url`) to
//! an optional owner. The blob bytes themselves live on disk under the
//! uploads directory.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::sqlite_helpers::{
    now_timestamp, str_to_datetime, str_to_uuid, str_to_uuid_opt, uuid_to_str,
};

/// File metadata record from database
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: Uuid,
    pub filename: String,
    pub mimetype: String,
    pub encoding: String,
    pub url: String,
    pub user_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for FileRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let user_str: Option<String> = row.try_get("user_id")?;
        let created_str: String = row.try_get("created_at")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            filename: row.try_get("filename")?,
            mimetype: row.try_get("mimetype")?,
            encoding: row.try_get("encoding")?,
            url: row.try_get("url")?,
            user_id: str_to_uuid_opt(user_str.as_deref())
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for recording an uploaded file
#[derive(Debug)]
pub struct CreateFile {
    pub filename: String,
    pub mimetype: String,
    pub encoding: String,
    pub url: String,
    pub user_id: Option<Uuid>,
}

const COLUMNS: &str = "id, filename, mimetype, encoding, url, user_id, created_at";

/// File metadata repository
pub struct FilesRepository {
    pool: SqlitePool,
}

impl FilesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a file record by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(uuid_to_str(id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List all files owned by a user (relation resolution)
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {COLUMNS} FROM files WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_str(user_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Record an uploaded file
    pub async fn create(&self, input: CreateFile) -> Result<FileRecord> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO files (id, filename, mimetype, encoding, url, user_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_str(id))
        .bind(&input.filename)
        .bind(&input.mimetype)
        .bind(&input.encoding)
        .bind(&input.url)
        .bind(input.user_id.map(uuid_to_str))
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve file after insert"))
    }

    /// Delete a file record; returns whether a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(uuid_to_str(id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
