//! Users database repository
//!
//! The `password` column is a bcrypt hash; it never leaves the db/services
//! layers.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::pagination::{Anchor, Paginate};
use crate::db::sqlite_helpers::{
    datetime_to_str, now_timestamp, str_to_datetime, str_to_uuid, uuid_to_str,
};

/// User record from database
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for UserRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let created_str: String = row.try_get("created_at")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            password: row.try_get("password")?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a user; `password` must already be hashed
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Input for updating a user (None fields are left unchanged);
/// `password`, when present, must already be hashed
#[derive(Debug, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

const COLUMNS: &str = "id, email, name, password, created_at";

/// User repository
pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(uuid_to_str(id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get a user by email (login lookup)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Count all users
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Fetch a page of users, newest first with an id tiebreak
    pub async fn page(
        &self,
        limit: i64,
        skip: i64,
        after: Option<&Anchor>,
    ) -> Result<Vec<UserRecord>> {
        let mut sql = format!("SELECT {COLUMNS} FROM users WHERE 1 = 1");
        if after.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, UserRecord>(&sql);
        if let Some(anchor) = after {
            let ts = datetime_to_str(anchor.created_at);
            query = query.bind(ts.clone()).bind(ts).bind(uuid_to_str(anchor.id));
        }
        query = query
            .bind(limit)
            .bind(if after.is_some() { 0 } else { skip });

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Create a user
    pub async fn create(&self, input: CreateUser) -> Result<UserRecord> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO users (id, email, name, password, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_str(id))
        .bind(&input.email)
        .bind(&input.name)
        .bind(&input.password)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve user after insert"))
    }

    /// Update a user; returns the updated record or None when it no longer exists
    pub async fn update(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRecord>> {
        let mut set_clauses = Vec::new();
        if input.email.is_some() {
            set_clauses.push("email = ?");
        }
        if input.name.is_some() {
            set_clauses.push("name = ?");
        }
        if input.password.is_some() {
            set_clauses.push("password = ?");
        }

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        let sql = format!("UPDATE users SET {} WHERE id = ?", set_clauses.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(email) = &input.email {
            query = query.bind(email);
        }
        if let Some(name) = &input.name {
            query = query.bind(name);
        }
        if let Some(password) = &input.password {
            query = query.bind(password);
        }
        let result = query.bind(uuid_to_str(id)).execute(&self.pool).await?;

        if result.rows_affected() > 0 {
            self.find_by_id(id).await
        } else {
            Ok(None)
        }
    }

    /// Delete a user; returns whether a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(uuid_to_str(id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Pagination source over all users
pub struct UserPage<'a> {
    pub repo: &'a UsersRepository,
}

#[async_trait]
impl Paginate for UserPage<'_> {
    type Node = UserRecord;

    async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    async fn anchor(&self, cursor: &str) -> Result<Option<Anchor>> {
        let id = match str_to_uuid(cursor) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        Ok(self.repo.find_by_id(id).await?.map(|r| Anchor {
            created_at: r.created_at,
            id: r.id,
        }))
    }

    async fn fetch(
        &self,
        limit: i64,
        skip: i64,
        after: Option<&Anchor>,
    ) -> Result<Vec<UserRecord>> {
        self.repo.page(limit, skip, after).await
    }

    fn cursor(node: &UserRecord) -> String {
        node.id.to_string()
    }
}
