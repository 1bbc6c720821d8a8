//! Comments database repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::pagination::{Anchor, Paginate};
use crate::db::sqlite_helpers::{
    bool_to_int, datetime_to_str, int_to_bool, now_timestamp, str_to_datetime, str_to_uuid,
    uuid_to_str,
};

/// Comment record from database
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: Uuid,
    pub content: String,
    pub published: bool,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for CommentRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let author_str: String = row.try_get("author_id")?;
        let post_str: String = row.try_get("post_id")?;
        let created_str: String = row.try_get("created_at")?;
        let published_int: i32 = row.try_get("published")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            content: row.try_get("content")?,
            published: int_to_bool(published_int),
            author_id: str_to_uuid(&author_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            post_id: str_to_uuid(&post_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a comment
#[derive(Debug)]
pub struct CreateComment {
    pub content: String,
    pub published: bool,
    pub author_id: Uuid,
    pub post_id: Uuid,
}

/// Input for updating a comment (None fields are left unchanged)
#[derive(Debug, Default)]
pub struct UpdateComment {
    pub content: Option<String>,
    pub published: Option<bool>,
}

/// Filter predicate for comment listings. The optional post id narrows the
/// published listing to one post.
#[derive(Debug, Clone)]
pub struct CommentFilter {
    pub published_only: bool,
    pub post_id: Option<Uuid>,
}

impl CommentFilter {
    pub fn published(post_id: Option<Uuid>) -> Self {
        Self {
            published_only: true,
            post_id,
        }
    }

    fn where_sql(&self) -> String {
        let mut clauses = Vec::new();
        if self.published_only {
            clauses.push("published = 1");
        }
        if self.post_id.is_some() {
            clauses.push("post_id = ?");
        }
        if clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            clauses.join(" AND ")
        }
    }
}

const COLUMNS: &str = "id, content, published, author_id, post_id, created_at";

/// Comment repository
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a comment by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>> {
        let record = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(uuid_to_str(id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Count comments matching a filter
    pub async fn count(&self, filter: &CommentFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM comments WHERE {}", filter.where_sql());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(post_id) = filter.post_id {
            query = query.bind(uuid_to_str(post_id));
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Fetch a page of comments matching a filter, newest first with an id tiebreak
    pub async fn page(
        &self,
        filter: &CommentFilter,
        limit: i64,
        skip: i64,
        after: Option<&Anchor>,
    ) -> Result<Vec<CommentRecord>> {
        let mut sql = format!(
            "SELECT {COLUMNS} FROM comments WHERE {}",
            filter.where_sql()
        );
        if after.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, CommentRecord>(&sql);
        if let Some(post_id) = filter.post_id {
            query = query.bind(uuid_to_str(post_id));
        }
        if let Some(anchor) = after {
            let ts = datetime_to_str(anchor.created_at);
            query = query.bind(ts.clone()).bind(ts).bind(uuid_to_str(anchor.id));
        }
        query = query
            .bind(limit)
            .bind(if after.is_some() { 0 } else { skip });

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// List all comments on a post (relation resolution)
    pub async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>> {
        let records = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COLUMNS} FROM comments WHERE post_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_str(post_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// List all comments by an author (relation resolution)
    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<CommentRecord>> {
        let records = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COLUMNS} FROM comments WHERE author_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_str(author_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Create a comment
    pub async fn create(&self, input: CreateComment) -> Result<CommentRecord> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO comments (id, content, published, author_id, post_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_str(id))
        .bind(&input.content)
        .bind(bool_to_int(input.published))
        .bind(uuid_to_str(input.author_id))
        .bind(uuid_to_str(input.post_id))
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve comment after insert"))
    }

    /// Update a comment; returns the updated record or None when it no longer exists
    pub async fn update(&self, id: Uuid, input: UpdateComment) -> Result<Option<CommentRecord>> {
        let mut set_clauses = Vec::new();
        if input.content.is_some() {
            set_clauses.push("content = ?");
        }
        if input.published.is_some() {
            set_clauses.push("published = ?");
        }

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        let sql = format!(
            "UPDATE comments SET {} WHERE id = ?",
            set_clauses.join(", ")
        );
        let mut query = sqlx::query(&sql);
        if let Some(content) = &input.content {
            query = query.bind(content);
        }
        if let Some(published) = input.published {
            query = query.bind(bool_to_int(published));
        }
        let result = query.bind(uuid_to_str(id)).execute(&self.pool).await?;

        if result.rows_affected() > 0 {
            self.find_by_id(id).await
        } else {
            Ok(None)
        }
    }

    /// Delete a comment; returns whether a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(uuid_to_str(id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Pagination source for comments under a fixed filter
pub struct CommentPage<'a> {
    pub repo: &'a CommentRepository,
    pub filter: CommentFilter,
}

#[async_trait]
impl Paginate for CommentPage<'_> {
    type Node = CommentRecord;

    async fn count(&self) -> Result<i64> {
        self.repo.count(&self.filter).await
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
    ) -> Result<Vec<CommentRecord>> {
        self.repo.page(&self.filter, limit, skip, after).await
    }

    fn cursor(node: &CommentRecord) -> String {
        node.id.to_string()
    }
}
