//! Posts database repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::pagination::{Anchor, Paginate};
use crate::db::sqlite_helpers::{
    bool_to_int, datetime_to_str, escape_like, int_to_bool, now_timestamp, str_to_datetime,
    str_to_uuid, uuid_to_str,
};

/// Post record from database
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for PostRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let author_str: String = row.try_get("author_id")?;
        let created_str: String = row.try_get("created_at")?;
        let published_int: i32 = row.try_get("published")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            published: int_to_bool(published_int),
            author_id: str_to_uuid(&author_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a post
#[derive(Debug)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub published: bool,
    pub author_id: Uuid,
}

/// Input for updating a post (None fields are left unchanged)
#[derive(Debug, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

/// Filter predicate for post listings
#[derive(Debug, Clone)]
pub enum PostFilter {
    All,
    Published,
    ByAuthor(Uuid),
}

impl PostFilter {
    fn where_sql(&self) -> &'static str {
        match self {
            PostFilter::All => "1 = 1",
            PostFilter::Published => "published = 1",
            PostFilter::ByAuthor(_) => "author_id = ?",
        }
    }

    fn bind_author(&self) -> Option<String> {
        match self {
            PostFilter::ByAuthor(id) => Some(uuid_to_str(*id)),
            _ => None,
        }
    }
}

const COLUMNS: &str = "id, title, content, published, author_id, created_at";

/// Post repository
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a post by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>> {
        let record = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {COLUMNS} FROM posts WHERE id = ?"
        ))
        .bind(uuid_to_str(id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Count posts matching a filter
    pub async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM posts WHERE {}", filter.where_sql());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(author) = filter.bind_author() {
            query = query.bind(author);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Fetch a page of posts matching a filter, newest first with an id
    /// tiebreak. `after` starts strictly after the anchored record and
    /// overrides `skip`.
    pub async fn page(
        &self,
        filter: &PostFilter,
        limit: i64,
        skip: i64,
        after: Option<&Anchor>,
    ) -> Result<Vec<PostRecord>> {
        let mut sql = format!("SELECT {COLUMNS} FROM posts WHERE {}", filter.where_sql());
        if after.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, PostRecord>(&sql);
        if let Some(author) = filter.bind_author() {
            query = query.bind(author);
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

    /// List all posts by an author (relation resolution)
    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<PostRecord>> {
        let records = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {COLUMNS} FROM posts WHERE author_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_str(author_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Search posts by substring in title or content (case-insensitive).
    /// `%` and `_` in the term match literally.
    pub async fn search(&self, term: &str) -> Result<Vec<PostRecord>> {
        let pattern = format!("%{}%", escape_like(term));
        let records = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {COLUMNS} FROM posts \
             WHERE title LIKE ? ESCAPE '\\' COLLATE NOCASE \
                OR content LIKE ? ESCAPE '\\' COLLATE NOCASE \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Create a post
    pub async fn create(&self, input: CreatePost) -> Result<PostRecord> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO posts (id, title, content, published, author_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_str(id))
        .bind(&input.title)
        .bind(&input.content)
        .bind(bool_to_int(input.published))
        .bind(uuid_to_str(input.author_id))
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve post after insert"))
    }

    /// Update a post; returns the updated record or None when it no longer exists
    pub async fn update(&self, id: Uuid, input: UpdatePost) -> Result<Option<PostRecord>> {
        let mut set_clauses = Vec::new();
        if input.title.is_some() {
            set_clauses.push("title = ?");
        }
        if input.content.is_some() {
            set_clauses.push("content = ?");
        }
        if input.published.is_some() {
            set_clauses.push("published = ?");
        }

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        let sql = format!("UPDATE posts SET {} WHERE id = ?", set_clauses.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(title) = &input.title {
            query = query.bind(title);
        }
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

    /// Delete a post; returns whether a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(uuid_to_str(id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Pagination source for posts under a fixed filter
pub struct PostPage<'a> {
    pub repo: &'a PostRepository,
    pub filter: PostFilter,
}

#[async_trait]
impl Paginate for PostPage<'_> {
    type Node = PostRecord;

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
    ) -> Result<Vec<PostRecord>> {
        self.repo.page(&self.filter, limit, skip, after).await
    }

    fn cursor(node: &PostRecord) -> String {
        node.id.to_string()
    }
}
