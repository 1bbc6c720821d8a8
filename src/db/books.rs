//! Books database repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::pagination::{Anchor, Paginate};
use crate::db::sqlite_helpers::{
    bool_to_int, datetime_to_str, escape_like, int_to_bool, now_timestamp, str_to_datetime,
    str_to_uuid, uuid_to_str,
};

/// Book record from database
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for BookRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let author_str: String = row.try_get("author_id")?;
        let created_str: String = row.try_get("created_at")?;
        let published_int: i32 = row.try_get("published")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            published: int_to_bool(published_int),
            author_id: str_to_uuid(&author_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a book
#[derive(Debug)]
pub struct CreateBook {
    pub title: String,
    pub description: String,
    pub published: bool,
    pub author_id: Uuid,
}

/// Input for updating a book (None fields are left unchanged)
#[derive(Debug, Default)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
}

/// Filter predicate for book listings
#[derive(Debug, Clone)]
pub enum BookFilter {
    Published,
    ByAuthor(Uuid),
}

impl BookFilter {
    fn where_sql(&self) -> &'static str {
        match self {
            BookFilter::Published => "published = 1",
            BookFilter::ByAuthor(_) => "author_id = ?",
        }
    }

    fn bind_author(&self) -> Option<String> {
        match self {
            BookFilter::ByAuthor(id) => Some(uuid_to_str(*id)),
            _ => None,
        }
    }
}

const COLUMNS: &str = "id, title, description, published, author_id, created_at";

/// Book repository
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a book by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRecord>> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {COLUMNS} FROM books WHERE id = ?"
        ))
        .bind(uuid_to_str(id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Count books matching a filter
    pub async fn count(&self, filter: &BookFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM books WHERE {}", filter.where_sql());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(author) = filter.bind_author() {
            query = query.bind(author);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Fetch a page of books matching a filter, newest first with an id tiebreak
    pub async fn page(
        &self,
        filter: &BookFilter,
        limit: i64,
        skip: i64,
        after: Option<&Anchor>,
    ) -> Result<Vec<BookRecord>> {
        let mut sql = format!("SELECT {COLUMNS} FROM books WHERE {}", filter.where_sql());
        if after.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, BookRecord>(&sql);
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

    /// List all books by an author (relation resolution)
    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<BookRecord>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {COLUMNS} FROM books WHERE author_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_str(author_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Search books by substring in title or description (case-insensitive).
    /// `%` and `_` in the term match literally.
    pub async fn search(&self, term: &str) -> Result<Vec<BookRecord>> {
        let pattern = format!("%{}%", escape_like(term));
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {COLUMNS} FROM books \
             WHERE title LIKE ? ESCAPE '\\' COLLATE NOCASE \
                OR description LIKE ? ESCAPE '\\' COLLATE NOCASE \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Create a book
    pub async fn create(&self, input: CreateBook) -> Result<BookRecord> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO books (id, title, description, published, author_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_str(id))
        .bind(&input.title)
        .bind(&input.description)
        .bind(bool_to_int(input.published))
        .bind(uuid_to_str(input.author_id))
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve book after insert"))
    }

    /// Update a book; returns the updated record or None when it no longer exists
    pub async fn update(&self, id: Uuid, input: UpdateBook) -> Result<Option<BookRecord>> {
        let mut set_clauses = Vec::new();
        if input.title.is_some() {
            set_clauses.push("title = ?");
        }
        if input.description.is_some() {
            set_clauses.push("description = ?");
        }
        if input.published.is_some() {
            set_clauses.push("published = ?");
        }

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        let sql = format!("UPDATE books SET {} WHERE id = ?", set_clauses.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(title) = &input.title {
            query = query.bind(title);
        }
        if let Some(description) = &input.description {
            query = query.bind(description);
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

    /// Delete a book; returns whether a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(uuid_to_str(id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Pagination source for books under a fixed filter
pub struct BookPage<'a> {
    pub repo: &'a BookRepository,
    pub filter: BookFilter,
}

#[async_trait]
impl Paginate for BookPage<'_> {
    type Node = BookRecord;

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
    ) -> Result<Vec<BookRecord>> {
        self.repo.page(&self.filter, limit, skip, after).await
    }

    fn cursor(node: &BookRecord) -> String {
        node.id.to_string()
    }
}
