//! Reviews database repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::pagination::{Anchor, Paginate};
use crate::db::sqlite_helpers::{
    bool_to_int, datetime_to_str, int_to_bool, now_timestamp, str_to_datetime, str_to_uuid,
    uuid_to_str,
};

/// Review record from database
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub comment: String,
    pub rating: i32,
    pub published: bool,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for ReviewRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let user_str: String = row.try_get("user_id")?;
        let book_str: String = row.try_get("book_id")?;
        let created_str: String = row.try_get("created_at")?;
        let published_int: i32 = row.try_get("published")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            comment: row.try_get("comment")?,
            rating: row.try_get("rating")?,
            published: int_to_bool(published_int),
            user_id: str_to_uuid(&user_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            book_id: str_to_uuid(&book_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a review
#[derive(Debug)]
pub struct CreateReview {
    pub comment: String,
    pub rating: i32,
    pub published: bool,
    pub user_id: Uuid,
    pub book_id: Uuid,
}

/// Input for updating a review (None fields are left unchanged)
#[derive(Debug, Default)]
pub struct UpdateReview {
    pub comment: Option<String>,
    pub rating: Option<i32>,
    pub published: Option<bool>,
}

/// Filter predicate for review listings. The optional book id narrows the
/// published listing to one book.
#[derive(Debug, Clone)]
pub struct ReviewFilter {
    pub published_only: bool,
    pub book_id: Option<Uuid>,
}

impl ReviewFilter {
    pub fn published(book_id: Option<Uuid>) -> Self {
        Self {
            published_only: true,
            book_id,
        }
    }

    fn where_sql(&self) -> String {
        let mut clauses = Vec::new();
        if self.published_only {
            clauses.push("published = 1");
        }
        if self.book_id.is_some() {
            clauses.push("book_id = ?");
        }
        if clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            clauses.join(" AND ")
        }
    }
}

const COLUMNS: &str = "id, comment, rating, published, user_id, book_id, created_at";

/// Review repository
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a review by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReviewRecord>> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {COLUMNS} FROM reviews WHERE id = ?"
        ))
        .bind(uuid_to_str(id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Count reviews matching a filter
    pub async fn count(&self, filter: &ReviewFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM reviews WHERE {}", filter.where_sql());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(book_id) = filter.book_id {
            query = query.bind(uuid_to_str(book_id));
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Fetch a page of reviews matching a filter, newest first with an id tiebreak
    pub async fn page(
        &self,
        filter: &ReviewFilter,
        limit: i64,
        skip: i64,
        after: Option<&Anchor>,
    ) -> Result<Vec<ReviewRecord>> {
        let mut sql = format!("SELECT {COLUMNS} FROM reviews WHERE {}", filter.where_sql());
        if after.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, ReviewRecord>(&sql);
        if let Some(book_id) = filter.book_id {
            query = query.bind(uuid_to_str(book_id));
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

    /// List all reviews on a book (relation resolution)
    pub async fn list_by_book(&self, book_id: Uuid) -> Result<Vec<ReviewRecord>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {COLUMNS} FROM reviews WHERE book_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_str(book_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// List all reviews written by a user (relation resolution)
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ReviewRecord>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {COLUMNS} FROM reviews WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_str(user_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Create a review
    pub async fn create(&self, input: CreateReview) -> Result<ReviewRecord> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO reviews (id, comment, rating, published, user_id, book_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_str(id))
        .bind(&input.comment)
        .bind(input.rating)
        .bind(bool_to_int(input.published))
        .bind(uuid_to_str(input.user_id))
        .bind(uuid_to_str(input.book_id))
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve review after insert"))
    }

    /// Update a review; returns the updated record or None when it no longer exists
    pub async fn update(&self, id: Uuid, input: UpdateReview) -> Result<Option<ReviewRecord>> {
        let mut set_clauses = Vec::new();
        if input.comment.is_some() {
            set_clauses.push("comment = ?");
        }
        if input.rating.is_some() {
            set_clauses.push("rating = ?");
        }
        if input.published.is_some() {
            set_clauses.push("published = ?");
        }

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        let sql = format!("UPDATE reviews SET {} WHERE id = ?", set_clauses.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(comment) = &input.comment {
            query = query.bind(comment);
        }
        if let Some(rating) = input.rating {
            query = query.bind(rating);
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

    /// Delete a review; returns whether a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(uuid_to_str(id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Pagination source for reviews under a fixed filter
pub struct ReviewPage<'a> {
    pub repo: &'a ReviewRepository,
    pub filter: ReviewFilter,
}

#[async_trait]
impl Paginate for ReviewPage<'_> {
    type Node = ReviewRecord;

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
    ) -> Result<Vec<ReviewRecord>> {
        self.repo.page(&self.filter, limit, skip, after).await
    }

    fn cursor(node: &ReviewRecord) -> String {
        node.id.to_string()
    }
}
