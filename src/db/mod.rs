//! Database connection and operations

pub mod books;
pub mod comments;
pub mod files;
pub mod pagination;
pub mod posts;
pub mod reviews;
pub mod schema;
pub mod sqlite_helpers;
pub mod users;

use std::str::FromStr;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use books::{BookFilter, BookPage, BookRecord, BookRepository, CreateBook, UpdateBook};
pub use comments::{
    CommentFilter, CommentPage, CommentRecord, CommentRepository, CreateComment, UpdateComment,
};
pub use files::{CreateFile, FileRecord, FilesRepository};
pub use pagination::{Anchor, Page, PageRequest, Paginate, paginate};
pub use posts::{CreatePost, PostFilter, PostPage, PostRecord, PostRepository, UpdatePost};
pub use reviews::{
    CreateReview, ReviewFilter, ReviewPage, ReviewRecord, ReviewRepository, UpdateReview,
};
pub use users::{CreateUser, UpdateUser, UserPage, UserRecord, UsersRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10)
    }

    /// Create a new database connection pool, creating the file if missing.
    ///
    /// An in-memory database is pinned to a single connection that never
    /// expires, otherwise every pooled connection would see its own empty
    /// database.
    pub async fn connect(url: &str) -> Result<Self> {
        let in_memory = url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.max_connections(Self::get_max_connections());
        }

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Create all tables and indexes if they don't exist
    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Get a posts repository
    pub fn posts(&self) -> PostRepository {
        PostRepository::new(self.pool.clone())
    }

    /// Get a books repository
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    /// Get a comments repository
    pub fn comments(&self) -> CommentRepository {
        CommentRepository::new(self.pool.clone())
    }

    /// Get a reviews repository
    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    /// Get a files repository
    pub fn files(&self) -> FilesRepository {
        FilesRepository::new(self.pool.clone())
    }
}
