//! Schema bootstrap
//!
//! Creates the tables on startup if they don't exist yet. Timestamps are
//! RFC 3339 TEXT (fixed width, see [sqlite_helpers](super::sqlite_helpers)),
//! ids are UUID TEXT, booleans are 0/1 integers.

use anyhow::Result;
use sqlx::SqlitePool;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0,
        author_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0,
        author_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0,
        author_id TEXT NOT NULL REFERENCES users(id),
        post_id TEXT NOT NULL REFERENCES posts(id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id TEXT PRIMARY KEY,
        comment TEXT NOT NULL,
        rating INTEGER NOT NULL,
        published INTEGER NOT NULL DEFAULT 0,
        user_id TEXT NOT NULL REFERENCES users(id),
        book_id TEXT NOT NULL REFERENCES books(id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS files (
        id TEXT PRIMARY KEY,
        filename TEXT NOT NULL,
        mimetype TEXT NOT NULL,
        encoding TEXT NOT NULL,
        url TEXT NOT NULL,
        user_id TEXT REFERENCES users(id),
        created_at TEXT NOT NULL
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_order ON posts(created_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_books_order ON books(created_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_author ON comments(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_book ON reviews(book_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_user ON files(user_id)",
];

/// Create all tables and indexes if they don't exist
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    for stmt in TABLES.iter().chain(INDEXES) {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
