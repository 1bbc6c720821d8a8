//! GraphQL object types, events, and connections
//!
//! Each entity type mirrors its database record minus anything private
//! (the user's password hash never crosses this boundary). Relations are
//! resolved lazily per field against the database; there is no batching.

use async_graphql::{ComplexObject, Context, Enum, ID, Result, SimpleObject, Union};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{
    BookRecord, CommentRecord, Database, FileRecord, PostRecord, ReviewRecord, UserRecord,
};
use crate::define_connection;
use crate::services::MutationKind;

/// A registered account
#[derive(SimpleObject, Debug, Clone)]
#[graphql(complex)]
pub struct User {
    pub id: ID,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub user_id: Uuid,
}

#[ComplexObject]
impl User {
    /// All posts authored by this user, regardless of published state
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .posts()
            .list_by_author(self.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(records.into_iter().map(Post::from).collect())
    }

    /// All books authored by this user
    async fn books(&self, ctx: &Context<'_>) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .books()
            .list_by_author(self.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(records.into_iter().map(Book::from).collect())
    }

    /// All comments written by this user
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .comments()
            .list_by_author(self.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(records.into_iter().map(Comment::from).collect())
    }

    /// All reviews written by this user
    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .reviews()
            .list_by_user(self.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(records.into_iter().map(Review::from).collect())
    }

    /// Files uploaded by this user
    async fn files(&self, ctx: &Context<'_>) -> Result<Vec<StoredFile>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .files()
            .list_by_user(self.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(records.into_iter().map(StoredFile::from).collect())
    }
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: ID::from(r.id.to_string()),
            email: r.email,
            name: r.name,
            created_at: r.created_at,
            user_id: r.id,
        }
    }
}

/// A blog post
#[derive(SimpleObject, Debug, Clone)]
#[graphql(complex)]
pub struct Post {
    pub id: ID,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub record_id: Uuid,
    #[graphql(skip)]
    pub author_id: Uuid,
}

#[ComplexObject]
impl Post {
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db
            .users()
            .find_by_id(self.author_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(record.map(User::from))
    }

    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .comments()
            .list_by_post(self.record_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(records.into_iter().map(Comment::from).collect())
    }
}

impl From<PostRecord> for Post {
    fn from(r: PostRecord) -> Self {
        Self {
            id: ID::from(r.id.to_string()),
            title: r.title,
            content: r.content,
            published: r.published,
            created_at: r.created_at,
            record_id: r.id,
            author_id: r.author_id,
        }
    }
}

/// A book listing
#[derive(SimpleObject, Debug, Clone)]
#[graphql(complex)]
pub struct Book {
    pub id: ID,
    pub title: String,
    pub description: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub record_id: Uuid,
    #[graphql(skip)]
    pub author_id: Uuid,
}

#[ComplexObject]
impl Book {
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db
            .users()
            .find_by_id(self.author_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(record.map(User::from))
    }

    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .reviews()
            .list_by_book(self.record_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(records.into_iter().map(Review::from).collect())
    }
}

impl From<BookRecord> for Book {
    fn from(r: BookRecord) -> Self {
        Self {
            id: ID::from(r.id.to_string()),
            title: r.title,
            description: r.description,
            published: r.published,
            created_at: r.created_at,
            record_id: r.id,
            author_id: r.author_id,
        }
    }
}

/// A comment on a post
#[derive(SimpleObject, Debug, Clone)]
#[graphql(complex)]
pub struct Comment {
    pub id: ID,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub author_id: Uuid,
    #[graphql(skip)]
    pub post_id: Uuid,
}

#[ComplexObject]
impl Comment {
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db
            .users()
            .find_by_id(self.author_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(record.map(User::from))
    }

    async fn post(&self, ctx: &Context<'_>) -> Result<Option<Post>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db
            .posts()
            .find_by_id(self.post_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(record.map(Post::from))
    }
}

impl From<CommentRecord> for Comment {
    fn from(r: CommentRecord) -> Self {
        Self {
            id: ID::from(r.id.to_string()),
            content: r.content,
            published: r.published,
            created_at: r.created_at,
            author_id: r.author_id,
            post_id: r.post_id,
        }
    }
}

/// A review of a book
#[derive(SimpleObject, Debug, Clone)]
#[graphql(complex)]
pub struct Review {
    pub id: ID,
    pub comment: String,
    pub rating: i32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub user_id: Uuid,
    #[graphql(skip)]
    pub book_id: Uuid,
}

#[ComplexObject]
impl Review {
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db
            .users()
            .find_by_id(self.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(record.map(User::from))
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Option<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db
            .books()
            .find_by_id(self.book_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(record.map(Book::from))
    }
}

impl From<ReviewRecord> for Review {
    fn from(r: ReviewRecord) -> Self {
        Self {
            id: ID::from(r.id.to_string()),
            comment: r.comment,
            rating: r.rating,
            published: r.published,
            created_at: r.created_at,
            user_id: r.user_id,
            book_id: r.book_id,
        }
    }
}

/// Metadata for an uploaded file
#[derive(SimpleObject, Debug, Clone)]
#[graphql(name = "File", complex)]
pub struct StoredFile {
    pub id: ID,
    pub filename: String,
    pub mimetype: String,
    pub encoding: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub user_id: Option<Uuid>,
}

#[ComplexObject]
impl StoredFile {
    /// Uploader, when the file was not uploaded anonymously
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(user_id) = self.user_id else {
            return Ok(None);
        };
        let db = ctx.data_unchecked::<Database>();
        let record = db
            .users()
            .find_by_id(user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(record.map(User::from))
    }
}

impl From<FileRecord> for StoredFile {
    fn from(r: FileRecord) -> Self {
        Self {
            id: ID::from(r.id.to_string()),
            filename: r.filename,
            mimetype: r.mimetype,
            encoding: r.encoding,
            url: r.url,
            created_at: r.created_at,
            user_id: r.user_id,
        }
    }
}

/// Signup/login result: the account plus a fresh bearer token
#[derive(SimpleObject, Debug, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// What a mutation did to the record carried by an event
#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum MutationType {
    Created,
    Updated,
    Deleted,
}

impl From<MutationKind> for MutationType {
    fn from(kind: MutationKind) -> Self {
        match kind {
            MutationKind::Created => MutationType::Created,
            MutationKind::Updated => MutationType::Updated,
            MutationKind::Deleted => MutationType::Deleted,
        }
    }
}

/// A change to a user account
#[derive(SimpleObject, Debug, Clone)]
pub struct UserEvent {
    pub mutation: MutationType,
    pub node: User,
}

/// A change to a post
#[derive(SimpleObject, Debug, Clone)]
pub struct PostEvent {
    pub mutation: MutationType,
    pub node: Post,
}

/// A change to a book
#[derive(SimpleObject, Debug, Clone)]
pub struct BookEvent {
    pub mutation: MutationType,
    pub node: Book,
}

/// A change to a comment
#[derive(SimpleObject, Debug, Clone)]
pub struct CommentEvent {
    pub mutation: MutationType,
    pub node: Comment,
}

/// A change to a review
#[derive(SimpleObject, Debug, Clone)]
pub struct ReviewEvent {
    pub mutation: MutationType,
    pub node: Review,
}

/// A full-text search hit
#[derive(Union, Debug, Clone)]
pub enum SearchResult {
    Post(Post),
    Book(Book),
}

define_connection!(UserConnection, UserEdge, User);
define_connection!(PostConnection, PostEdge, Post);
define_connection!(BookConnection, BookEdge, Book);
define_connection!(CommentConnection, CommentEdge, Comment);
define_connection!(ReviewConnection, ReviewEdge, Review);
