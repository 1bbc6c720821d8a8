use super::prelude::*;

#[derive(Default)]
pub struct BookQueries;

#[Object]
impl BookQueries {
    /// Look up a book by id; absent books are null, not an error
    async fn book(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Book>> {
        let Some(book_id) = parse_id(&id) else {
            return Ok(None);
        };
        let db = ctx.data_unchecked::<Database>();

        let record = db
            .books()
            .find_by_id(book_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(record.map(Book::from))
    }

    /// Page through published books, newest first
    async fn books(&self, ctx: &Context<'_>, page: Option<PageArgs>) -> Result<BookConnection> {
        let request = PageArgs::to_request(page)?;
        let db = ctx.data_unchecked::<Database>();

        let repo = db.books();
        let source = BookPage {
            repo: &repo,
            filter: BookFilter::Published,
        };
        let result = paginate(&source, &request)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(BookConnection::from_page(result))
    }
}
