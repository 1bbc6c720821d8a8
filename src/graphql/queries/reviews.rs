use super::prelude::*;

#[derive(Default)]
pub struct ReviewQueries;

#[Object]
impl ReviewQueries {
    /// Page through published reviews, optionally narrowed to one book
    async fn reviews(
        &self,
        ctx: &Context<'_>,
        book_id: Option<ID>,
        page: Option<PageArgs>,
    ) -> Result<ReviewConnection> {
        let request = PageArgs::to_request(page)?;
        let db = ctx.data_unchecked::<Database>();

        let book_id = match book_id {
            Some(id) => Some(parse_id(&id).ok_or_else(|| errors::validation_failure("Invalid book id"))?),
            None => None,
        };

        let repo = db.reviews();
        let source = ReviewPage {
            repo: &repo,
            filter: ReviewFilter::published(book_id),
        };
        let result = paginate(&source, &request)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(ReviewConnection::from_page(result))
    }
}
