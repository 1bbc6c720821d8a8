use super::prelude::*;

#[derive(Default)]
pub struct CommentQueries;

#[Object]
impl CommentQueries {
    /// Page through published comments, optionally narrowed to one post
    async fn comments(
        &self,
        ctx: &Context<'_>,
        post_id: Option<ID>,
        page: Option<PageArgs>,
    ) -> Result<CommentConnection> {
        let request = PageArgs::to_request(page)?;
        let db = ctx.data_unchecked::<Database>();

        let post_id = match post_id {
            Some(id) => Some(parse_id(&id).ok_or_else(|| errors::validation_failure("Invalid post id"))?),
            None => None,
        };

        let repo = db.comments();
        let source = CommentPage {
            repo: &repo,
            filter: CommentFilter::published(post_id),
        };
        let result = paginate(&source, &request)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(CommentConnection::from_page(result))
    }
}
