use super::prelude::*;

#[derive(Default)]
pub struct PostQueries;

#[Object]
impl PostQueries {
    /// Look up a post by id; absent posts are null, not an error
    async fn post(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Post>> {
        let Some(post_id) = parse_id(&id) else {
            return Ok(None);
        };
        let db = ctx.data_unchecked::<Database>();

        let record = db
            .posts()
            .find_by_id(post_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(record.map(Post::from))
    }

    /// Page through published posts, newest first
    async fn posts(&self, ctx: &Context<'_>, page: Option<PageArgs>) -> Result<PostConnection> {
        let request = PageArgs::to_request(page)?;
        let db = ctx.data_unchecked::<Database>();

        let repo = db.posts();
        let source = PostPage {
            repo: &repo,
            filter: PostFilter::Published,
        };
        let result = paginate(&source, &request)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(PostConnection::from_page(result))
    }

    /// Page through the caller's own posts, drafts included
    async fn my_posts(&self, ctx: &Context<'_>, page: Option<PageArgs>) -> Result<PostConnection> {
        let identity = ctx.identity()?;
        let request = PageArgs::to_request(page)?;
        let db = ctx.data_unchecked::<Database>();

        let repo = db.posts();
        let source = PostPage {
            repo: &repo,
            filter: PostFilter::ByAuthor(identity.user_id),
        };
        let result = paginate(&source, &request)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(PostConnection::from_page(result))
    }
}
