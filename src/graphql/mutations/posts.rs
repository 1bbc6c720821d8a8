use super::prelude::*;

#[derive(Default)]
pub struct PostMutations;

#[derive(InputObject, Debug)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    #[graphql(default = false)]
    pub published: bool,
}

/// Fields to change; None fields are left unchanged
#[derive(InputObject, Debug, Default)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

#[Object]
impl PostMutations {
    /// Create a post owned by the caller
    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        if input.title.trim().is_empty() {
            return Err(errors::validation_failure("Title must not be empty"));
        }

        let record = db
            .posts()
            .create(CreatePost {
                title: input.title,
                content: input.content,
                published: input.published,
                author_id: identity.user_id,
            })
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_post(notifier, MutationKind::Created, &record);
        Ok(record.into())
    }

    /// Update one of the caller's posts
    async fn update_post(&self, ctx: &Context<'_>, id: ID, input: UpdatePostInput) -> Result<Post> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let post_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .posts()
            .find_by_id(post_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if existing.author_id != identity.user_id {
            return Err(errors::not_found_or_forbidden());
        }

        if let Some(title) = &input.title
            && title.trim().is_empty()
        {
            return Err(errors::validation_failure("Title must not be empty"));
        }

        let record = db
            .posts()
            .update(
                post_id,
                UpdatePost {
                    title: input.title,
                    content: input.content,
                    published: input.published,
                },
            )
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;

        notify_post(notifier, MutationKind::Updated, &record);
        Ok(record.into())
    }

    /// Delete one of the caller's posts
    async fn delete_post(&self, ctx: &Context<'_>, id: ID) -> Result<Post> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let post_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .posts()
            .find_by_id(post_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if existing.author_id != identity.user_id {
            return Err(errors::not_found_or_forbidden());
        }

        db.posts()
            .delete(post_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_post(notifier, MutationKind::Deleted, &existing);
        Ok(existing.into())
    }
}
