use super::prelude::*;

#[derive(Default)]
pub struct CommentMutations;

#[derive(InputObject, Debug)]
pub struct CreateCommentInput {
    pub content: String,
    pub post_id: ID,
    #[graphql(default = false)]
    pub published: bool,
}

/// Fields to change; None fields are left unchanged
#[derive(InputObject, Debug, Default)]
pub struct UpdateCommentInput {
    pub content: Option<String>,
    pub published: Option<bool>,
}

#[Object]
impl CommentMutations {
    /// Comment on an existing post
    async fn create_comment(&self, ctx: &Context<'_>, input: CreateCommentInput) -> Result<Comment> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        if input.content.trim().is_empty() {
            return Err(errors::validation_failure("Content must not be empty"));
        }

        let post_id = parse_id(&input.post_id)
            .ok_or_else(|| errors::validation_failure("Invalid post id"))?;
        db.posts()
            .find_by_id(post_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(|| errors::validation_failure("Post does not exist"))?;

        let record = db
            .comments()
            .create(CreateComment {
                content: input.content,
                published: input.published,
                author_id: identity.user_id,
                post_id,
            })
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_comment(notifier, MutationKind::Created, &record);
        Ok(record.into())
    }

    /// Update one of the caller's comments
    async fn update_comment(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateCommentInput,
    ) -> Result<Comment> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let comment_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .comments()
            .find_by_id(comment_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if existing.author_id != identity.user_id {
            return Err(errors::not_found_or_forbidden());
        }

        if let Some(content) = &input.content
            && content.trim().is_empty()
        {
            return Err(errors::validation_failure("Content must not be empty"));
        }

        let record = db
            .comments()
            .update(
                comment_id,
                UpdateComment {
                    content: input.content,
                    published: input.published,
                },
            )
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;

        notify_comment(notifier, MutationKind::Updated, &record);
        Ok(record.into())
    }

    /// Delete one of the caller's comments
    async fn delete_comment(&self, ctx: &Context<'_>, id: ID) -> Result<Comment> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let comment_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .comments()
            .find_by_id(comment_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if existing.author_id != identity.user_id {
            return Err(errors::not_found_or_forbidden());
        }

        db.comments()
            .delete(comment_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_comment(notifier, MutationKind::Deleted, &existing);
        Ok(existing.into())
    }
}
