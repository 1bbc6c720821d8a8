use super::prelude::*;

const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

#[derive(Default)]
pub struct ReviewMutations;

#[derive(InputObject, Debug)]
pub struct CreateReviewInput {
    pub comment: String,
    pub rating: i32,
    pub book_id: ID,
    #[graphql(default = false)]
    pub published: bool,
}

/// Fields to change; None fields are left unchanged
#[derive(InputObject, Debug, Default)]
pub struct UpdateReviewInput {
    pub comment: Option<String>,
    pub rating: Option<i32>,
    pub published: Option<bool>,
}

#[Object]
impl ReviewMutations {
    /// Review an existing book
    async fn create_review(&self, ctx: &Context<'_>, input: CreateReviewInput) -> Result<Review> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        if !RATING_RANGE.contains(&input.rating) {
            return Err(errors::validation_failure("Rating must be between 1 and 5"));
        }

        let book_id = parse_id(&input.book_id)
            .ok_or_else(|| errors::validation_failure("Invalid book id"))?;
        db.books()
            .find_by_id(book_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(|| errors::validation_failure("Book does not exist"))?;

        let record = db
            .reviews()
            .create(CreateReview {
                comment: input.comment,
                rating: input.rating,
                published: input.published,
                user_id: identity.user_id,
                book_id,
            })
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_review(notifier, MutationKind::Created, &record);
        Ok(record.into())
    }

    /// Update one of the caller's reviews
    async fn update_review(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateReviewInput,
    ) -> Result<Review> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let review_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .reviews()
            .find_by_id(review_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if existing.user_id != identity.user_id {
            return Err(errors::not_found_or_forbidden());
        }

        if let Some(rating) = input.rating
            && !RATING_RANGE.contains(&rating)
        {
            return Err(errors::validation_failure("Rating must be between 1 and 5"));
        }

        let record = db
            .reviews()
            .update(
                review_id,
                UpdateReview {
                    comment: input.comment,
                    rating: input.rating,
                    published: input.published,
                },
            )
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;

        notify_review(notifier, MutationKind::Updated, &record);
        Ok(record.into())
    }

    /// Delete one of the caller's reviews
    async fn delete_review(&self, ctx: &Context<'_>, id: ID) -> Result<Review> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let review_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .reviews()
            .find_by_id(review_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if existing.user_id != identity.user_id {
            return Err(errors::not_found_or_forbidden());
        }

        db.reviews()
            .delete(review_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_review(notifier, MutationKind::Deleted, &existing);
        Ok(existing.into())
    }
}
