use super::prelude::*;

#[derive(Default)]
pub struct BookMutations;

#[derive(InputObject, Debug)]
pub struct CreateBookInput {
    pub title: String,
    pub description: String,
    #[graphql(default = false)]
    pub published: bool,
}

/// Fields to change; None fields are left unchanged
#[derive(InputObject, Debug, Default)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
}

#[Object]
impl BookMutations {
    /// Create a book owned by the caller
    async fn create_book(&self, ctx: &Context<'_>, input: CreateBookInput) -> Result<Book> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        if input.title.trim().is_empty() {
            return Err(errors::validation_failure("Title must not be empty"));
        }

        let record = db
            .books()
            .create(CreateBook {
                title: input.title,
                description: input.description,
                published: input.published,
                author_id: identity.user_id,
            })
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_book(notifier, MutationKind::Created, &record);
        Ok(record.into())
    }

    /// Update one of the caller's books
    async fn update_book(&self, ctx: &Context<'_>, id: ID, input: UpdateBookInput) -> Result<Book> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let book_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .books()
            .find_by_id(book_id)
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
            .books()
            .update(
                book_id,
                UpdateBook {
                    title: input.title,
                    description: input.description,
                    published: input.published,
                },
            )
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;

        notify_book(notifier, MutationKind::Updated, &record);
        Ok(record.into())
    }

    /// Delete one of the caller's books
    async fn delete_book(&self, ctx: &Context<'_>, id: ID) -> Result<Book> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let book_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .books()
            .find_by_id(book_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if existing.author_id != identity.user_id {
            return Err(errors::not_found_or_forbidden());
        }

        db.books()
            .delete(book_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        notify_book(notifier, MutationKind::Deleted, &existing);
        Ok(existing.into())
    }
}
