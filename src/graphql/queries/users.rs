use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// The currently authenticated account
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();

        let record = db
            .users()
            .find_by_id(identity.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;

        Ok(record.into())
    }

    /// Look up a user by id; absent users are null, not an error
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<Option<User>> {
        let Some(user_id) = parse_id(&id) else {
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

    /// Page through all registered users, newest first
    async fn users(&self, ctx: &Context<'_>, page: Option<PageArgs>) -> Result<UserConnection> {
        let request = PageArgs::to_request(page)?;
        let db = ctx.data_unchecked::<Database>();

        let repo = db.users();
        let result = paginate(&UserPage { repo: &repo }, &request)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(UserConnection::from_page(result))
    }
}
