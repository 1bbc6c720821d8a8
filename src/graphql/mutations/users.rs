use super::prelude::*;
use crate::services::{AuthService, TokenCodec};

#[derive(Default)]
pub struct UserMutations;

#[derive(InputObject, Debug)]
pub struct SignupInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Fields to change on the caller's account; None fields are left unchanged
#[derive(InputObject, Debug, Default)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[Object]
impl UserMutations {
    /// Register a new account and sign in
    async fn create_user(&self, ctx: &Context<'_>, input: SignupInput) -> Result<AuthPayload> {
        let db = ctx.data_unchecked::<Database>();
        let codec = ctx.data_unchecked::<TokenCodec>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        if !input.email.contains('@') {
            return Err(errors::validation_failure("Invalid email address"));
        }

        let auth = AuthService::new(db.users(), codec.clone());
        let payload = auth
            .signup(&input.email, &input.name, &input.password)
            .await
            .map_err(|e| errors::validation_failure(e.to_string()))?;

        notify_user(notifier, MutationKind::Created, &payload.user);

        Ok(AuthPayload {
            token: payload.token,
            user: payload.user.into(),
        })
    }

    /// Sign in to an existing account
    async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> Result<AuthPayload> {
        let db = ctx.data_unchecked::<Database>();
        let codec = ctx.data_unchecked::<TokenCodec>();

        let auth = AuthService::new(db.users(), codec.clone());
        // Every failure collapses to the same message so callers cannot
        // probe which emails have accounts.
        let payload = auth
            .login(&email, &password)
            .await
            .map_err(|_| errors::invalid_credential("Invalid credentials"))?;

        Ok(AuthPayload {
            token: payload.token,
            user: payload.user.into(),
        })
    }

    /// Update the caller's own account
    async fn update_user(&self, ctx: &Context<'_>, input: UpdateUserInput) -> Result<User> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        if let Some(email) = &input.email
            && !email.contains('@')
        {
            return Err(errors::validation_failure("Invalid email address"));
        }
        let password = match input.password {
            Some(password) => {
                if password.len() < 8 {
                    return Err(errors::validation_failure(
                        "Password must be at least 8 characters",
                    ));
                }
                Some(
                    bcrypt::hash(&password, bcrypt::DEFAULT_COST)
                        .map_err(|e| async_graphql::Error::new(e.to_string()))?,
                )
            }
            None => None,
        };

        let record = db
            .users()
            .update(
                identity.user_id,
                UpdateUser {
                    email: input.email,
                    name: input.name,
                    password,
                },
            )
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;

        notify_user(notifier, MutationKind::Updated, &record);
        Ok(record.into())
    }

    /// Delete the caller's own account
    async fn delete_user(&self, ctx: &Context<'_>) -> Result<User> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let notifier = ctx.data_unchecked::<Arc<ChangeNotifier>>();

        let record = db
            .users()
            .find_by_id(identity.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;

        db.users()
            .delete(identity.user_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        tracing::info!(user_id = %identity.user_id, "account deleted");
        notify_user(notifier, MutationKind::Deleted, &record);
        Ok(record.into())
    }
}
