use std::io::Read;

use async_graphql::Upload;

use super::prelude::*;
use crate::graphql::auth::AuthUser;
use crate::services::StorageService;

#[derive(Default)]
pub struct FileMutations;

async fn store_upload(
    ctx: &Context<'_>,
    upload: Upload,
    identity: Option<AuthUser>,
) -> Result<StoredFile> {
    let db = ctx.data_unchecked::<Database>();
    let storage = ctx.data_unchecked::<StorageService>();

    let value = upload
        .value(ctx)
        .map_err(|e| errors::validation_failure(format!("Invalid upload: {e}")))?;

    let filename = value.filename.clone();
    if filename.trim().is_empty() {
        return Err(errors::validation_failure("Upload is missing a filename"));
    }
    let mimetype = value.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string()
    });

    let mut bytes = Vec::new();
    value
        .into_read()
        .read_to_end(&mut bytes)
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;

    let blob = storage
        .store(&filename, &bytes)
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;

    let record = db
        .files()
        .create(CreateFile {
            filename: blob.filename,
            mimetype,
            encoding: "7bit".to_string(),
            url: blob.url,
            user_id: identity.map(|u| u.user_id),
        })
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;

    tracing::info!(file_id = %record.id, size = bytes.len(), "file uploaded");
    Ok(record.into())
}

#[Object]
impl FileMutations {
    /// Upload a single file. Anonymous uploads are allowed; the file is
    /// then owned by nobody.
    async fn upload_file(&self, ctx: &Context<'_>, file: Upload) -> Result<StoredFile> {
        let identity = ctx.identity_opt()?;
        store_upload(ctx, file, identity).await
    }

    /// Upload several files in one request.
    ///
    /// Files are committed one at a time, not atomically: when one upload
    /// fails, the files stored before it stay stored and the caller only
    /// sees the error.
    async fn upload_multiple_files(
        &self,
        ctx: &Context<'_>,
        files: Vec<Upload>,
    ) -> Result<Vec<StoredFile>> {
        let identity = ctx.identity_opt()?;
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            stored.push(store_upload(ctx, file, identity).await?);
        }
        Ok(stored)
    }

    /// Delete a file record and its blob. Owned files are deletable only
    /// by their owner; anonymously uploaded files by any signed-in user.
    async fn delete_file(&self, ctx: &Context<'_>, id: ID) -> Result<StoredFile> {
        let identity = ctx.identity()?;
        let db = ctx.data_unchecked::<Database>();
        let storage = ctx.data_unchecked::<StorageService>();

        let file_id = parse_id(&id).ok_or_else(errors::not_found_or_forbidden)?;
        let existing = db
            .files()
            .find_by_id(file_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
            .ok_or_else(errors::not_found_or_forbidden)?;
        if let Some(owner) = existing.user_id
            && owner != identity.user_id
        {
            return Err(errors::not_found_or_forbidden());
        }

        db.files()
            .delete(file_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        // The row is gone; a stranded blob is not worth failing the call over.
        if let Err(e) = storage.remove(&existing.filename).await {
            tracing::warn!(file_id = %file_id, error = %e, "failed to remove uploaded blob");
        }

        Ok(existing.into())
    }
}
