use super::prelude::*;

#[derive(Default)]
pub struct SearchQueries;

#[Object]
impl SearchQueries {
    /// Substring search over published posts (title, content) and books
    /// (title, description)
    async fn search(&self, ctx: &Context<'_>, query: String) -> Result<Vec<SearchResult>> {
        let term = query.trim();
        if term.is_empty() {
            return Err(errors::validation_failure("Search query must not be empty"));
        }
        let db = ctx.data_unchecked::<Database>();

        let posts = db
            .posts()
            .search(term)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        let books = db
            .books()
            .search(term)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        let mut results: Vec<SearchResult> = posts
            .into_iter()
            .filter(|r| r.published)
            .map(|r| SearchResult::Post(r.into()))
            .collect();
        results.extend(
            books
                .into_iter()
                .filter(|r| r.published)
                .map(|r| SearchResult::Book(r.into())),
        );

        Ok(results)
    }
}
