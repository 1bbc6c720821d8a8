//! Generic pagination engine
//!
//! Converts an offset/cursor page request into a bounded page of records
//! plus page metadata and a total count. The engine is parameterized over
//! the [`Paginate`] capability trait rather than dispatching on entity
//! names at runtime, so each entity kind instantiates it with typed
//! count/fetch queries.
//!
//! Ordering is newest-first (`created_at DESC`) with the record id as a
//! secondary key, so page boundaries stay deterministic when rows share a
//! creation timestamp.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Position of a record in the newest-first ordering. A cursor resolves to
/// the anchor of the record it names; the next page starts strictly after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// An offset/cursor page request. When `cursor` is present, `skip` is
/// ignored: the cursor takes precedence.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub skip: i64,
    pub take: i64,
    pub cursor: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            take: 10,
            cursor: None,
        }
    }
}

/// One page of results. `items` pairs each record with its cursor (the
/// record's own id); `total_count` reflects the full filtered set, not
/// the page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<(T, String)>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub total_count: i64,
}

impl<T> Page<T> {
    fn empty(total_count: i64) -> Self {
        Self {
            items: Vec::new(),
            has_next_page: false,
            has_previous_page: false,
            start_cursor: None,
            end_cursor: None,
            total_count,
        }
    }
}

/// Capability interface the pagination engine needs from a repository:
/// count and list under a fixed filter, ordered newest-first.
#[async_trait]
pub trait Paginate {
    type Node: Send;

    /// Number of records matching the filter, ignoring paging entirely.
    async fn count(&self) -> Result<i64>;

    /// Resolve a cursor to its ordering anchor, or `None` if no matching
    /// record exists (stale cursor).
    async fn anchor(&self, cursor: &str) -> Result<Option<Anchor>>;

    /// Fetch up to `limit` records matching the filter, ordered by
    /// `created_at DESC, id DESC`, starting at `skip` (when `after` is
    /// `None`) or strictly after `after`.
    async fn fetch(&self, limit: i64, skip: i64, after: Option<&Anchor>)
    -> Result<Vec<Self::Node>>;

    /// The cursor for a record: its own id.
    fn cursor(node: &Self::Node) -> String;
}

/// Run a page request against a paginated source.
///
/// Fetches `take + 1` records to decide `has_next_page` without a second
/// count query, then discards the extra record. `take = 0` is legal and
/// yields an empty page whose `has_next_page` reflects whether any record
/// exists at the requested position. A cursor naming a nonexistent record
/// yields an empty page rather than an error: no position can anchor it.
pub async fn paginate<S>(source: &S, request: &PageRequest) -> Result<Page<S::Node>>
where
    S: Paginate + Sync,
{
    let take = request.take.max(0);
    let skip = request.skip.max(0);

    let total_count = source.count().await?;

    let (rows, cursor_mode) = match request.cursor.as_deref() {
        Some(cursor) => match source.anchor(cursor).await? {
            Some(anchor) => (source.fetch(take + 1, 0, Some(&anchor)).await?, true),
            None => return Ok(Page::empty(total_count)),
        },
        None => (source.fetch(take + 1, skip, None).await?, false),
    };

    let has_next_page = rows.len() as i64 > take;
    let items: Vec<(S::Node, String)> = rows
        .into_iter()
        .take(take as usize)
        .map(|node| {
            let cursor = S::cursor(&node);
            (node, cursor)
        })
        .collect();

    Ok(Page {
        start_cursor: items.first().map(|(_, c)| c.clone()),
        end_cursor: items.last().map(|(_, c)| c.clone()),
        has_next_page,
        // Only meaningful in offset mode; cursor traversal does not track
        // whether a prior page exists.
        has_previous_page: !cursor_mode && skip > 0,
        total_count,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// In-memory source over a fixed record set, pre-sorted newest-first
    /// with an id tiebreak, mirroring what the SQL repositories produce.
    struct MemorySource {
        rows: Vec<Anchor>,
    }

    impl MemorySource {
        fn new(mut rows: Vec<Anchor>) -> Self {
            rows.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            Self { rows }
        }
    }

    #[async_trait]
    impl Paginate for MemorySource {
        type Node = Anchor;

        async fn count(&self) -> Result<i64> {
            Ok(self.rows.len() as i64)
        }

        async fn anchor(&self, cursor: &str) -> Result<Option<Anchor>> {
            let id = match Uuid::parse_str(cursor) {
                Ok(id) => id,
                Err(_) => return Ok(None),
            };
            Ok(self.rows.iter().find(|r| r.id == id).cloned())
        }

        async fn fetch(
            &self,
            limit: i64,
            skip: i64,
            after: Option<&Anchor>,
        ) -> Result<Vec<Anchor>> {
            let start = match after {
                Some(anchor) => self
                    .rows
                    .iter()
                    .position(|r| r.id == anchor.id)
                    .map(|p| p + 1)
                    .unwrap_or(self.rows.len()),
                None => skip as usize,
            };
            Ok(self
                .rows
                .iter()
                .skip(start)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        fn cursor(node: &Anchor) -> String {
            node.id.to_string()
        }
    }

    fn rows_with_distinct_timestamps(n: i64) -> Vec<Anchor> {
        (0..n)
            .map(|i| Anchor {
                created_at: Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(),
                id: Uuid::new_v4(),
            })
            .collect()
    }

    fn request(skip: i64, take: i64, cursor: Option<String>) -> PageRequest {
        PageRequest { skip, take, cursor }
    }

    #[tokio::test]
    async fn page_is_bounded_by_take() {
        let source = MemorySource::new(rows_with_distinct_timestamps(25));
        let page = paginate(&source, &request(0, 10, None)).await.unwrap();
        assert_eq!(page.items.len(), 10);
        assert!(page.has_next_page);
        assert!(!page.has_previous_page);
        assert_eq!(page.total_count, 25);
    }

    #[tokio::test]
    async fn last_offset_page_has_no_next() {
        let source = MemorySource::new(rows_with_distinct_timestamps(25));
        let page = paginate(&source, &request(20, 10, None)).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_next_page);
        assert!(page.has_previous_page);
        assert_eq!(page.total_count, 25);
    }

    #[tokio::test]
    async fn exact_boundary_has_no_next() {
        let source = MemorySource::new(rows_with_distinct_timestamps(10));
        let page = paginate(&source, &request(0, 10, None)).await.unwrap();
        assert_eq!(page.items.len(), 10);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn cursor_page_starts_strictly_after_the_referenced_record() {
        let source = MemorySource::new(rows_with_distinct_timestamps(15));
        let first = paginate(&source, &request(0, 5, None)).await.unwrap();
        let end = first.end_cursor.clone().unwrap();

        let second = paginate(&source, &request(0, 5, Some(end.clone())))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 5);
        // No overlap with the anchored record or anything before it.
        let first_ids: Vec<&String> = first.items.iter().map(|(_, c)| c).collect();
        for (_, cursor) in &second.items {
            assert!(!first_ids.contains(&cursor));
        }
        assert_ne!(second.start_cursor.as_ref(), Some(&end));
    }

    #[tokio::test]
    async fn cursor_takes_precedence_over_skip() {
        let source = MemorySource::new(rows_with_distinct_timestamps(15));
        let first = paginate(&source, &request(0, 5, None)).await.unwrap();
        let end = first.end_cursor.clone().unwrap();

        let ignored_skip = paginate(&source, &request(12, 5, Some(end.clone())))
            .await
            .unwrap();
        let no_skip = paginate(&source, &request(0, 5, Some(end))).await.unwrap();
        assert_eq!(ignored_skip.start_cursor, no_skip.start_cursor);
        assert_eq!(ignored_skip.end_cursor, no_skip.end_cursor);
        // Cursor mode never reports a previous page.
        assert!(!ignored_skip.has_previous_page);
    }

    #[tokio::test]
    async fn total_count_is_invariant_under_paging() {
        let source = MemorySource::new(rows_with_distinct_timestamps(25));
        let a = paginate(&source, &request(0, 10, None)).await.unwrap();
        let b = paginate(&source, &request(20, 3, None)).await.unwrap();
        let c = paginate(&source, &request(0, 7, a.end_cursor.clone()))
            .await
            .unwrap();
        assert_eq!(a.total_count, 25);
        assert_eq!(b.total_count, 25);
        assert_eq!(c.total_count, 25);
    }

    #[tokio::test]
    async fn take_zero_yields_empty_page_with_next_flag() {
        let source = MemorySource::new(rows_with_distinct_timestamps(3));
        let page = paginate(&source, &request(0, 0, None)).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.has_next_page);
        assert_eq!(page.start_cursor, None);
        assert_eq!(page.end_cursor, None);
        assert_eq!(page.total_count, 3);

        let empty = MemorySource::new(Vec::new());
        let page = paginate(&empty, &request(0, 0, None)).await.unwrap();
        assert!(!page.has_next_page);
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn stale_cursor_yields_empty_page_not_error() {
        let source = MemorySource::new(rows_with_distinct_timestamps(5));
        let gone = Uuid::new_v4().to_string();
        let page = paginate(&source, &request(0, 10, Some(gone))).await.unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next_page);
        assert_eq!(page.total_count, 5);

        // Malformed cursors anchor nowhere either.
        let page = paginate(&source, &request(0, 10, Some("not-a-uuid".into())))
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn shared_timestamps_page_deterministically() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let rows: Vec<Anchor> = (0..12)
            .map(|_| Anchor {
                created_at: ts,
                id: Uuid::new_v4(),
            })
            .collect();
        let source = MemorySource::new(rows);

        // Walk the whole set by cursor; the id tiebreak must visit each
        // record exactly once.
        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = paginate(&source, &request(0, 5, cursor.clone()))
                .await
                .unwrap();
            for (_, c) in &page.items {
                assert!(!seen.contains(c), "record visited twice: {}", c);
                seen.push(c.clone());
            }
            if !page.has_next_page {
                break;
            }
            cursor = page.end_cursor.clone();
        }
        assert_eq!(seen.len(), 12);
    }
}
