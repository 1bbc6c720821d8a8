//! Connection types for paginated GraphQL queries
//!
//! Thin GraphQL surface over the engine in `db::pagination`: a `PageArgs`
//! input object, a shared `PageInfo`, and a `define_connection!` macro that
//! stamps out per-entity edge/connection types.

use async_graphql::{ID, InputObject, Result, SimpleObject};

use crate::db::PageRequest;
use crate::graphql::errors;

/// Paging arguments accepted by every list query
#[derive(InputObject, Debug, Default, Clone)]
pub struct PageArgs {
    /// Records to skip from the top of the list (ignored when a cursor is set)
    #[graphql(default = 0)]
    pub skip: i32,
    /// Page size
    #[graphql(default = 10)]
    pub take: i32,
    /// Resume strictly after the record with this id
    pub cursor: Option<ID>,
}

impl PageArgs {
    /// Validate and convert into an engine page request
    pub fn to_request(args: Option<Self>) -> Result<PageRequest> {
        let args = args.unwrap_or_default();
        if args.skip < 0 {
            return Err(errors::validation_failure("skip must not be negative"));
        }
        if args.take < 0 {
            return Err(errors::validation_failure("take must not be negative"));
        }
        Ok(PageRequest {
            skip: args.skip as i64,
            take: args.take as i64,
            cursor: args.cursor.map(|c| c.to_string()),
        })
    }
}

/// Information about a page in a connection
#[derive(SimpleObject, Debug, Clone, Default)]
pub struct PageInfo {
    /// Whether more records follow this page
    pub has_next_page: bool,
    /// Whether records were skipped before this page
    pub has_previous_page: bool,
    /// Cursor of the first item in this page
    pub start_cursor: Option<String>,
    /// Cursor of the last item in this page
    pub end_cursor: Option<String>,
    /// Total records matching the filter, ignoring paging
    pub total_count: i64,
}

/// Define a GraphQL connection type for a specific entity
///
/// Usage:
/// ```ignore
/// define_connection!(PostConnection, PostEdge, Post);
/// ```
#[macro_export]
macro_rules! define_connection {
    ($conn_name:ident, $edge_name:ident, $node_type:ty) => {
        /// Edge containing a node and its cursor
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $edge_name {
            pub node: $node_type,
            pub cursor: String,
        }

        /// Connection containing edges and page info
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $conn_name {
            pub edges: Vec<$edge_name>,
            pub page_info: $crate::graphql::pagination::PageInfo,
        }

        impl $conn_name {
            /// Build from an engine page of database records
            pub fn from_page<R>(page: $crate::db::Page<R>) -> Self
            where
                $node_type: From<R>,
            {
                Self {
                    edges: page
                        .items
                        .into_iter()
                        .map(|(node, cursor)| $edge_name {
                            node: <$node_type>::from(node),
                            cursor,
                        })
                        .collect(),
                    page_info: $crate::graphql::pagination::PageInfo {
                        has_next_page: page.has_next_page,
                        has_previous_page: page.has_previous_page,
                        start_cursor: page.start_cursor,
                        end_cursor: page.end_cursor,
                        total_count: page.total_count,
                    },
                }
            }
        }
    };
}
