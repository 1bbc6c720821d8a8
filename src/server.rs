//! HTTP server wiring
//!
//! axum router exposing the GraphQL endpoint (POST operations, GET
//! GraphiQL), the subscription WebSocket, static serving of uploaded
//! blobs, and a health probe. Every request's credential is classified
//! into an `AuthAttempt` here, before execution, so resolvers only ever
//! see the classification.

use std::path::Path;

use async_graphql::http::{ALL_WEBSOCKET_PROTOCOLS, GraphiQLSource};
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::graphql::{AuthAttempt, AuthUser, QuillpadSchema};
use crate::services::TokenCodec;
use crate::services::storage::PUBLIC_PREFIX;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub schema: QuillpadSchema,
    pub codec: TokenCodec,
}

/// Build the application router
pub fn build_router(
    schema: QuillpadSchema,
    codec: TokenCodec,
    uploads_path: impl AsRef<Path>,
) -> Router {
    let state = AppState { schema, codec };

    Router::new()
        .route("/health", get(health))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/graphql/ws", get(graphql_ws_handler))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(uploads_path.as_ref()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Classify a bearer credential into a request identity
fn classify_token(token: Option<&str>, codec: &TokenCodec) -> AuthAttempt {
    match token {
        None => AuthAttempt::Anonymous,
        Some(token) => match codec.verify(token.trim()) {
            Ok(user_id) => AuthAttempt::Verified(AuthUser { user_id }),
            Err(e) => AuthAttempt::Invalid(e.to_string()),
        },
    }
}

/// Classify the Authorization header of an HTTP request.
///
/// A header that is present but not a well-formed `Bearer` credential is
/// an invalid attempt, never anonymous.
fn classify_headers(headers: &HeaderMap, codec: &TokenCodec) -> AuthAttempt {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return AuthAttempt::Anonymous;
    };
    match header.to_str().ok().and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => classify_token(Some(token), codec),
        None => AuthAttempt::Invalid("Malformed Authorization header".to_string()),
    }
}

/// Classify the `connection_init` payload of a WebSocket client
fn classify_init_payload(payload: &serde_json::Value, codec: &TokenCodec) -> AuthAttempt {
    let Some(value) = payload
        .get("Authorization")
        .or_else(|| payload.get("authorization"))
    else {
        return AuthAttempt::Anonymous;
    };
    match value.as_str().and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => classify_token(Some(token), codec),
        None => AuthAttempt::Invalid("Malformed Authorization payload".to_string()),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// GraphQL query/mutation handler with per-request identity
async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let attempt = classify_headers(&headers, &state.codec);
    state
        .schema
        .execute(req.into_inner().data(attempt))
        .await
        .into()
}

/// GraphiQL interactive playground
async fn graphiql() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint("/graphql/ws")
            .finish(),
    )
}

/// GraphQL WebSocket handler for subscriptions.
///
/// The credential arrives in the `connection_init` payload (the browser
/// WebSocket API cannot set headers), falling back to request headers for
/// non-browser clients.
async fn graphql_ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    protocol: GraphQLProtocol,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let header_attempt = classify_headers(&headers, &state.codec);

    ws.protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| async move {
            let codec = state.codec.clone();
            GraphQLWebSocket::new(socket, state.schema.clone(), protocol)
                .on_connection_init(move |payload: serde_json::Value| {
                    let attempt = match classify_init_payload(&payload, &codec) {
                        AuthAttempt::Anonymous => header_attempt,
                        classified => classified,
                    };
                    async move {
                        let mut data = async_graphql::Data::default();
                        data.insert(attempt);
                        Ok(data)
                    }
                })
                .serve()
                .await
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret")
    }

    #[test]
    fn missing_header_is_anonymous() {
        let headers = HeaderMap::new();
        assert_matches!(
            classify_headers(&headers, &codec()),
            AuthAttempt::Anonymous
        );
    }

    #[test]
    fn valid_bearer_is_verified() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let token = codec.issue(user_id).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());

        assert_matches!(
            classify_headers(&headers, &codec),
            AuthAttempt::Verified(user) if user.user_id == user_id
        );
    }

    #[test]
    fn bad_token_and_bad_scheme_are_invalid_not_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer not-a-token".parse().unwrap());
        assert_matches!(classify_headers(&headers, &codec()), AuthAttempt::Invalid(_));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_matches!(classify_headers(&headers, &codec()), AuthAttempt::Invalid(_));
    }

    #[test]
    fn init_payload_accepts_either_key_case() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let token = codec.issue(user_id).unwrap();

        for key in ["Authorization", "authorization"] {
            let payload = serde_json::json!({ key: format!("Bearer {token}") });
            assert_matches!(
                classify_init_payload(&payload, &codec),
                AuthAttempt::Verified(user) if user.user_id == user_id
            );
        }

        assert_matches!(
            classify_init_payload(&serde_json::json!({}), &codec),
            AuthAttempt::Anonymous
        );
    }
}
