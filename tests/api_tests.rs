//! End-to-end tests executing the real GraphQL schema against an
//! in-memory SQLite database, with a fresh change notifier per test.

use std::sync::Arc;
use std::time::Duration;

use async_graphql::{Request, Response, Value, Variables};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use quillpad::db::Database;
use quillpad::graphql::{AuthAttempt, AuthUser, QuillpadSchema, build_schema};
use quillpad::services::{ChangeNotifier, StorageService, TokenCodec, Topic};

struct TestApp {
    schema: QuillpadSchema,
    notifier: Arc<ChangeNotifier>,
    _uploads: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.ensure_schema().await.unwrap();

    let notifier = Arc::new(ChangeNotifier::default());
    let uploads = tempfile::tempdir().unwrap();
    let storage = StorageService::new(uploads.path());
    let schema = build_schema(
        db,
        notifier.clone(),
        TokenCodec::new("test-secret"),
        storage,
    );

    TestApp {
        schema,
        notifier,
        _uploads: uploads,
    }
}

fn verified(user_id: Uuid) -> AuthAttempt {
    AuthAttempt::Verified(AuthUser { user_id })
}

impl TestApp {
    async fn execute(&self, query: &str, attempt: AuthAttempt) -> Response {
        self.schema.execute(Request::new(query).data(attempt)).await
    }

    async fn execute_vars(
        &self,
        query: &str,
        variables: serde_json::Value,
        attempt: AuthAttempt,
    ) -> Response {
        self.schema
            .execute(
                Request::new(query)
                    .variables(Variables::from_json(variables))
                    .data(attempt),
            )
            .await
    }

    /// Register an account and return its id
    async fn signup(&self, email: &str, name: &str) -> Uuid {
        let response = self
            .execute_vars(
                r#"mutation($email: String!, $name: String!) {
                    createUser(input: { email: $email, name: $name, password: "hunter2xyz" }) {
                        token
                        user { id }
                    }
                }"#,
                json!({ "email": email, "name": name }),
                AuthAttempt::Anonymous,
            )
            .await;
        let data = ok(response);
        Uuid::parse_str(data["createUser"]["user"]["id"].as_str().unwrap()).unwrap()
    }

    /// Create a post and return its id
    async fn create_post(&self, author: Uuid, title: &str, published: bool) -> String {
        let response = self
            .execute_vars(
                r#"mutation($title: String!, $published: Boolean!) {
                    createPost(input: { title: $title, content: "body", published: $published }) {
                        id
                    }
                }"#,
                json!({ "title": title, "published": published }),
                verified(author),
            )
            .await;
        ok(response)["createPost"]["id"].as_str().unwrap().to_string()
    }

    /// Create a book and return its id
    async fn create_book(&self, author: Uuid, title: &str, description: &str) -> String {
        let response = self
            .execute_vars(
                r#"mutation($title: String!, $description: String!) {
                    createBook(input: { title: $title, description: $description, published: true }) {
                        id
                    }
                }"#,
                json!({ "title": title, "description": description }),
                verified(author),
            )
            .await;
        ok(response)["createBook"]["id"].as_str().unwrap().to_string()
    }
}

/// Assert success and return the response data as JSON
fn ok(response: Response) -> serde_json::Value {
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

/// Extract the machine-readable code of the first error
fn error_code(response: &Response) -> String {
    let error = response.errors.first().expect("expected an error");
    match error.extensions.as_ref().and_then(|e| e.get("code")) {
        Some(Value::String(code)) => code.clone(),
        other => panic!("error carries no code: {other:?} ({})", error.message),
    }
}

// ---------------------------------------------------------------------------
// Accounts and credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_returns_token_and_rejects_duplicate_email() {
    let app = spawn_app().await;

    let response = app
        .execute(
            r#"mutation {
                createUser(input: { email: "ada@example.com", name: "Ada", password: "hunter2xyz" }) {
                    token
                    user { email name }
                }
            }"#,
            AuthAttempt::Anonymous,
        )
        .await;
    let data = ok(response);
    assert!(!data["createUser"]["token"].as_str().unwrap().is_empty());
    assert_eq!(data["createUser"]["user"]["email"], "ada@example.com");

    let duplicate = app
        .execute(
            r#"mutation {
                createUser(input: { email: "ada@example.com", name: "Again", password: "hunter2xyz" }) {
                    token
                }
            }"#,
            AuthAttempt::Anonymous,
        )
        .await;
    assert_eq!(error_code(&duplicate), "VALIDATION_FAILURE");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    app.signup("ada@example.com", "Ada").await;

    let good = app
        .execute(
            r#"mutation { login(email: "ada@example.com", password: "hunter2xyz") { token } }"#,
            AuthAttempt::Anonymous,
        )
        .await;
    assert!(!ok(good)["login"]["token"].as_str().unwrap().is_empty());

    let wrong_password = app
        .execute(
            r#"mutation { login(email: "ada@example.com", password: "wrong-password") { token } }"#,
            AuthAttempt::Anonymous,
        )
        .await;
    let unknown_email = app
        .execute(
            r#"mutation { login(email: "nobody@example.com", password: "hunter2xyz") { token } }"#,
            AuthAttempt::Anonymous,
        )
        .await;

    assert_eq!(error_code(&wrong_password), "INVALID_CREDENTIAL");
    assert_eq!(error_code(&unknown_email), "INVALID_CREDENTIAL");
    assert_eq!(
        wrong_password.errors[0].message,
        unknown_email.errors[0].message
    );
}

#[tokio::test]
async fn missing_and_invalid_credentials_are_distinct_errors() {
    let app = spawn_app().await;

    let mutation = r#"mutation {
        createPost(input: { title: "t", content: "c", published: true }) { id }
    }"#;

    let anonymous = app.execute(mutation, AuthAttempt::Anonymous).await;
    assert_eq!(error_code(&anonymous), "AUTHENTICATION_REQUIRED");

    let invalid = app
        .execute(mutation, AuthAttempt::Invalid("token expired".to_string()))
        .await;
    assert_eq!(error_code(&invalid), "INVALID_CREDENTIAL");
}

#[tokio::test]
async fn me_requires_auth_and_lookup_miss_is_null() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;

    let me = app.execute("{ me { name } }", verified(ada)).await;
    assert_eq!(ok(me)["me"]["name"], "Ada");

    let anonymous = app.execute("{ me { name } }", AuthAttempt::Anonymous).await;
    assert_eq!(error_code(&anonymous), "AUTHENTICATION_REQUIRED");

    let missing = app
        .execute_vars(
            "query($id: ID!) { user(id: $id) { name } }",
            json!({ "id": Uuid::new_v4().to_string() }),
            AuthAttempt::Anonymous,
        )
        .await;
    assert_eq!(ok(missing)["user"], serde_json::Value::Null);
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

const POSTS_PAGE: &str = r#"query($skip: Int, $take: Int, $cursor: ID) {
    posts(page: { skip: $skip, take: $take, cursor: $cursor }) {
        edges { node { id title } cursor }
        pageInfo { hasNextPage hasPreviousPage startCursor endCursor totalCount }
    }
}"#;

#[tokio::test]
async fn offset_and_cursor_paging_walk_the_whole_set() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    for n in 0..25 {
        app.create_post(ada, &format!("post {n}"), true).await;
    }

    // First offset page.
    let first = ok(app
        .execute_vars(POSTS_PAGE, json!({ "take": 10 }), AuthAttempt::Anonymous)
        .await);
    let info = &first["posts"]["pageInfo"];
    assert_eq!(first["posts"]["edges"].as_array().unwrap().len(), 10);
    assert_eq!(info["totalCount"], 25);
    assert_eq!(info["hasNextPage"], true);
    assert_eq!(info["hasPreviousPage"], false);

    // Last offset page.
    let last = ok(app
        .execute_vars(
            POSTS_PAGE,
            json!({ "skip": 20, "take": 10 }),
            AuthAttempt::Anonymous,
        )
        .await);
    assert_eq!(last["posts"]["edges"].as_array().unwrap().len(), 5);
    assert_eq!(last["posts"]["pageInfo"]["hasNextPage"], false);
    assert_eq!(last["posts"]["pageInfo"]["hasPreviousPage"], true);

    // Cursor walk covers all 25 records exactly once, regardless of
    // shared timestamps.
    let mut seen = std::collections::HashSet::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = ok(app
            .execute_vars(
                POSTS_PAGE,
                json!({ "take": 10, "cursor": cursor }),
                AuthAttempt::Anonymous,
            )
            .await);
        for edge in page["posts"]["edges"].as_array().unwrap() {
            assert!(seen.insert(edge["node"]["id"].as_str().unwrap().to_string()));
        }
        if page["posts"]["pageInfo"]["hasNextPage"] != true {
            break;
        }
        cursor = Some(
            page["posts"]["pageInfo"]["endCursor"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }
    assert_eq!(seen.len(), 25);
}

#[tokio::test]
async fn zero_take_and_stale_cursor_yield_empty_pages_with_real_total() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    for n in 0..3 {
        app.create_post(ada, &format!("post {n}"), true).await;
    }

    let zero = ok(app
        .execute_vars(POSTS_PAGE, json!({ "take": 0 }), AuthAttempt::Anonymous)
        .await);
    assert_eq!(zero["posts"]["edges"].as_array().unwrap().len(), 0);
    assert_eq!(zero["posts"]["pageInfo"]["hasNextPage"], true);
    assert_eq!(zero["posts"]["pageInfo"]["totalCount"], 3);

    for stale in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let page = ok(app
            .execute_vars(
                POSTS_PAGE,
                json!({ "take": 10, "cursor": stale }),
                AuthAttempt::Anonymous,
            )
            .await);
        assert_eq!(page["posts"]["edges"].as_array().unwrap().len(), 0);
        assert_eq!(page["posts"]["pageInfo"]["totalCount"], 3);
        assert_eq!(page["posts"]["pageInfo"]["hasNextPage"], false);
    }

    let negative = app
        .execute_vars(POSTS_PAGE, json!({ "take": -1 }), AuthAttempt::Anonymous)
        .await;
    assert_eq!(error_code(&negative), "VALIDATION_FAILURE");
}

// ---------------------------------------------------------------------------
// Published-state visibility and events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn drafts_are_hidden_and_publish_emits_exactly_one_event() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    let mut events = app.notifier.subscribe(Topic::Post);

    let post_id = app.create_post(ada, "draft", false).await;

    // Invisible in the public listing, no event published.
    let listing = ok(app
        .execute_vars(POSTS_PAGE, json!({}), AuthAttempt::Anonymous)
        .await);
    assert_eq!(listing["posts"]["pageInfo"]["totalCount"], 0);
    assert!(events.try_recv().is_err());

    // Visible to the author through myPosts.
    let mine = ok(app
        .execute("{ myPosts { pageInfo { totalCount } } }", verified(ada))
        .await);
    assert_eq!(mine["myPosts"]["pageInfo"]["totalCount"], 1);

    // Publishing makes it visible and emits a single UPDATED event.
    ok(app
        .execute_vars(
            r#"mutation($id: ID!) {
                updatePost(id: $id, input: { published: true }) { published }
            }"#,
            json!({ "id": post_id }),
            verified(ada),
        )
        .await);

    let listing = ok(app
        .execute_vars(POSTS_PAGE, json!({}), AuthAttempt::Anonymous)
        .await);
    assert_eq!(listing["posts"]["pageInfo"]["totalCount"], 1);

    let event = events.try_recv().unwrap();
    assert_eq!(event.mutation, quillpad::services::MutationKind::Updated);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn non_owner_mutations_look_like_missing_records() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    let eve = app.signup("eve@example.com", "Eve").await;
    let post_id = app.create_post(ada, "mine", true).await;

    let update = app
        .execute_vars(
            r#"mutation($id: ID!) { updatePost(id: $id, input: { title: "stolen" }) { id } }"#,
            json!({ "id": post_id }),
            verified(eve),
        )
        .await;
    assert_eq!(error_code(&update), "NOT_FOUND_OR_FORBIDDEN");

    let delete = app
        .execute_vars(
            "mutation($id: ID!) { deletePost(id: $id) { id } }",
            json!({ "id": post_id }),
            verified(eve),
        )
        .await;
    assert_eq!(error_code(&delete), "NOT_FOUND_OR_FORBIDDEN");

    // The record is untouched.
    let lookup = ok(app
        .execute_vars(
            "query($id: ID!) { post(id: $id) { title } }",
            json!({ "id": post_id }),
            AuthAttempt::Anonymous,
        )
        .await);
    assert_eq!(lookup["post"]["title"], "mine");
}

// ---------------------------------------------------------------------------
// Comments and reviews
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comments_require_an_existing_post() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;

    let orphan = app
        .execute_vars(
            r#"mutation($postId: ID!) {
                createComment(input: { content: "hi", postId: $postId, published: true }) { id }
            }"#,
            json!({ "postId": Uuid::new_v4().to_string() }),
            verified(ada),
        )
        .await;
    assert_eq!(error_code(&orphan), "VALIDATION_FAILURE");

    let post_id = app.create_post(ada, "post", true).await;
    let created = ok(app
        .execute_vars(
            r#"mutation($postId: ID!) {
                createComment(input: { content: "hi", postId: $postId, published: true }) {
                    content
                    post { title }
                }
            }"#,
            json!({ "postId": post_id }),
            verified(ada),
        )
        .await);
    assert_eq!(created["createComment"]["post"]["title"], "post");

    let listing = ok(app
        .execute_vars(
            r#"query($postId: ID) {
                comments(postId: $postId) { pageInfo { totalCount } }
            }"#,
            json!({ "postId": post_id }),
            AuthAttempt::Anonymous,
        )
        .await);
    assert_eq!(listing["comments"]["pageInfo"]["totalCount"], 1);
}

#[tokio::test]
async fn review_ratings_are_bounded_and_need_a_real_book() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    let book_id = app.create_book(ada, "Dune", "sand").await;

    for rating in [0, 6] {
        let response = app
            .execute_vars(
                r#"mutation($bookId: ID!, $rating: Int!) {
                    createReview(input: { comment: "x", rating: $rating, bookId: $bookId, published: true }) { id }
                }"#,
                json!({ "bookId": book_id, "rating": rating }),
                verified(ada),
            )
            .await;
        assert_eq!(error_code(&response), "VALIDATION_FAILURE");
    }

    let missing_book = app
        .execute_vars(
            r#"mutation($bookId: ID!) {
                createReview(input: { comment: "x", rating: 5, bookId: $bookId, published: true }) { id }
            }"#,
            json!({ "bookId": Uuid::new_v4().to_string() }),
            verified(ada),
        )
        .await;
    assert_eq!(error_code(&missing_book), "VALIDATION_FAILURE");

    let created = ok(app
        .execute_vars(
            r#"mutation($bookId: ID!) {
                createReview(input: { comment: "great", rating: 5, bookId: $bookId, published: true }) {
                    rating
                    book { title }
                }
            }"#,
            json!({ "bookId": book_id }),
            verified(ada),
        )
        .await);
    assert_eq!(created["createReview"]["rating"], 5);
    assert_eq!(created["createReview"]["book"]["title"], "Dune");
}

// ---------------------------------------------------------------------------
// Search and relations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_spans_posts_and_books_but_skips_drafts() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    app.create_post(ada, "Rust in Action", true).await;
    app.create_post(ada, "Rust draft notes", false).await;
    app.create_book(ada, "Cooking", "rustic recipes").await;

    let results = ok(app
        .execute(
            r#"{ search(query: "rust") { __typename } }"#,
            AuthAttempt::Anonymous,
        )
        .await);
    let names: Vec<&str> = results["search"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["__typename"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Post"));
    assert!(names.contains(&"Book"));
}

#[tokio::test]
async fn search_treats_like_wildcards_as_literals() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    app.create_post(ada, "100% finished", true).await;
    app.create_post(ada, "100 days of code", true).await;
    app.create_post(ada, "a_b naming", true).await;
    app.create_post(ada, "amb naming", true).await;

    // "%" must not degenerate into a wildcard.
    let results = ok(app
        .execute(
            r#"{ search(query: "100%") { ... on Post { title } } }"#,
            AuthAttempt::Anonymous,
        )
        .await);
    let hits = results["search"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "100% finished");

    // "_" must not match an arbitrary character.
    let results = ok(app
        .execute(
            r#"{ search(query: "a_b") { ... on Post { title } } }"#,
            AuthAttempt::Anonymous,
        )
        .await);
    let hits = results["search"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "a_b naming");
}

#[tokio::test]
async fn relations_resolve_lazily_from_any_side() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    let post_id = app.create_post(ada, "post", true).await;
    ok(app
        .execute_vars(
            r#"mutation($postId: ID!) {
                createComment(input: { content: "nice", postId: $postId, published: true }) { id }
            }"#,
            json!({ "postId": post_id }),
            verified(ada),
        )
        .await);

    let data = ok(app
        .execute_vars(
            r#"query($id: ID!) {
                post(id: $id) {
                    author { name posts { title } }
                    comments { content author { name } }
                }
            }"#,
            json!({ "id": post_id }),
            AuthAttempt::Anonymous,
        )
        .await);
    assert_eq!(data["post"]["author"]["name"], "Ada");
    assert_eq!(data["post"]["comments"][0]["content"], "nice");
    assert_eq!(data["post"]["comments"][0]["author"]["name"], "Ada");
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_subscription_receives_created_events() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;

    let mut stream = app.schema.execute_stream(
        Request::new("subscription { post { mutation node { title } } }")
            .data(AuthAttempt::Anonymous),
    );
    let first = tokio::spawn(async move { stream.next().await });

    // The stream subscribes on first poll; wait until it is registered
    // before publishing anything.
    while app.notifier.subscriber_count(Topic::Post) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Draft first: must not produce an event.
    app.create_post(ada, "draft", false).await;
    app.create_post(ada, "announced", true).await;

    let response = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .expect("subscription yielded nothing")
        .unwrap()
        .expect("stream ended");
    let data = ok(response);
    assert_eq!(data["post"]["mutation"], "CREATED");
    assert_eq!(data["post"]["node"]["title"], "announced");
}

#[tokio::test]
async fn comment_subscription_validates_its_post() {
    let app = spawn_app().await;

    let mut bad = app.schema.execute_stream(
        Request::new(format!(
            r#"subscription {{ comment(postId: "{}") {{ mutation }} }}"#,
            Uuid::new_v4()
        ))
        .data(AuthAttempt::Anonymous),
    );
    let response = bad.next().await.expect("expected an error response");
    assert_eq!(error_code(&response), "VALIDATION_FAILURE");
}

#[tokio::test]
async fn user_subscription_requires_auth() {
    let app = spawn_app().await;

    let mut stream = app.schema.execute_stream(
        Request::new("subscription { user { mutation } }").data(AuthAttempt::Anonymous),
    );
    let response = stream.next().await.expect("expected an error response");
    assert_eq!(error_code(&response), "AUTHENTICATION_REQUIRED");
}

// ---------------------------------------------------------------------------
// File uploads
// ---------------------------------------------------------------------------

fn upload_request(query: &str, attempt: AuthAttempt) -> Request {
    let content = {
        use std::io::{Seek, Write};
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"hello upload").unwrap();
        file.rewind().unwrap();
        file
    };
    let mut request = Request::new(query)
        .variables(Variables::from_json(json!({ "file": null })))
        .data(attempt);
    request.set_upload(
        "variables.file",
        async_graphql::UploadValue {
            filename: "notes.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            content,
        },
    );
    request
}

const UPLOAD_MUTATION: &str = r#"mutation($file: Upload!) {
    uploadFile(file: $file) { id filename mimetype url user { name } }
}"#;

#[tokio::test]
async fn anonymous_uploads_are_allowed_and_unowned() {
    let app = spawn_app().await;

    let response = app
        .schema
        .execute(upload_request(UPLOAD_MUTATION, AuthAttempt::Anonymous))
        .await;
    let data = ok(response);
    assert!(data["uploadFile"]["filename"]
        .as_str()
        .unwrap()
        .ends_with("-notes.txt"));
    assert_eq!(data["uploadFile"]["mimetype"], "text/plain");
    assert_eq!(data["uploadFile"]["user"], serde_json::Value::Null);
}

#[tokio::test]
async fn owned_files_are_deletable_only_by_their_owner() {
    let app = spawn_app().await;
    let ada = app.signup("ada@example.com", "Ada").await;
    let eve = app.signup("eve@example.com", "Eve").await;

    let uploaded = ok(app
        .schema
        .execute(upload_request(UPLOAD_MUTATION, verified(ada)))
        .await);
    let file_id = uploaded["uploadFile"]["id"].as_str().unwrap().to_string();
    assert_eq!(uploaded["uploadFile"]["user"]["name"], "Ada");

    let stranger = app
        .execute_vars(
            "mutation($id: ID!) { deleteFile(id: $id) { id } }",
            json!({ "id": file_id }),
            verified(eve),
        )
        .await;
    assert_eq!(error_code(&stranger), "NOT_FOUND_OR_FORBIDDEN");

    let owner = ok(app
        .execute_vars(
            "mutation($id: ID!) { deleteFile(id: $id) { id } }",
            json!({ "id": file_id }),
            verified(ada),
        )
        .await);
    assert_eq!(owner["deleteFile"]["id"].as_str().unwrap(), file_id);

    let anonymous = app
        .execute_vars(
            "mutation($id: ID!) { deleteFile(id: $id) { id } }",
            json!({ "id": file_id }),
            AuthAttempt::Anonymous,
        )
        .await;
    assert_eq!(error_code(&anonymous), "AUTHENTICATION_REQUIRED");
}
