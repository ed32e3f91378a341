use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use cineloop_api::{
    api::{create_router, AppState},
    config::Config,
    error::{AppError, AppResult},
    models::{ChatMessage, ChatReply, SuggestionStub, Title, TitleType},
    services::{providers::TimeWindow, CatalogProvider, Recommender},
    storage::MemoryStorage,
};

/// Recommender that always suggests the same stubs
struct ScriptedRecommender {
    stubs: Vec<SuggestionStub>,
}

#[async_trait::async_trait]
impl Recommender for ScriptedRecommender {
    async fn chat(&self, _message: &str, _history: &[ChatMessage]) -> AppResult<ChatReply> {
        Ok(ChatReply {
            message: "Try these".to_string(),
            recommendations: self.stubs.clone(),
            continues: true,
        })
    }

    async fn search(&self, _query: &str, _context: Option<String>) -> AppResult<Vec<SuggestionStub>> {
        Ok(self.stubs.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Catalog that answers every search with the same hits
struct FixedCatalog {
    hits: Vec<Title>,
    fail: bool,
}

impl FixedCatalog {
    fn answers(&self) -> AppResult<Vec<Title>> {
        if self.fail {
            return Err(AppError::ExternalApi("catalog down".to_string()));
        }
        Ok(self.hits.iter().map(fresh_copy).collect())
    }
}

/// Catalog hits carry a fresh internal id on every call
fn fresh_copy(title: &Title) -> Title {
    Title {
        external_id: title.external_id.clone(),
        genres: title.genres.clone(),
        ..Title::new(title.name.clone(), title.title_type)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for FixedCatalog {
    async fn search(&self, _query: &str) -> AppResult<Vec<Title>> {
        self.answers()
    }

    async fn trending(&self, _window: TimeWindow) -> AppResult<Vec<Title>> {
        self.answers()
    }

    async fn popular(&self, _kind: TitleType) -> AppResult<Vec<Title>> {
        self.answers()
    }

    async fn top_rated(&self, _kind: TitleType) -> AppResult<Vec<Title>> {
        self.answers()
    }

    async fn details(&self, external_id: &str, _kind: TitleType) -> AppResult<Option<Title>> {
        Ok(self
            .answers()?
            .into_iter()
            .find(|t| t.external_id.as_deref() == Some(external_id)))
    }

    async fn similar(&self, _external_id: &str, _kind: TitleType) -> AppResult<Vec<Title>> {
        self.answers()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn catalog_title(name: &str, external_id: &str) -> Title {
    Title {
        external_id: Some(external_id.to_string()),
        genres: vec!["Drama".to_string()],
        ..Title::new(name, TitleType::Movie)
    }
}

fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryStorage::new()), Config::default())
}

fn create_test_server() -> TestServer {
    TestServer::new(create_router(test_state())).unwrap()
}

fn as_user(id: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-replit-user-id"),
        HeaderValue::from_str(id).unwrap(),
    )
}

async fn sign_in(server: &TestServer, id: &str) {
    let (name, value) = as_user(id);
    server
        .get("/api/auth/user")
        .add_header(name, value)
        .await
        .assert_status_ok();
}

async fn create_title(server: &TestServer, name: &str) -> String {
    let response = server
        .post("/api/titles")
        .json(&json!({ "name": name, "type": "movie", "genres": ["Drama"] }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn create_post(server: &TestServer, author: &str, title_id: &str) -> String {
    let (name, value) = as_user(author);
    let response = server
        .post("/api/posts")
        .add_header(name, value)
        .json(&json!({ "titleId": title_id, "caption": "worth it", "userRating": 4 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn likes_count(server: &TestServer, post_id: &str) -> i64 {
    let response = server.get(&format!("/api/posts/{}", post_id)).await;
    response.assert_status_ok();
    response.json::<Value>()["likesCount"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    server.get("/health").await.assert_status_ok();

    let response = server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["hasDb"], false);
    assert_eq!(body["hasOpenAI"], false);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-me"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-me");
}

#[tokio::test]
async fn test_followed_post_appears_in_feed() {
    let server = create_test_server();
    sign_in(&server, "alice").await;
    sign_in(&server, "bob").await;
    let title_id = create_title(&server, "Past Lives").await;

    let (name, value) = as_user("alice");
    server
        .post("/api/users/bob/follow")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::CREATED);

    let post_id = create_post(&server, "bob", &title_id).await;

    let (name, value) = as_user("alice");
    let response = server
        .get("/api/feed")
        .add_query_param("limit", 10)
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let feed: Vec<Value> = response.json();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["id"], post_id.as_str());
    assert_eq!(feed[0]["author"]["id"], "bob");
    assert_eq!(feed[0]["title"]["name"], "Past Lives");
    assert_eq!(feed[0]["isLiked"], false);
}

#[tokio::test]
async fn test_feed_excludes_unfollowed_authors() {
    let server = create_test_server();
    sign_in(&server, "alice").await;
    sign_in(&server, "carol").await;
    let title_id = create_title(&server, "Heat").await;
    create_post(&server, "carol", &title_id).await;

    let (name, value) = as_user("alice");
    let feed: Vec<Value> = server.get("/api/feed").add_header(name, value).await.json();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn test_feed_pages_are_consistent() {
    let server = create_test_server();
    let title_id = create_title(&server, "Heat").await;
    for _ in 0..5 {
        create_post(&server, "dev-user", &title_id).await;
    }

    let page = |limit: usize, offset: usize| {
        let server = &server;
        async move {
            let feed: Vec<Value> = server
                .get("/api/feed")
                .add_query_param("limit", limit)
                .add_query_param("offset", offset)
                .await
                .json();
            feed.into_iter()
                .map(|p| p["id"].as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        }
    };

    let whole = page(4, 0).await;
    let first = page(2, 0).await;
    let second = page(2, 2).await;

    assert_eq!(whole.len(), 4);
    assert_eq!(first, whole[..2]);
    assert_eq!(second, whole[2..]);
}

#[tokio::test]
async fn test_feed_offset_past_the_end_is_empty() {
    let server = create_test_server();
    let title_id = create_title(&server, "Heat").await;
    create_post(&server, "dev-user", &title_id).await;

    let response = server
        .get("/api/feed")
        .add_query_param("offset", usize::MAX)
        .await;
    response.assert_status_ok();
    assert!(response.json::<Vec<Value>>().is_empty());
}

#[tokio::test]
async fn test_like_is_counted_once() {
    let server = create_test_server();
    let title_id = create_title(&server, "Arrival").await;
    let post_id = create_post(&server, "dev-user", &title_id).await;
    let like = format!("/api/posts/{}/like", post_id);

    server.post(&like).await.assert_status_ok();
    assert_eq!(likes_count(&server, &post_id).await, 1);

    server.post(&like).await.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(likes_count(&server, &post_id).await, 1);

    let response = server.delete(&like).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Post unliked");
    assert_eq!(likes_count(&server, &post_id).await, 0);

    server.delete(&like).await.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(likes_count(&server, &post_id).await, 0);
}

#[tokio::test]
async fn test_saved_post_shows_in_feed_state() {
    let server = create_test_server();
    let title_id = create_title(&server, "Arrival").await;
    let post_id = create_post(&server, "dev-user", &title_id).await;

    server
        .post(&format!("/api/posts/{}/save", post_id))
        .await
        .assert_status_ok();

    let feed: Vec<Value> = server.get("/api/feed").await.json();
    assert_eq!(feed[0]["isSaved"], true);
    assert_eq!(feed[0]["savesCount"], 1);
}

#[tokio::test]
async fn test_like_missing_post_is_not_found() {
    let server = create_test_server();
    server
        .post(&format!("/api/posts/{}/like", uuid::Uuid::new_v4()))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_invalid_post_is_rejected() {
    let server = create_test_server();
    let title_id = create_title(&server, "Dune").await;

    let response = server
        .post("/api/posts")
        .json(&json!({ "titleId": title_id, "userRating": 9 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["field"], "user_rating");

    server
        .post("/api/posts")
        .json(&json!({ "caption": "no title" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/posts")
        .json(&json!({ "titleId": uuid::Uuid::new_v4() }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_only_author_deletes_comment() {
    let server = create_test_server();
    let title_id = create_title(&server, "Dune").await;
    let post_id = create_post(&server, "dev-user", &title_id).await;

    let response = server
        .post(&format!("/api/posts/{}/comments", post_id))
        .json(&json!({ "content": "The sound design!" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let comment_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let (name, value) = as_user("mallory");
    server
        .delete(&format!("/api/comments/{}", comment_id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .delete(&format!("/api/comments/{}", comment_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let comments: Vec<Value> = server
        .get(&format!("/api/posts/{}/comments", post_id))
        .await
        .json();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_ai_chat_requires_recommender() {
    let server = create_test_server();
    let response = server
        .post("/api/ai/chat")
        .json(&json!({ "message": "something cozy" }))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    server
        .post("/api/ai/search")
        .json(&json!({ "query": "heist" }))
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_ai_chat_returns_unresolved_suggestion() {
    let recommender = ScriptedRecommender {
        stubs: vec![SuggestionStub::new("Nonexistent Film XYZ", "test")],
    };
    let state = test_state().with_recommender(Arc::new(recommender));
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/ai/chat")
        .json(&json!({ "message": "surprise me", "conversationHistory": [] }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["message"], "Try these");
    assert_eq!(body["conversationContinues"], true);
    assert!(body["sessionId"].as_str().unwrap().starts_with("session_"));

    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0]["resolved"], false);
    assert_eq!(recommendations[0]["name"], "Nonexistent Film XYZ");
    assert_eq!(recommendations[0]["reason"], "test");
}

#[tokio::test]
async fn test_ai_search_resolves_through_catalog() {
    let recommender = ScriptedRecommender {
        stubs: vec![SuggestionStub::new("Heat", "a heist classic")],
    };
    let catalog = FixedCatalog {
        hits: vec![catalog_title("Heat", "949")],
        fail: false,
    };
    let state = test_state()
        .with_recommender(Arc::new(recommender))
        .with_catalog(Arc::new(catalog));
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/ai/search")
        .json(&json!({ "query": "heists", "context": "90s" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["results"][0]["resolved"], true);
    assert_eq!(body["results"][0]["externalId"], "949");
    assert_eq!(body["results"][0]["reason"], "a heist classic");
}

#[tokio::test]
async fn test_search_reconciles_catalog_ids() {
    let catalog = FixedCatalog {
        hits: vec![catalog_title("Arrival", "329865")],
        fail: false,
    };
    let server = TestServer::new(create_router(test_state().with_catalog(Arc::new(catalog)))).unwrap();

    let first: Vec<Value> = server.get("/api/search").add_query_param("q", "arrival").await.json();
    let second: Vec<Value> = server.get("/api/search").add_query_param("q", "arrival").await.json();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0]["id"], second[0]["id"]);

    let id = first[0]["id"].as_str().unwrap();
    server
        .get(&format!("/api/titles/{}", id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_search_falls_back_to_storage() {
    let catalog = FixedCatalog {
        hits: vec![],
        fail: true,
    };
    let server = TestServer::new(create_router(test_state().with_catalog(Arc::new(catalog)))).unwrap();
    create_title(&server, "Blade Runner 2049").await;

    let response = server.get("/api/search").add_query_param("q", "blade").await;
    response.assert_status_ok();
    let results: Vec<Value> = response.json();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Blade Runner 2049");

    server
        .get("/api/search")
        .add_query_param("q", "  ")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trending_seeds_from_catalog_when_empty() {
    let catalog = FixedCatalog {
        hits: vec![catalog_title("Dune", "438631"), catalog_title("Heat", "949")],
        fail: false,
    };
    let server = TestServer::new(create_router(test_state().with_catalog(Arc::new(catalog)))).unwrap();

    let trending: Vec<Value> = server.get("/api/titles/trending").await.json();
    assert_eq!(trending.len(), 2);
    assert_eq!(trending[0]["name"], "Dune");

    let id = trending[1]["id"].as_str().unwrap();
    server
        .get(&format!("/api/titles/{}", id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_watchlist_membership() {
    let server = create_test_server();
    let title_id = create_title(&server, "The Bear").await;
    let path = format!("/api/watchlist/{}", title_id);

    let body: Value = server.get(&path).await.json();
    assert_eq!(body["inList"], false);

    server.post(&path).await.assert_status_ok();
    server.post(&path).await.assert_status_ok();

    let body: Value = server.get(&path).await.json();
    assert_eq!(body["inList"], true);

    let watchlist: Value = server.get("/api/users/dev-user/watchlist").await.json();
    assert_eq!(watchlist["titleIds"].as_array().unwrap().len(), 1);

    server.delete(&path).await.assert_status_ok();
    let body: Value = server.get(&path).await.json();
    assert_eq!(body["inList"], false);
}

#[tokio::test]
async fn test_system_lists_are_protected() {
    let server = create_test_server();
    sign_in(&server, "dev-user").await;

    let watchlist: Value = server.get("/api/users/dev-user/watchlist").await.json();
    let path = format!("/api/lists/{}", watchlist["id"].as_str().unwrap());

    server.delete(&path).await.assert_status(StatusCode::BAD_REQUEST);
    server
        .patch(&path)
        .json(&json!({ "name": "Later" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .patch(&path)
        .json(&json!({ "isPublic": true }))
        .await
        .assert_status_ok();

    let (name, value) = as_user("mallory");
    server
        .patch(&path)
        .add_header(name, value)
        .json(&json!({ "description": "mine now" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_custom_list_lifecycle() {
    let server = create_test_server();
    let title_id = create_title(&server, "Heat").await;

    let response = server
        .post("/api/lists")
        .json(&json!({ "name": "Heists", "isPublic": true }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let list_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let list: Value = server
        .post(&format!("/api/lists/{}/titles/{}", list_id, title_id))
        .await
        .json();
    assert_eq!(list["titleIds"][0], title_id.as_str());

    let lists: Vec<Value> = server.get("/api/users/dev-user/lists").await.json();
    assert_eq!(lists.len(), 3);

    server
        .delete(&format!("/api/lists/{}", list_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/lists/{}", list_id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_follow_rules() {
    let server = create_test_server();
    sign_in(&server, "alice").await;
    sign_in(&server, "bob").await;

    let (name, value) = as_user("alice");
    server
        .post("/api/users/alice/follow")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/users/bob/follow")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/users/bob/follow")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    server
        .post("/api/users/nobody/follow")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_not_found();

    let stats: Value = server.get("/api/users/bob/follow-stats").await.json();
    assert_eq!(stats["followersCount"], 1);
    assert_eq!(stats["followingCount"], 0);

    server
        .delete("/api/users/bob/follow")
        .add_header(name, value)
        .await
        .assert_status_ok();
    let stats: Value = server.get("/api/users/bob/follow-stats").await.json();
    assert_eq!(stats["followersCount"], 0);
}

#[tokio::test]
async fn test_report_marks_post() {
    let server = create_test_server();
    let title_id = create_title(&server, "Heat").await;
    let post_id = create_post(&server, "dev-user", &title_id).await;

    let response = server
        .post("/api/reports")
        .json(&json!({ "postId": post_id, "reason": "spoilers" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let report_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let post: Value = server.get(&format!("/api/posts/{}", post_id)).await.json();
    assert_eq!(post["isReported"], true);

    server
        .patch(&format!("/api/reports/{}", report_id))
        .json(&json!({ "status": "resolved" }))
        .await
        .assert_status_ok();

    let pending: Vec<Value> = server
        .get("/api/reports")
        .add_query_param("status", "pending")
        .await
        .json();
    assert!(pending.is_empty());

    server
        .post("/api/reports")
        .json(&json!({ "reason": "no target" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_owner_marks_recommendation_shown() {
    let server = create_test_server();
    let title_id = create_title(&server, "Paddington 2").await;

    let response = server
        .post("/api/recommendations")
        .json(&json!({ "titleId": title_id, "reason": "warm", "score": 0.8 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let shown = format!(
        "/api/recommendations/{}/shown",
        response.json::<Value>()["id"].as_str().unwrap()
    );

    let (name, value) = as_user("mallory");
    server
        .post(&shown)
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let pending: Vec<Value> = server.get("/api/recommendations").await.json();
    assert_eq!(pending.len(), 1);

    server.post(&shown).await.assert_status_ok();
    let pending: Vec<Value> = server.get("/api/recommendations").await.json();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn test_production_requires_identity() {
    let config = Config {
        app_env: "production".to_string(),
        ..Config::default()
    };
    let state = AppState::new(Arc::new(MemoryStorage::new()), config);
    let server = TestServer::new(create_router(state)).unwrap();

    server
        .get("/api/auth/user")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = as_user("alice");
    let response = server.get("/api/auth/user").add_header(name, value).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["id"], "alice");

    server.get("/api/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_login_is_handled_upstream() {
    let server = create_test_server();
    server
        .get("/api/login")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
