use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};
use crate::routes::{
    ai, auth, catalog, feed, health, lists, posts, recommendations, reports, search, titles,
    users,
};

use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::api_health))
        .route("/api/login", get(health::login_hint))
        .route("/api/auth/user", get(auth::current_user))
        // Feed & posts
        .route("/api/feed", get(feed::get_feed))
        .route("/api/posts", post(posts::create_post))
        .route("/api/posts/:id", get(posts::get_post))
        .route(
            "/api/posts/:id/like",
            post(posts::like_post).delete(posts::unlike_post),
        )
        .route(
            "/api/posts/:id/save",
            post(posts::save_post).delete(posts::unsave_post),
        )
        .route(
            "/api/posts/:id/repost",
            post(posts::repost_post).delete(posts::unrepost_post),
        )
        .route(
            "/api/posts/:id/comments",
            get(posts::list_comments).post(posts::create_comment),
        )
        .route("/api/comments/:id", delete(posts::delete_comment))
        // Titles & search
        .route("/api/titles", post(titles::create_title))
        .route("/api/titles/trending", get(titles::trending))
        .route("/api/titles/:id", get(titles::get_title))
        .route("/api/titles/:id/posts", get(titles::title_posts))
        .route("/api/titles/:id/related", get(titles::related))
        .route("/api/search", get(search::search))
        .route("/api/catalog/popular", get(catalog::popular))
        .route("/api/catalog/top-rated", get(catalog::top_rated))
        .route("/api/catalog/:kind/:external_id", get(catalog::details))
        .route(
            "/api/catalog/:kind/:external_id/similar",
            get(catalog::similar),
        )
        // AI discovery
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/ai/search", post(ai::search))
        .route(
            "/api/recommendations",
            get(recommendations::list).post(recommendations::create),
        )
        .route(
            "/api/recommendations/:id/shown",
            post(recommendations::mark_shown),
        )
        // Lists
        .route("/api/lists", post(lists::create_list))
        .route(
            "/api/lists/:id",
            get(lists::get_list)
                .patch(lists::update_list)
                .delete(lists::delete_list),
        )
        .route(
            "/api/lists/:id/titles/:title_id",
            post(lists::add_list_title).delete(lists::remove_list_title),
        )
        .route(
            "/api/watchlist/:title_id",
            get(lists::watchlist_contains)
                .post(lists::add_to_watchlist)
                .delete(lists::remove_from_watchlist),
        )
        .route(
            "/api/favorites/:title_id",
            get(lists::favorites_contains)
                .post(lists::add_to_favorites)
                .delete(lists::remove_from_favorites),
        )
        // Users
        .route("/api/users/profile", get(users::own_profile))
        .route(
            "/api/users/profile/:username",
            get(users::profile_by_username),
        )
        .route("/api/users/suggested", get(users::suggested))
        .route("/api/users/:id/posts", get(users::user_posts))
        .route("/api/users/:id/follow-stats", get(users::follow_stats))
        .route(
            "/api/users/:id/follow",
            post(users::follow).delete(users::unfollow),
        )
        .route("/api/users/:id/watchlist", get(lists::user_watchlist))
        .route("/api/users/:id/favorites", get(lists::user_favorites))
        .route("/api/users/:id/lists", get(lists::user_lists))
        // Moderation
        .route("/api/reports", get(reports::list).post(reports::create))
        .route("/api/reports/:id", patch(reports::update))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
