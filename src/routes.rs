// src/routes.rs

use axum::{
    Router, http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{achievement, auth, category, leaderboard, profile, quiz},
    state::AppState,
    utils::jwt::{auth_middleware, maybe_identity},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, tests, achievements, leaderboard, profile).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, notifier).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Starting, submitting and reading a test admit anonymous callers;
    // history is tied to an account.
    let test_routes = Router::new()
        .route("/start", post(quiz::start_test))
        .route("/{id}/submit", post(quiz::submit_test))
        .route("/{id}", get(quiz::get_result))
        .layer(middleware::from_fn_with_state(state.clone(), maybe_identity))
        .merge(
            Router::new()
                .route("/history", get(quiz::get_history))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let achievement_routes = Router::new()
        .route("/", get(achievement::list_achievements))
        .route("/evaluate", post(achievement::evaluate_achievements))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let leaderboard_routes = Router::new()
        .route("/", get(leaderboard::top_n))
        .merge(
            Router::new()
                .route("/rank", get(leaderboard::my_rank))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/tests", test_routes)
        .route("/api/categories", get(category::list_categories))
        .nest("/api/achievements", achievement_routes)
        .nest("/api/leaderboard", leaderboard_routes)
        .nest("/api/profile", profile_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
