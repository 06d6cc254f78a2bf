// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, community, feed, interaction, profile},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, optional_auth_middleware},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// Assembles the main application router.
///
/// * Public routes accept an optional bearer token (viewer-relative fields).
/// * Write routes and the Following feed require a token.
/// * Admin routes additionally require the account's admin flag.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let optional_auth = middleware::from_fn_with_state(state.clone(), optional_auth_middleware);

    let public_routes = Router::new()
        .route("/feed/for-you", get(feed::for_you))
        .route("/profiles/{username}", get(profile::get_profile))
        .route("/profiles/{username}/posts", get(feed::profile_posts))
        .layer(optional_auth);

    let member_routes = Router::new()
        .route("/feed/following", get(feed::following))
        .route("/accounts", post(auth::register))
        .route("/profile", put(profile::update_me))
        .route("/posts", post(community::create_post))
        .route("/posts/{id}", delete(community::delete_post))
        .route("/posts/{id}/like", post(interaction::toggle_like))
        .route(
            "/users/{id}/follow",
            post(interaction::follow_user).delete(interaction::unfollow_user),
        )
        .layer(require_auth.clone());

    let admin_routes = Router::new()
        .route("/insights", get(admin::get_insights))
        .route("/overview", get(admin::get_overview))
        // Auth first, then the admin flag check
        .layer(
            ServiceBuilder::new()
                .layer(require_auth)
                .layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        );

    Router::new()
        .nest(
            "/api",
            public_routes
                .merge(member_routes)
                .nest("/admin", admin_routes),
        )
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
