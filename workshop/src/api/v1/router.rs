use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state, v1_auth_middleware);

    let sessions = Router::new()
        .route("/", post(handlers::sessions::create_session))
        .route("/{sessionId}", get(handlers::sessions::get_session))
        .route("/{sessionId}/photo", put(handlers::sessions::attach_photo))
        .route(
            "/{sessionId}/profile",
            put(handlers::sessions::submit_profile),
        )
        .route(
            "/{sessionId}/nice-points",
            put(handlers::sessions::set_nice_points),
        )
        .route(
            "/{sessionId}/pipeline",
            post(handlers::pipeline::run_pipeline),
        )
        .route("/{sessionId}/share", post(handlers::shares::create_share));

    // reads are public, adding to the catalog needs a key
    let gifts = get(handlers::gifts::list_gifts)
        .merge(post(handlers::gifts::create_gift).route_layer(auth.clone()));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router())
        .nest("/sessions", sessions)
        .route("/shared/{slug}", get(handlers::shares::get_shared))
        .route("/gifts", gifts);

    let protected_routes = Router::new()
        .route(
            "/admin/retention:run",
            post(handlers::admin::run_retention),
        )
        .route_layer(auth);

    Router::new().merge(public_routes).merge(protected_routes)
}
