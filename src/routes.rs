//! Router assembly: endpoint → handler wiring, auth middleware, and the
//! request-level layers (tracing, bounded request timeout).

use crate::handlers::{
    create_language, create_translation, delete_language, delete_translation,
    export_translations, get_language, get_translation, health, list_languages,
    list_translations, require_auth, update_language, update_translation, AppState,
};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/languages", get(list_languages).post(create_language))
        .route(
            "/languages/:id",
            get(get_language).put(update_language).delete(delete_language),
        )
        .route(
            "/translations",
            get(list_translations).post(create_translation),
        )
        .route(
            "/translations/:id",
            get(get_translation)
                .put(update_translation)
                .delete(delete_translation),
        )
        .route("/translations/export/:locale", get(export_translations))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(api)
        // Liveness probe stays reachable without a token
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .with_state(state)
}
