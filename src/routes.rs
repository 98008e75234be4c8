use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::handlers;

/// Route table. Unknown paths, and known paths with another method, get 404.
pub fn file_routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(handlers::home).fallback(handlers::not_found))
        // Browsing and downloads
        .route("/browse", get(handlers::browse).fallback(handlers::not_found))
        .route("/browse/", get(handlers::browse).fallback(handlers::not_found))
        .route(
            "/browse/{*path}",
            get(handlers::browse).fallback(handlers::not_found),
        )
        // Root changes
        .route(
            "/change_dir",
            get(handlers::change_dir).fallback(handlers::not_found),
        )
        // Uploads are size-limited while streaming to disk
        .route(
            "/upload",
            post(handlers::upload)
                .fallback(handlers::not_found)
                .layer(DefaultBodyLimit::disable()),
        )
        .fallback(handlers::not_found)
}

/// Full application with middleware and state attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(file_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
