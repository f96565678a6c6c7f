use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::service::PUBLIC_PREFIX;

mod error;
mod state;

pub mod progress;
pub mod videos;

pub use error::*;
pub use state::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Routes of the service. Request bodies larger than `body_limit` bytes are rejected.
pub fn create_router(app: App, body_limit: usize) -> Router {
    let uploads = ServeDir::new(app.uploads.dir());

    Router::new()
        .route("/videos", get(videos::list))
        .route("/videos/upload", post(videos::upload))
        .route("/videos/youtube", post(videos::link))
        .route("/video/:id", get(videos::info))
        .route("/progress/update", post(progress::update))
        .route("/progress/:user_id/:video_id", get(progress::info))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app)
}
