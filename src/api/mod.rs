use axum::{Router, routing::post};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
};

use crate::pipeline::SearchPipeline;

pub mod handlers;
pub mod models;

pub fn create_router(pipeline: Arc<SearchPipeline>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/api/search", post(handlers::search_handler))
        .with_state(pipeline)
        // Static file serving for the UI
        .nest_service("/", ServeDir::new("static"))
        // The request timeout is the only bound on a search; the pipeline
        // itself never times out.
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(TimeoutLayer::new(Duration::from_secs(60))),
        )
}
