use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::{SearchError, SearchPipeline};

use super::models::{SearchRequest, SearchResponse};

pub async fn search_handler(
    State(pipeline): State<Arc<SearchPipeline>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = Instant::now();

    let result = pipeline.search(&request.query).await.map_err(|e| match e {
        SearchError::InvalidInput => (StatusCode::BAD_REQUEST, e.to_string()),
    })?;

    let processing_time_ms = start.elapsed().as_millis();
    Ok(Json(SearchResponse {
        result,
        processing_time_ms,
    }))
}
