use serde::{Deserialize, Serialize};

use crate::data_models::SearchResult;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(flatten)]
    pub result: SearchResult,
    pub processing_time_ms: u128,
}
