use std::sync::Arc;

use thiserror::Error;

use crate::classify;
use crate::config::Config;
use crate::data_models::{SearchResult, TreeNode};
use crate::enrich::{Enricher, EnrichmentOrchestrator, GeminiEnricher};
use crate::suggest::{GoogleSuggest, SuggestionFetcher};

/// The one error a caller can see. Everything past input validation degrades
/// internally instead of failing the request.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    InvalidInput,
}

/// Owns the pipeline stages and exposes the single `search` entrypoint:
/// fetch -> dedupe -> classify -> enrich -> assemble.
pub struct SearchPipeline {
    fetcher: SuggestionFetcher,
    orchestrator: EnrichmentOrchestrator,
}

impl SearchPipeline {
    pub fn new(fetcher: SuggestionFetcher, orchestrator: EnrichmentOrchestrator) -> SearchPipeline {
        SearchPipeline {
            fetcher,
            orchestrator,
        }
    }

    /// Wires the real upstreams. The AI strategy is only installed when a
    /// key is configured; without one every request takes the fallback path.
    pub fn from_config(config: &Config) -> SearchPipeline {
        let source = Arc::new(GoogleSuggest::new(
            config.suggest_base_url.clone(),
            config.suggest_locale.clone(),
        ));
        let strategy: Option<Arc<dyn Enricher>> = config.gemini_api_key.as_ref().map(|key| {
            Arc::new(GeminiEnricher::new(
                config.gemini_base_url.clone(),
                config.gemini_model.clone(),
                key.clone(),
            )) as Arc<dyn Enricher>
        });
        SearchPipeline::new(
            SuggestionFetcher::new(source),
            EnrichmentOrchestrator::new(strategy),
        )
    }

    pub async fn search(&self, query: &str) -> Result<SearchResult, SearchError> {
        let keyword = query.trim();
        if keyword.is_empty() {
            return Err(SearchError::InvalidInput);
        }

        let raw = self.fetcher.fetch_all(keyword).await;
        let unique = classify::dedupe(raw);
        log::info!("collected {} unique suggestions for {keyword:?}", unique.len());

        let classification = classify::classify(unique);
        let payload = self.orchestrator.enrich(keyword, &classification).await;

        Ok(SearchResult {
            query: keyword.to_string(),
            summary: payload.summary,
            // The orchestrator always fills the tree; an empty root here is
            // the last-resort stand-in so the field can never be absent.
            people_also_ask: payload
                .people_also_ask
                .unwrap_or_else(|| TreeNode::branch(keyword, Vec::new())),
            ai_prompts: payload.ai_prompts,
            organic_searches: payload.organic_searches,
            social_media: payload.social_media,
        })
    }
}
