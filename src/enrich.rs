use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_models::{
    AiPrompt, Classification, EnrichmentPayload, Intent, Level, OrganicSearch, Sentiment,
    SocialKeyword, SocialMedia, Summary,
};
use crate::tree::TreeBuilder;

/// How many classified keywords are handed to an enrichment strategy or the
/// synthesizer; bounds the request size.
const ORGANIC_SAMPLE: usize = 30;
const QUESTION_SAMPLE: usize = 15;
const SOCIAL_SAMPLE: usize = 24;

/// Everything that can go wrong on the AI path. None of these ever reach the
/// caller; the orchestrator recovers each of them with the synthesizer.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("enrichment request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("enrichment endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("model reply carried no text")]
    EmptyReply,
    #[error("no JSON object found in model reply")]
    NoJson,
    #[error("malformed enrichment JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("enrichment payload missing `{0}`")]
    MissingField(&'static str),
}

/// Strategy seam for the AI-assisted path. The inputs arrive pre-truncated.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        keyword: &str,
        organic: &[String],
        questions: &[String],
    ) -> Result<EnrichmentPayload, EnrichError>;
}

// Gemini generateContent envelope.

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Enricher backed by the Gemini text-completion endpoint.
pub struct GeminiEnricher {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiEnricher {
    pub fn new(base_url: String, model: String, api_key: String) -> GeminiEnricher {
        GeminiEnricher {
            client: reqwest::Client::new(),
            base_url,
            model,
            api_key,
        }
    }

    fn build_prompt(keyword: &str, organic: &[String], questions: &[String]) -> String {
        format!(
            r#"You are a Singapore HDB/BTO housing SEO expert. I researched the keyword "{keyword}".
Question-style suggestions: {questions}.
Other organic suggestions: {organic}.

Build a keyword research report as a single JSON object with exactly these top-level fields:
1. "summary": {{"searchVolume": number, "cpc": number, "volumeLevel": "Low"|"Medium"|"High", "cpcLevel": "Low"|"Medium"|"High"}}
2. "aiPrompts": array of {{"prompt": string, "intent": "informational"|"navigational"|"transactional"|"commercial", "sentiment": "positive"|"neutral"|"negative", "brands": string[]}}, one per question suggestion
3. "organicSearches": array of {{"keyword": string, "volume": number, "cpc": number, "modifier": string}}, one per organic suggestion
4. "socialMedia": {{"youtube": [...], "tiktok": [...], "instagram": [...]}} where each entry is {{"keyword": string, "volume": number, "cpc": number}}
5. "peopleAlsoAsk": a tree {{"name": string, "children": [...]}} grouping the questions, at most 8 branches with at most 8 leaves each

Estimate volume and cpc from your knowledge of the Singapore housing market.
Return ONLY the JSON, no markdown, no explanation."#,
            questions = questions.join(", "),
            organic = organic.join(", "),
        )
    }

    async fn generate(&self, prompt: &str) -> Result<String, EnrichError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let res = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(EnrichError::Status(res.status()));
        }

        let envelope: GenerateResponse = res.json().await?;
        envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(EnrichError::EmptyReply)
    }
}

#[async_trait]
impl Enricher for GeminiEnricher {
    async fn enrich(
        &self,
        keyword: &str,
        organic: &[String],
        questions: &[String],
    ) -> Result<EnrichmentPayload, EnrichError> {
        let prompt = Self::build_prompt(keyword, organic, questions);
        let reply = self.generate(&prompt).await?;
        parse_payload(&reply)
    }
}

/// Best-effort recovery of a JSON object from free-form model output: drop
/// markdown fences, take the span from the first `{` to its matching `}`
/// (string-literal aware), then parse.
pub fn extract_json(text: &str) -> Result<serde_json::Value, EnrichError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let start = cleaned.find('{').ok_or(EnrichError::NoJson)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in cleaned[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let span = &cleaned[start..start + idx + ch.len_utf8()];
                    return Ok(serde_json::from_str(span)?);
                }
            }
            _ => {}
        }
    }
    Err(EnrichError::NoJson)
}

/// Recovers and validates a model reply. Missing top-level fields fail here
/// so the orchestrator can fall back instead of shipping a partial payload.
pub fn parse_payload(reply: &str) -> Result<EnrichmentPayload, EnrichError> {
    let value = extract_json(reply)?;
    for field in ["summary", "aiPrompts", "organicSearches", "socialMedia"] {
        if value.get(field).is_none() {
            return Err(EnrichError::MissingField(field));
        }
    }
    Ok(serde_json::from_value(value)?)
}

fn volume_level(volume: u32) -> Level {
    if volume < 4_000 {
        Level::Low
    } else if volume < 10_000 {
        Level::Medium
    } else {
        Level::High
    }
}

fn cpc_level(cpc: f64) -> Level {
    if cpc < 0.70 {
        Level::Low
    } else if cpc < 1.40 {
        Level::Medium
    } else {
        Level::High
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The trailing word of a suggestion that isn't the seed keyword, shown as
/// the "modifier" column in the organic table.
fn modifier_for(keyword: &str, suggestion: &str) -> Option<String> {
    let keyword = keyword.to_lowercase();
    suggestion
        .split_whitespace()
        .filter(|word| word.to_lowercase() != keyword)
        .next_back()
        .map(|word| word.to_string())
}

/// Deterministic-shape payload generator: array lengths and field presence
/// depend only on the inputs, numeric values are sampled within the
/// configured bounds.
#[derive(Debug, Clone, Copy)]
pub struct FallbackSynthesizer {
    pub volume_min: u32,
    pub volume_max: u32,
    pub cpc_min: f64,
    pub cpc_max: f64,
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        FallbackSynthesizer {
            volume_min: 1_000,
            volume_max: 16_000,
            cpc_min: 0.10,
            cpc_max: 2.10,
        }
    }
}

impl FallbackSynthesizer {
    fn sample_volume(&self, rng: &mut impl Rng) -> u32 {
        rng.gen_range(self.volume_min..=self.volume_max)
    }

    fn sample_cpc(&self, rng: &mut impl Rng) -> f64 {
        round2(rng.gen_range(self.cpc_min..=self.cpc_max))
    }

    pub fn synthesize(
        &self,
        keyword: &str,
        organic: &[String],
        questions: &[String],
    ) -> EnrichmentPayload {
        let mut rng = rand::thread_rng();

        let search_volume = self.sample_volume(&mut rng);
        let cpc = self.sample_cpc(&mut rng);
        let summary = Summary {
            search_volume,
            cpc,
            volume_level: volume_level(search_volume),
            cpc_level: cpc_level(cpc),
        };

        let ai_prompts = questions
            .iter()
            .map(|question| AiPrompt {
                prompt: question.clone(),
                intent: Intent::Informational,
                sentiment: Sentiment::Neutral,
                brands: Vec::new(),
            })
            .collect();

        let organic_searches = organic
            .iter()
            .map(|term| OrganicSearch {
                keyword: term.clone(),
                volume: self.sample_volume(&mut rng),
                cpc: self.sample_cpc(&mut rng),
                modifier: modifier_for(keyword, term),
            })
            .collect();

        // Deal the organic sample round-robin across the three platforms so
        // each tab has something to show without repeating the others.
        let mut social_media = SocialMedia::default();
        for (idx, term) in organic.iter().take(SOCIAL_SAMPLE).enumerate() {
            let entry = SocialKeyword {
                keyword: term.clone(),
                volume: self.sample_volume(&mut rng),
                cpc: self.sample_cpc(&mut rng),
            };
            match idx % 3 {
                0 => social_media.youtube.push(entry),
                1 => social_media.tiktok.push(entry),
                _ => social_media.instagram.push(entry),
            }
        }

        EnrichmentPayload {
            summary,
            ai_prompts,
            organic_searches,
            social_media,
            people_also_ask: None,
        }
    }
}

/// Runs the AI strategy when one is configured and guarantees a
/// schema-complete payload either way. This is the only place that decides
/// between the two paths; callers never see the difference.
pub struct EnrichmentOrchestrator {
    strategy: Option<Arc<dyn Enricher>>,
    fallback: FallbackSynthesizer,
    tree_builder: TreeBuilder,
}

impl EnrichmentOrchestrator {
    pub fn new(strategy: Option<Arc<dyn Enricher>>) -> EnrichmentOrchestrator {
        Self::with_parts(strategy, FallbackSynthesizer::default(), TreeBuilder::default())
    }

    pub fn with_parts(
        strategy: Option<Arc<dyn Enricher>>,
        fallback: FallbackSynthesizer,
        tree_builder: TreeBuilder,
    ) -> EnrichmentOrchestrator {
        EnrichmentOrchestrator {
            strategy,
            fallback,
            tree_builder,
        }
    }

    pub async fn enrich(&self, keyword: &str, classification: &Classification) -> EnrichmentPayload {
        let organic = sample(&classification.organic, ORGANIC_SAMPLE);
        let questions = sample(&classification.questions, QUESTION_SAMPLE);

        let mut payload = match &self.strategy {
            Some(strategy) => match strategy.enrich(keyword, organic, questions).await {
                Ok(payload) => payload,
                Err(e) => {
                    log::warn!("enrichment unavailable for {keyword:?}, using fallback: {e}");
                    self.fallback.synthesize(keyword, organic, questions)
                }
            },
            None => self.fallback.synthesize(keyword, organic, questions),
        };

        // Whatever path ran, the question tree must be present. The full
        // question set feeds the deterministic builder, not the sample.
        if payload.people_also_ask.is_none() {
            payload.people_also_ask =
                Some(self.tree_builder.build(keyword, &classification.questions));
        }
        payload
    }
}

fn sample(items: &[String], cap: usize) -> &[String] {
    &items[..items.len().min(cap)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_json_plain_object() {
        let value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_strips_code_fences() {
        let reply = "```json\n{\"summary\": {\"searchVolume\": 5}}\n```";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["summary"]["searchVolume"], 5);
    }

    #[test]
    fn test_extract_json_ignores_surrounding_prose() {
        let reply = "Sure! Here is the report you asked for:\n{\"a\": {\"b\": 2}}\nHope it helps.";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["a"]["b"], 2);
    }

    #[test]
    fn test_extract_json_handles_braces_inside_strings() {
        let reply = r#"{"prompt": "what is {this}?", "n": 1}"#;
        let value = extract_json(reply).unwrap();
        assert_eq!(value["prompt"], "what is {this}?");
    }

    #[test]
    fn test_extract_json_no_object_is_an_error() {
        assert!(matches!(
            extract_json("no json here"),
            Err(EnrichError::NoJson)
        ));
        assert!(matches!(
            extract_json("{\"unterminated\": 1"),
            Err(EnrichError::NoJson)
        ));
    }

    #[test]
    fn test_parse_payload_requires_top_level_fields() {
        let reply = r#"{"summary": {"searchVolume": 1, "cpc": 0.5, "volumeLevel": "Low", "cpcLevel": "Low"}, "aiPrompts": []}"#;
        match parse_payload(reply) {
            Err(EnrichError::MissingField(field)) => assert_eq!(field, "organicSearches"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_payload_accepts_complete_reply() {
        let reply = r#"Here you go:
```json
{
  "summary": {"searchVolume": 8800, "cpc": 1.2, "volumeLevel": "Medium", "cpcLevel": "Medium"},
  "aiPrompts": [{"prompt": "what is tengah bto", "intent": "informational", "sentiment": "neutral", "brands": ["HDB"]}],
  "organicSearches": [{"keyword": "tengah bto price", "volume": 4400, "cpc": 0.8, "modifier": "price"}],
  "socialMedia": {"youtube": [], "tiktok": [], "instagram": []},
  "peopleAlsoAsk": {"name": "tengah", "children": [{"name": "what is tengah bto"}]}
}
```"#;
        let payload = parse_payload(reply).unwrap();
        assert_eq!(payload.summary.search_volume, 8800);
        assert_eq!(payload.ai_prompts.len(), 1);
        assert_eq!(payload.people_also_ask.unwrap().name, "tengah");
    }

    #[test]
    fn test_fallback_values_stay_in_bounds() {
        let synthesizer = FallbackSynthesizer::default();
        let organic = strings(&["tengah bto price", "tengah", "tengah gp"]);
        let questions = strings(&["what is tengah bto"]);
        for _ in 0..50 {
            let payload = synthesizer.synthesize("tengah", &organic, &questions);
            assert!((1_000..=16_000).contains(&payload.summary.search_volume));
            assert!((0.10..=2.10).contains(&payload.summary.cpc));
            for entry in &payload.organic_searches {
                assert!((1_000..=16_000).contains(&entry.volume));
                assert!((0.10..=2.10).contains(&entry.cpc));
            }
        }
    }

    #[test]
    fn test_fallback_shape_is_deterministic() {
        let synthesizer = FallbackSynthesizer::default();
        let organic = strings(&["a b", "c d", "e f", "g h"]);
        let questions = strings(&["what is a", "why b"]);
        let first = synthesizer.synthesize("kw", &organic, &questions);
        let second = synthesizer.synthesize("kw", &organic, &questions);
        assert_eq!(first.ai_prompts.len(), second.ai_prompts.len());
        assert_eq!(first.organic_searches.len(), second.organic_searches.len());
        assert_eq!(
            first.social_media.youtube.len(),
            second.social_media.youtube.len()
        );
        assert_eq!(
            first.social_media.tiktok.len(),
            second.social_media.tiktok.len()
        );
        assert_eq!(
            first.social_media.instagram.len(),
            second.social_media.instagram.len()
        );
        assert!(first.people_also_ask.is_none());
    }

    #[test]
    fn test_fallback_prompts_mirror_questions() {
        let synthesizer = FallbackSynthesizer::default();
        let questions = strings(&["what is tengah bto"]);
        let payload = synthesizer.synthesize("tengah", &[], &questions);
        assert_eq!(payload.ai_prompts.len(), 1);
        assert_eq!(payload.ai_prompts[0].prompt, "what is tengah bto");
        assert_eq!(payload.ai_prompts[0].intent, Intent::Informational);
        assert_eq!(payload.ai_prompts[0].sentiment, Sentiment::Neutral);
        assert!(payload.ai_prompts[0].brands.is_empty());
    }

    #[test]
    fn test_fallback_social_round_robin() {
        let synthesizer = FallbackSynthesizer::default();
        let organic = strings(&["one", "two", "three", "four", "five"]);
        let payload = synthesizer.synthesize("kw", &organic, &[]);
        assert_eq!(payload.social_media.youtube.len(), 2);
        assert_eq!(payload.social_media.tiktok.len(), 2);
        assert_eq!(payload.social_media.instagram.len(), 1);
        assert_eq!(payload.social_media.youtube[0].keyword, "one");
        assert_eq!(payload.social_media.tiktok[0].keyword, "two");
        assert_eq!(payload.social_media.instagram[0].keyword, "three");
    }

    #[test]
    fn test_modifier_is_trailing_non_keyword_word() {
        assert_eq!(
            modifier_for("tengah", "tengah bto price"),
            Some("price".to_string())
        );
        assert_eq!(modifier_for("tengah", "tengah"), None);
        assert_eq!(
            modifier_for("tengah", "why tengah"),
            Some("why".to_string())
        );
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(volume_level(1_000), Level::Low);
        assert_eq!(volume_level(4_000), Level::Medium);
        assert_eq!(volume_level(12_000), Level::High);
        assert_eq!(cpc_level(0.10), Level::Low);
        assert_eq!(cpc_level(0.70), Level::Medium);
        assert_eq!(cpc_level(2.00), Level::High);
    }

    struct FailingEnricher;

    #[async_trait]
    impl Enricher for FailingEnricher {
        async fn enrich(
            &self,
            _keyword: &str,
            _organic: &[String],
            _questions: &[String],
        ) -> Result<EnrichmentPayload, EnrichError> {
            Err(EnrichError::EmptyReply)
        }
    }

    struct TreelessEnricher;

    #[async_trait]
    impl Enricher for TreelessEnricher {
        async fn enrich(
            &self,
            _keyword: &str,
            _organic: &[String],
            questions: &[String],
        ) -> Result<EnrichmentPayload, EnrichError> {
            let synthesizer = FallbackSynthesizer::default();
            Ok(synthesizer.synthesize("kw", &[], questions))
        }
    }

    fn classification() -> Classification {
        Classification {
            questions: strings(&["what is tengah bto", "when can tengah launch"]),
            organic: strings(&["tengah bto price", "tengah"]),
        }
    }

    #[tokio::test]
    async fn test_orchestrator_falls_back_when_strategy_errors() {
        let orchestrator = EnrichmentOrchestrator::new(Some(Arc::new(FailingEnricher)));
        let payload = orchestrator.enrich("tengah", &classification()).await;
        assert_eq!(payload.ai_prompts.len(), 2);
        assert_eq!(payload.organic_searches.len(), 2);
        let tree = payload.people_also_ask.expect("tree must be filled in");
        assert_eq!(tree.name, "tengah");
    }

    #[tokio::test]
    async fn test_orchestrator_without_strategy_uses_fallback() {
        let orchestrator = EnrichmentOrchestrator::new(None);
        let payload = orchestrator.enrich("tengah", &classification()).await;
        assert!(payload.people_also_ask.is_some());
        assert_eq!(payload.ai_prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_orchestrator_closes_missing_tree_gap() {
        let orchestrator = EnrichmentOrchestrator::new(Some(Arc::new(TreelessEnricher)));
        let payload = orchestrator.enrich("tengah", &classification()).await;
        let tree = payload.people_also_ask.expect("tree must be filled in");
        assert_eq!(tree.name, "tengah");
        assert_eq!(tree.children.unwrap().len(), 2);
    }
}
