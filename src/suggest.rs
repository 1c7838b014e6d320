use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use futures::future::join_all;

use crate::classify;

/// Which autocomplete variant a lookup hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Web,
    Video,
}

impl Channel {
    fn client_id(self) -> &'static str {
        match self {
            Channel::Web => "firefox",
            Channel::Video => "youtube",
        }
    }
}

/// Seam over the external autocomplete endpoint so the pipeline can run
/// against canned suggestions in tests.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn complete(&self, query: &str, channel: Channel) -> Result<Vec<String>>;
}

pub struct GoogleSuggest {
    client: reqwest::Client,
    base_url: String,
    locale: String,
}

impl GoogleSuggest {
    pub fn new(base_url: String, locale: String) -> GoogleSuggest {
        GoogleSuggest {
            client: reqwest::Client::new(),
            base_url,
            locale,
        }
    }
}

#[async_trait]
impl SuggestionSource for GoogleSuggest {
    async fn complete(&self, query: &str, channel: Channel) -> Result<Vec<String>> {
        let mut request = self.client.get(&self.base_url).query(&[
            ("client", channel.client_id()),
            ("gl", self.locale.as_str()),
            ("q", query),
        ]);
        if channel == Channel::Video {
            request = request.query(&[("ds", "yt")]);
        }

        let res = request.send().await?;
        if !res.status().is_success() {
            bail!("suggestion endpoint returned {}", res.status());
        }
        let body: serde_json::Value = res.json().await?;
        parse_suggestions(&body)
    }
}

/// The endpoint replies with a two-element array: the echoed query followed
/// by the suggestion list.
fn parse_suggestions(body: &serde_json::Value) -> Result<Vec<String>> {
    let list = body
        .get(1)
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("response is not a [query, suggestions] pair"))?;
    Ok(list
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect())
}

/// Modifier words combined with the seed keyword to widen the suggestion
/// pool: question starters, housing topic words, and the alphabet.
pub fn default_modifiers() -> Vec<String> {
    let mut modifiers: Vec<String> = ["why", "how", "when", "can", "what", "is", "should"]
        .iter()
        .map(|m| m.to_string())
        .collect();
    modifiers.extend(
        ["price", "eligibility", "grant", "resale", "renovation", "singles"]
            .iter()
            .map(|m| m.to_string()),
    );
    modifiers.extend(('a'..='z').map(|c| c.to_string()));
    modifiers
}

/// Fans one lookup per (modifier, channel) pair out over the suggestion
/// source and concatenates whatever comes back. A failed lookup contributes
/// nothing; it never fails the fetch as a whole.
pub struct SuggestionFetcher {
    source: Arc<dyn SuggestionSource>,
    modifiers: Vec<String>,
    channels: Vec<Channel>,
}

impl SuggestionFetcher {
    pub fn new(source: Arc<dyn SuggestionSource>) -> SuggestionFetcher {
        Self::with_plan(
            source,
            default_modifiers(),
            vec![Channel::Web, Channel::Video],
        )
    }

    pub fn with_plan(
        source: Arc<dyn SuggestionSource>,
        modifiers: Vec<String>,
        channels: Vec<Channel>,
    ) -> SuggestionFetcher {
        SuggestionFetcher {
            source,
            modifiers,
            channels,
        }
    }

    /// Question starters go in front of the keyword, everything else after.
    pub fn build_query(keyword: &str, modifier: &str) -> String {
        if classify::is_question_starter(modifier) {
            format!("{modifier} {keyword}")
        } else {
            format!("{keyword} {modifier}")
        }
    }

    pub async fn fetch_all(&self, keyword: &str) -> Vec<String> {
        let mut handles = Vec::new();
        for channel in &self.channels {
            for modifier in &self.modifiers {
                let query = Self::build_query(keyword, modifier);
                let source = self.source.clone();
                let channel = *channel;
                handles.push(tokio::spawn(async move {
                    match source.complete(&query, channel).await {
                        Ok(suggestions) => suggestions,
                        Err(e) => {
                            log::warn!("error fetching suggestions for {query:?}, error: {e:#}");
                            Vec::new()
                        }
                    }
                }));
            }
        }

        let mut raw = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(suggestions) => raw.extend(suggestions),
                Err(e) => log::warn!("suggestion lookup task failed, error: {e:#}"),
            }
        }
        raw
    }
}
