use serde::{Deserialize, Serialize};

/// A node in the "People Also Ask" hierarchy. Leaves carry no children field
/// so the serialized form matches what the tree renderer expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>) -> TreeNode {
        TreeNode {
            name: name.into(),
            children: None,
        }
    }

    pub fn branch(name: impl Into<String>, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            name: name.into(),
            children: Some(children),
        }
    }

    /// Depth of the tree rooted at this node (a leaf is depth 1).
    pub fn depth(&self) -> usize {
        match &self.children {
            Some(children) => {
                1 + children
                    .iter()
                    .map(TreeNode::depth)
                    .max()
                    .unwrap_or_default()
            }
            None => 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub search_volume: u32,
    pub cpc: f64,
    pub volume_level: Level,
    pub cpc_level: Level,
}

impl Summary {
    /// Zero-valued summary used when there is nothing to report.
    pub fn empty() -> Summary {
        Summary {
            search_volume: 0,
            cpc: 0.0,
            volume_level: Level::Low,
            cpc_level: Level::Low,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Informational,
    Navigational,
    Transactional,
    Commercial,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AiPrompt {
    pub prompt: String,
    pub intent: Intent,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub brands: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrganicSearch {
    pub keyword: String,
    pub volume: u32,
    pub cpc: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SocialKeyword {
    pub keyword: String,
    pub volume: u32,
    pub cpc: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SocialMedia {
    #[serde(default)]
    pub youtube: Vec<SocialKeyword>,
    #[serde(default)]
    pub tiktok: Vec<SocialKeyword>,
    #[serde(default)]
    pub instagram: Vec<SocialKeyword>,
}

/// Everything the enrichment step contributes, whether it came from the AI
/// strategy or from the deterministic synthesizer. `people_also_ask` is the
/// only field the orchestrator may still have to fill in afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentPayload {
    pub summary: Summary,
    pub ai_prompts: Vec<AiPrompt>,
    pub organic_searches: Vec<OrganicSearch>,
    pub social_media: SocialMedia,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people_also_ask: Option<TreeNode>,
}

/// The fixed-shape aggregate returned to the caller. Every field is always
/// populated; empty inputs produce empty sequences, never missing keys.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub query: String,
    pub summary: Summary,
    pub people_also_ask: TreeNode,
    pub ai_prompts: Vec<AiPrompt>,
    pub organic_searches: Vec<OrganicSearch>,
    pub social_media: SocialMedia,
}

/// Partition of a deduplicated suggestion list into question-like and
/// organic terms. Together the two sides hold every input string exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub questions: Vec<String>,
    pub organic: Vec<String>,
}
