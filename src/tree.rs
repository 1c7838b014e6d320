use std::collections::HashMap;

use crate::data_models::TreeNode;

/// Groups question suggestions into a renderable "People Also Ask" tree.
///
/// The branch key takes the first `min(key_word_cap, ceil(words/2))` words of
/// each question, so short questions don't end up in singleton branches and
/// long questions don't produce unwieldy keys. The caps keep the tree
/// renderable; all three are policy knobs rather than correctness
/// requirements.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder {
    pub max_branches: usize,
    pub max_children: usize,
    pub key_word_cap: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder {
            max_branches: 8,
            max_children: 8,
            key_word_cap: 4,
        }
    }
}

impl TreeBuilder {
    /// Word-prefix grouping key for a question.
    pub fn branch_key(&self, question: &str) -> String {
        let words: Vec<&str> = question.split_whitespace().collect();
        let take = self.key_word_cap.min(words.len().div_ceil(2)).max(1);
        words
            .into_iter()
            .take(take)
            .collect::<Vec<&str>>()
            .join(" ")
    }

    /// Builds the tree for `keyword` from the classified questions. Pure and
    /// deterministic: groups form in input order, and the branch and leaf
    /// caps keep the first entries seen.
    pub fn build(&self, keyword: &str, questions: &[String]) -> TreeNode {
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();

        for question in questions {
            if question.trim().is_empty() {
                continue;
            }
            let key = self.branch_key(question);
            match group_index.get(&key) {
                Some(&idx) => groups[idx].1.push(question.clone()),
                None => {
                    group_index.insert(key.clone(), groups.len());
                    groups.push((key, vec![question.clone()]));
                }
            }
        }

        let children = groups
            .into_iter()
            .take(self.max_branches)
            .map(|(key, members)| {
                let leaves = members
                    .into_iter()
                    .take(self.max_children)
                    .map(TreeNode::leaf)
                    .collect();
                TreeNode::branch(key, leaves)
            })
            .collect();

        TreeNode::branch(keyword, children)
    }
}
