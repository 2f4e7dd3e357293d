use serde::Serialize;

use super::OntologyStore;
use crate::AppResult;

/// Typeahead suggestion.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub label: String,
    pub short_label: String,
    /// 1-based rank of the hit.
    pub order: usize,
}

const SHORT_LABEL_LEN: usize = 100;

fn short_label(label: &str) -> String {
    if label.chars().count() <= SHORT_LABEL_LEN {
        label.to_string()
    } else {
        let mut short: String = label.chars().take(SHORT_LABEL_LEN - 3).collect();
        short.push_str("...");
        short
    }
}

impl OntologyStore {
    /// Finds terms whose label or id contains `text`. Exact matches come
    /// first, then prefix matches, then shorter labels.
    pub async fn search(&mut self, text: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![]);
        }
        let needle = text.to_lowercase();
        let mut matches = self.label_matches(text).await?;
        matches.sort_by_cached_key(|(id, label)| {
            let lower = label.to_lowercase();
            let rank = if lower == needle || id.to_lowercase() == needle {
                0
            } else if lower.starts_with(&needle) {
                1
            } else {
                2
            };
            (rank, label.len(), lower, id.clone())
        });
        Ok(matches
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (id, label))| SearchHit {
                short_label: short_label(&label),
                id,
                label,
                order: i + 1,
            })
            .collect())
    }
}
