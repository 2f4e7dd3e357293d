use serde::Serialize;

use super::{OntologyStore, TermLink};
use crate::{AppError, AppResult};

/// Most children listed under a term.
pub const MAX_CHILDREN: i64 = 100;
const MAX_DEPTH: usize = 64;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub property: String,
    pub values: Vec<String>,
}

/// Hierarchy around one term, or the top level when no term is given.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TreeView {
    /// Named ancestors from the root down to the term's parent.
    pub ancestors: Vec<TermLink>,
    pub term: Option<TermLink>,
    pub annotations: Vec<Annotation>,
    /// Sorted by label.
    pub children: Vec<TermLink>,
}

impl OntologyStore {
    pub async fn tree(&mut self, term_id: Option<&str>) -> AppResult<TreeView> {
        let Some(term_id) = term_id else {
            let mut children = vec![];
            for id in self.top_level().await? {
                children.push(self.link(&id).await?);
            }
            sort_by_label(&mut children);
            return Ok(TreeView {
                ancestors: vec![],
                term: None,
                annotations: vec![],
                children,
            });
        };

        if !self.term_exists(term_id).await? {
            return Err(AppError::NotFound);
        }

        // Follow the first named parent up to the root.
        let mut ancestors = vec![];
        let mut current = term_id.to_string();
        while ancestors.len() < MAX_DEPTH {
            let Some(parent) = self.parents(&current).await?.into_iter().next() else {
                break;
            };
            if parent == term_id || ancestors.iter().any(|a: &TermLink| a.id == parent) {
                break;
            }
            ancestors.push(self.link(&parent).await?);
            current = parent;
        }
        ancestors.reverse();

        let mut annotations = vec![];
        let properties = self.annotation_properties().await?;
        for (predicate, property) in
            properties.iter().map(|(k, v)| (k.as_str(), v.as_str())).chain([
                ("rdfs:subClassOf", "parent class"),
                ("owl:equivalentClass", "equivalent class"),
            ])
        {
            let values = self.values(term_id, predicate).await?;
            if !values.is_empty() {
                annotations.push(Annotation {
                    property: property.to_string(),
                    values,
                });
            }
        }

        let mut children = vec![];
        for id in self.children(term_id, MAX_CHILDREN).await? {
            children.push(self.link(&id).await?);
        }
        sort_by_label(&mut children);

        Ok(TreeView {
            ancestors,
            term: Some(self.link(term_id).await?),
            annotations,
            children,
        })
    }
}

fn sort_by_label(links: &mut [TermLink]) {
    links.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}
