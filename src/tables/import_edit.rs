use std::path::PathBuf;

use itertools::Itertools;

use super::{Layout, Table, IMPORT_ID_COLUMN};
use crate::db::{FileKind, UserId};
use crate::ontology::{self, OntologyStore};
use crate::{AppError, AppResult};

/// Parent placement for an imported term, resolved in the base ontology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParent {
    pub id: String,
    pub label: String,
}

/// A term to stage in an import file, with everything looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTerm {
    pub namespace: String,
    pub term_id: String,
    pub label: String,
    pub parent: Option<ResolvedParent>,
    /// Space-separated related-entity options, such as `ancestors`.
    pub related: String,
}

#[derive(Debug, Clone)]
pub struct ImportEdit {
    pub file: String,
    pub working_copy: PathBuf,
    pub message: String,
}

/// Flattens the related-entities option and makes sure a term without an
/// explicit parent brings its ancestors along.
pub fn normalize_related(related: &str, has_parent: bool) -> String {
    let mut entries: Vec<String> = related
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split([',', ' '])
        .map(|s| s.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !has_parent && !entries.iter().any(|e| e == "ancestors") {
        entries.push("ancestors".to_string());
    }
    entries.into_iter().unique().join(" ")
}

/// Checks that the term is in its namespace, looks up its label, and
/// validates the requested parent against the base ontology.
pub async fn resolve_import_term(
    layout: &Layout,
    namespace: &str,
    term_id: &str,
    parent: Option<&str>,
    related: &str,
) -> AppResult<ImportTerm> {
    if !ontology::is_import(namespace) {
        return Err(AppError::UnknownOntology(namespace.to_string()));
    }
    if term_id.is_empty() {
        return Err(AppError::MissingImportTerm {
            namespace: namespace.to_string(),
        });
    }
    let mut store = OntologyStore::open(layout, namespace).await?;
    if !store.term_exists(term_id).await? {
        return Err(AppError::UnknownImportTerm {
            term_id: term_id.to_string(),
            namespace: namespace.to_string(),
        });
    }
    let label = store.label(term_id).await?.unwrap_or_default();

    let parent = match parent.map(str::trim).filter(|p| !p.is_empty()) {
        None => None,
        Some(parent_label) => {
            let mut base = OntologyStore::open(layout, ontology::BASE_NAMESPACE).await?;
            match base.id_for_label(parent_label).await? {
                Some(id) => Some(ResolvedParent {
                    id,
                    label: parent_label.to_string(),
                }),
                None => {
                    return Err(AppError::ParentNotFound {
                        term_id: term_id.to_string(),
                        label,
                        parent: parent_label.to_string(),
                    })
                }
            }
        }
    };

    Ok(ImportTerm {
        namespace: namespace.to_string(),
        term_id: term_id.to_string(),
        label,
        related: normalize_related(related, parent.is_some()),
        parent,
    })
}

/// Appends a term to the user's working copy of `<ns>_terms.tsv`.
pub fn apply_import_edit(layout: &Layout, user: UserId, term: &ImportTerm) -> AppResult<ImportEdit> {
    let file = format!("{}_terms.tsv", term.namespace);
    if !layout.canonical(FileKind::Import, &file).exists() {
        return Err(AppError::UnknownImport(term.namespace.clone()));
    }

    let source = layout.read_target(Some(user), FileKind::Import, &file);
    let mut table = Table::read(&source)?;
    let id_col = table.require_column(IMPORT_ID_COLUMN, &source)?;
    if table.rows.iter().any(|row| row[id_col] == term.term_id) {
        return Err(AppError::AlreadyImported {
            term_id: term.term_id.clone(),
            label: term.label.clone(),
            namespace: term.namespace.clone(),
        });
    }

    let (parent_id, parent_label) = term
        .parent
        .as_ref()
        .map(|p| (p.id.as_str(), p.label.as_str()))
        .unwrap_or_default();
    let row = table
        .headers
        .iter()
        .map(|header| {
            match header.as_str() {
                "Source" => term.namespace.as_str(),
                "ID" => term.term_id.as_str(),
                "Label" => term.label.as_str(),
                "Parent ID" => parent_id,
                "Parent Label" => parent_label,
                "Related" => term.related.as_str(),
                _ => "",
            }
            .to_string()
        })
        .collect();
    table.rows.push(row);

    let working_copy = layout.working_copy(user, &file);
    table.write(&working_copy)?;
    tracing::info!(%user, %file, term_id = %term.term_id, "staged import");

    Ok(ImportEdit {
        message: format!(
            "'{}' ({}) added to {} import!",
            term.label, term.term_id, term.namespace
        ),
        file,
        working_copy,
    })
}
