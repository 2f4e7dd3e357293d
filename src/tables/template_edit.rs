use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{check_name, Layout, Table, TEMPLATE_ID_COLUMN, TEMPLATE_LABEL_COLUMN};
use crate::db::{FileKind, UserId};
use crate::{AppError, AppResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditMode {
    /// Add a new row; the identifier must not exist yet.
    Insert,
    /// Replace the row with the same identifier; it must already exist.
    Update,
}

/// A template edit that has been written to the user's working copy.
#[derive(Debug, Clone)]
pub struct TemplateEdit {
    pub template: String,
    pub file: String,
    pub term_id: String,
    pub label: String,
    pub mode: EditMode,
    /// Submitted field names that are not columns of the template.
    pub dropped: Vec<String>,
    pub working_copy: PathBuf,
}

impl TemplateEdit {
    pub fn message(&self) -> String {
        let verb = match self.mode {
            EditMode::Insert => "added",
            EditMode::Update => "updated",
        };
        format!(
            "Successfully {verb} '{}' ({}) in {} template!",
            self.label, self.term_id, self.template
        )
    }
}

/// Applies submitted field values to a template row and writes the sorted
/// result to the user's working copy. Form field names use `-` for spaces.
pub fn apply_template_edit(
    layout: &Layout,
    user: UserId,
    template: &str,
    values: &BTreeMap<String, String>,
    mode: EditMode,
) -> AppResult<TemplateEdit> {
    let template = check_name(template)?;
    let file = format!("{template}.tsv");
    if !layout.canonical(FileKind::Template, &file).exists() {
        return Err(AppError::UnknownTemplate(template.to_string()));
    }

    let source = layout.read_target(Some(user), FileKind::Template, &file);
    let mut table = Table::read(&source)?;
    let id_col = table.require_column(TEMPLATE_ID_COLUMN, &source)?;
    let label_col = table.column(TEMPLATE_LABEL_COLUMN);

    let mut fields = BTreeMap::new();
    let mut dropped = vec![];
    for (name, value) in values {
        let name = name.replace('-', " ");
        if name == "template" {
            continue;
        }
        if table.column(&name).is_some() {
            fields.insert(name, value.trim().to_string());
        } else {
            dropped.push(name);
        }
    }

    let term_id = fields
        .get(TEMPLATE_ID_COLUMN)
        .filter(|id| !id.is_empty())
        .cloned()
        .ok_or_else(|| AppError::MissingIdentifier {
            template: template.to_string(),
        })?;
    let label = fields
        .get(TEMPLATE_LABEL_COLUMN)
        .cloned()
        .unwrap_or_default();

    let existing = table.rows.iter().position(|row| row[id_col] == term_id);
    match (mode, existing) {
        (EditMode::Insert, Some(i)) => {
            return Err(AppError::DuplicateTerm {
                template: template.to_string(),
                term_id,
                label,
                existing_label: label_col
                    .map(|col| table.rows[i][col].clone())
                    .unwrap_or_default(),
            });
        }
        (EditMode::Update, None) => {
            return Err(AppError::MissingTerm {
                template: template.to_string(),
                term_id,
            });
        }
        (EditMode::Update, Some(i)) => {
            table.rows.remove(i);
        }
        (EditMode::Insert, None) => {}
    }

    let row = table
        .headers
        .iter()
        .map(|h| fields.get(h).cloned().unwrap_or_default())
        .collect();
    table.rows.push(row);

    // The first data row holds the ROBOT template strings and stays first.
    if table.rows.len() > 2 {
        table.rows[1..].sort_by(|a, b| a[id_col].cmp(&b[id_col]));
    }

    if !dropped.is_empty() {
        tracing::warn!(
            template,
            "Found {} incorrect headers: {}",
            dropped.len(),
            dropped.join(", ")
        );
    }

    let working_copy = layout.working_copy(user, &file);
    table.write(&working_copy)?;
    tracing::info!(%user, template, term_id = %term_id, ?mode, "staged template edit");

    Ok(TemplateEdit {
        template: template.to_string(),
        file,
        term_id,
        label,
        mode,
        dropped,
        working_copy,
    })
}
