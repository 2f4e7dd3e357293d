//! Declarative form fields for templates, read from the field table.

use std::path::Path;

use serde::Serialize;

use super::Table;
use crate::AppResult;

/// One form field of a template.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Template column the field writes to.
    pub column: String,
    /// Raw input type, such as `text` or `select(a, b)`.
    pub input_type: String,
    pub help: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(column: &str, input_type: &str, required: bool) -> Self {
        FieldSpec {
            column: column.to_string(),
            input_type: input_type.to_string(),
            help: String::new(),
            required,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TemplateFields {
    pub metadata: Vec<FieldSpec>,
    pub logic: Vec<FieldSpec>,
}

#[derive(Debug, Clone)]
struct FieldRow {
    tables: Vec<String>,
    category: String,
    spec: FieldSpec,
}

/// Parsed field table.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    rows: Vec<FieldRow>,
}

fn parse_required(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1" | "x"
    )
}

impl FieldSchema {
    pub fn load(path: &Path) -> AppResult<Self> {
        Ok(Self::from_table(&Table::read(path)?))
    }

    pub fn from_table(table: &Table) -> Self {
        let get = |row: &[String], name: &str| -> String {
            table
                .column(name)
                .and_then(|i| row.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        let rows = table
            .rows
            .iter()
            .filter_map(|row| {
                let column = get(row, "column");
                if column.is_empty() {
                    return None;
                }
                Some(FieldRow {
                    tables: get(row, "table").split('|').map(str::to_string).collect(),
                    category: get(row, "category"),
                    spec: FieldSpec {
                        column,
                        input_type: get(row, "input type"),
                        help: get(row, "help"),
                        required: parse_required(&get(row, "required")),
                    },
                })
            })
            .collect();
        FieldSchema { rows }
    }

    /// Returns the metadata and logic fields of a template, in table order.
    pub fn template_fields(&self, template: &str) -> TemplateFields {
        let mut fields = TemplateFields::default();
        for row in &self.rows {
            let applies =
                row.tables.iter().any(|t| t == template) || row.tables.first().is_some_and(|t| t == "*");
            if !applies {
                continue;
            }
            if row.category == "metadata" {
                fields.metadata.push(row.spec.clone());
            } else {
                fields.logic.push(row.spec.clone());
            }
        }
        fields
    }
}
