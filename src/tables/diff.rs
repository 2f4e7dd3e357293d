use std::path::Path;

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use crate::AppResult;

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiffMarker {
    #[serde(rename = "+")]
    Added,
    #[serde(rename = "-")]
    Removed,
}

impl DiffMarker {
    pub fn symbol(self) -> &'static str {
        match self {
            DiffMarker::Added => "+",
            DiffMarker::Removed => "-",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub marker: DiffMarker,
    /// Cells of the changed line, padded to the header width.
    pub cells: Vec<String>,
}

/// Changed lines of a working copy against its canonical file.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DiffTable {
    /// Canonical headers, preceded by an empty marker column.
    pub headers: Vec<String>,
    pub rows: Vec<DiffRow>,
}

impl DiffTable {
    /// Rows with the marker as the first cell, for display.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                std::iter::once(row.marker.symbol().to_string())
                    .chain(row.cells.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

fn with_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

pub fn diff_tables(source: &str, working: &str) -> DiffTable {
    let mut headers = vec![String::new()];
    if let Some(first) = source.lines().next() {
        headers.extend(first.split('\t').map(str::to_string));
    }
    let width = headers.len() - 1;

    let source = with_trailing_newline(source);
    let working = with_trailing_newline(working);
    let diff = TextDiff::from_lines(&source, &working);

    let rows = diff
        .iter_all_changes()
        .filter_map(|change| {
            let marker = match change.tag() {
                ChangeTag::Equal => return None,
                ChangeTag::Insert => DiffMarker::Added,
                ChangeTag::Delete => DiffMarker::Removed,
            };
            let line = change.value().trim_end_matches(['\r', '\n']);
            let mut cells: Vec<String> = line.split('\t').map(str::to_string).collect();
            if cells.len() < width {
                cells.resize(width, String::new());
            }
            Some(DiffRow { marker, cells })
        })
        .collect();

    DiffTable { headers, rows }
}

pub fn diff_files(source: &Path, working: &Path) -> AppResult<DiffTable> {
    let source = std::fs::read_to_string(source)?;
    let working = std::fs::read_to_string(working)?;
    Ok(diff_tables(&source, &working))
}
