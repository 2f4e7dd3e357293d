use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::Serialize;

use super::OntologyStore;
use crate::{AppError, AppResult};

/// Pseudo-predicate for the term's own identifier.
const CURIE: &str = "CURIE";
const ID_HEADER: &str = "ontology ID";
const LABEL_HEADER: &str = "label";

/// Columns every export can have besides the annotation properties.
const FIXED_COLUMNS: &[(&str, &str)] = &[
    (CURIE, ID_HEADER),
    ("rdfs:label", LABEL_HEADER),
    ("rdfs:subClassOf", "parent class"),
    ("owl:equivalentClass", "equivalent class"),
    ("owl:disjointWith", "disjoint class"),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    Tsv,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "tsv" => Ok(ExportFormat::Tsv),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(AppError::InvalidExportFormat(s.to_string())),
        }
    }

    pub fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Tsv => b'\t',
            ExportFormat::Csv => b',',
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Tsv => "text/tab-separated-values",
            ExportFormat::Csv => "text/comma-separated-values",
        }
    }
}

/// Queued terms with one column per property that has a value.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    /// Property labels: `ontology ID`, `label`, then the rest sorted.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Builds the table from rows keyed by property label, keeping only
    /// columns that have a value in some row.
    pub fn from_labeled_rows(rows: &[BTreeMap<String, String>]) -> Self {
        let used: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(header, _)| header.as_str())
            .collect();
        let headers: Vec<String> = [ID_HEADER, LABEL_HEADER]
            .into_iter()
            .chain(
                used.iter()
                    .copied()
                    .filter(|h| *h != ID_HEADER && *h != LABEL_HEADER),
            )
            .map(str::to_string)
            .collect();
        let rows = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|h| row.get(h).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        ExportTable { headers, rows }
    }

    /// Serializes the table with a header line.
    pub fn to_delimited(&self, format: ExportFormat) -> AppResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(format.delimiter())
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Other(format!("could not write export: {e}")))?;
        String::from_utf8(bytes).map_err(|e| AppError::Other(e.to_string()))
    }
}

impl OntologyStore {
    /// Exports the given terms with their annotation properties and fixed
    /// logical columns. Multiple values are joined with `|`.
    pub async fn export_terms(&mut self, terms: &[String]) -> AppResult<ExportTable> {
        let mut columns: Vec<(String, String)> =
            self.annotation_properties().await?.into_iter().collect();
        columns.extend(
            FIXED_COLUMNS
                .iter()
                .map(|(p, l)| (p.to_string(), l.to_string())),
        );

        let mut rows = vec![];
        for term in terms {
            let mut row = BTreeMap::new();
            for (predicate, label) in &columns {
                let value = if predicate == CURIE {
                    term.clone()
                } else {
                    self.values(term, predicate).await?.into_iter().join("|")
                };
                row.insert(label.clone(), value);
            }
            rows.push(row);
        }
        Ok(ExportTable::from_labeled_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{create_statements_db, sample_ontology, test_layout};

    #[test]
    fn formats() {
        assert_eq!(ExportFormat::parse("csv").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("tsv").unwrap().mime_type(), "text/tab-separated-values");
        assert!(matches!(ExportFormat::parse("xlsx"), Err(AppError::InvalidExportFormat(_))));
    }

    #[test]
    fn empty_columns_are_dropped_and_id_label_lead() {
        let rows: Vec<BTreeMap<String, String>> = vec![
            [
                ("ontology ID", "OBI:1"),
                ("label", "one"),
                ("alternative term", ""),
                ("definition", "first"),
            ],
            [
                ("ontology ID", "OBI:2"),
                ("label", "two"),
                ("alternative term", ""),
                ("definition", ""),
            ],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
        .collect();

        let table = ExportTable::from_labeled_rows(&rows);
        assert_eq!(table.headers, ["ontology ID", "label", "definition"]);
        assert_eq!(table.rows[1], ["OBI:2", "two", ""]);
        assert_eq!(
            table.to_delimited(ExportFormat::Csv).unwrap(),
            "ontology ID,label,definition\nOBI:1,one,first\nOBI:2,two,\n"
        );
    }

    #[tokio::test]
    async fn export_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        create_statements_db(&layout.database("obi"), &sample_ontology()).await;
        let mut store = OntologyStore::open(&layout, "obi").await.unwrap();

        let table = store
            .export_terms(&["OBI:0000070".to_string(), "OBI:0000100".to_string()])
            .await
            .unwrap();
        assert_eq!(table.headers, ["ontology ID", "label", "definition", "parent class"]);
        assert_eq!(
            table.rows[0],
            [
                "OBI:0000070",
                "assay",
                "A planned process with the objective to produce information",
                "planned process"
            ]
        );
        assert_eq!(table.rows[1][1], "specimen collection");
        assert_eq!(table.rows[1][2], "");
    }
}
