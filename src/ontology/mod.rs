//! Read-only access to the term databases built from the ontology.
//!
//! Each namespace has a SQLite database with a single `statements` table of
//! `(stanza, subject, predicate, object, value, datatype, language)` rows.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{query_scalar, ConnectOptions, SqliteConnection};

use crate::tables::Layout;
use crate::{AppError, AppResult};

mod export;
mod search;
mod tree;

pub use export::ExportFormat;
pub use search::SearchHit;

/// Namespace of the ontology being edited.
pub const BASE_NAMESPACE: &str = "obi";
pub const BASE_TITLE: &str = "Ontology for Biomedical Investigations";

/// Imported namespaces and their titles.
pub const IMPORTS: &[(&str, &str)] = &[
    ("chebi", "Chemical Entities of Biological Interest"),
    ("cl", "Cell Ontology"),
    ("clo", "Cell Line Ontology"),
    ("envo", "Environment Ontology"),
    ("go", "Gene Ontology"),
    ("hp", "Human Phenotype Ontology"),
    ("ido", "Infectious Disease Ontology"),
    ("ncbitaxon", "NCBI Organismal Classification"),
    ("ogms", "Ontology for General Medical Science"),
    ("omiabis", "Organized MIABIS"),
    ("omrse", "Ontology of Medically Related Social Entities"),
    ("pato", "Phenotype and Trait Ontology"),
    ("pr", "Protein Ontology"),
    ("so", "Sequence Ontology"),
    ("uberon", "Uberon Multi-Species Anatomy Ontology"),
    ("uo", "Units of Measurement Ontology"),
    ("vo", "Vaccine Ontology"),
];

pub fn is_import(ns: &str) -> bool {
    IMPORTS.iter().any(|(name, _)| *name == ns)
}

/// Returns the display title of a known namespace.
pub fn namespace_title(ns: &str) -> AppResult<&'static str> {
    if ns == BASE_NAMESPACE {
        return Ok(BASE_TITLE);
    }
    IMPORTS
        .iter()
        .find(|(name, _)| *name == ns)
        .map(|(_, title)| *title)
        .ok_or_else(|| AppError::UnknownOntology(ns.to_string()))
}

/// A term reference with its display label.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TermLink {
    pub id: String,
    pub label: String,
}

/// Open connection to one namespace's term database.
#[derive(Debug)]
pub struct OntologyStore {
    conn: SqliteConnection,
}

impl OntologyStore {
    /// Opens `<root>/build/<ns>.db`.
    pub async fn open(layout: &Layout, ns: &str) -> AppResult<Self> {
        namespace_title(ns)?;
        Self::open_path(&layout.database(ns)).await
    }

    pub async fn open_path(path: &Path) -> AppResult<Self> {
        if !path.is_file() {
            return Err(AppError::MissingDatabase(path.to_path_buf()));
        }
        let conn = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .connect()
            .await?;
        Ok(OntologyStore { conn })
    }

    pub async fn label(&mut self, term_id: &str) -> AppResult<Option<String>> {
        Ok(query_scalar(
            "SELECT value FROM statements
                WHERE stanza = $1 AND subject = $1
                AND predicate = 'rdfs:label' AND value IS NOT NULL
                ORDER BY value
                LIMIT 1",
        )
        .bind(term_id)
        .fetch_optional(&mut self.conn)
        .await?)
    }

    /// Returns the label of a term, or its id if it has none.
    pub async fn display_label(&mut self, term_id: &str) -> AppResult<String> {
        Ok(self
            .label(term_id)
            .await?
            .unwrap_or_else(|| term_id.to_string()))
    }

    pub async fn link(&mut self, term_id: &str) -> AppResult<TermLink> {
        Ok(TermLink {
            id: term_id.to_string(),
            label: self.display_label(term_id).await?,
        })
    }

    pub async fn term_exists(&mut self, term_id: &str) -> AppResult<bool> {
        let found: Option<i64> = query_scalar("SELECT 1 FROM statements WHERE stanza = $1 LIMIT 1")
            .bind(term_id)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(found.is_some())
    }

    pub async fn id_for_label(&mut self, label: &str) -> AppResult<Option<String>> {
        Ok(query_scalar(
            "SELECT stanza FROM statements
                WHERE predicate = 'rdfs:label' AND value = $1
                ORDER BY stanza
                LIMIT 1",
        )
        .bind(label)
        .fetch_optional(&mut self.conn)
        .await?)
    }

    /// Returns the term-level annotation properties used in this database,
    /// mapped to their labels. Ontology-level properties and `rdfs:label` are
    /// left out.
    pub async fn annotation_properties(&mut self) -> AppResult<BTreeMap<String, String>> {
        let ids: Vec<String> = query_scalar(
            "SELECT DISTINCT s2.stanza FROM statements s1
                JOIN statements s2 ON s1.predicate = s2.stanza
                WHERE s1.value IS NOT NULL",
        )
        .fetch_all(&mut self.conn)
        .await?;

        let mut properties = BTreeMap::new();
        for id in ids {
            let skip = ["dct:", "foaf:", "owl:", "<"]
                .iter()
                .any(|prefix| id.starts_with(prefix))
                || id == "rdfs:label";
            if skip {
                continue;
            }
            let label = self.display_label(&id).await?;
            properties.insert(id, label);
        }
        Ok(properties)
    }

    /// Returns the values of `predicate` on a term. Objects are rendered as
    /// labels; anonymous objects are skipped.
    pub async fn values(&mut self, term_id: &str, predicate: &str) -> AppResult<Vec<String>> {
        let rows: Vec<(Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT object, value FROM statements
                WHERE stanza = $1 AND subject = $1 AND predicate = $2
                ORDER BY object, value",
        )
        .bind(term_id)
        .bind(predicate)
        .fetch_all(&mut self.conn)
        .await?;

        let mut values = vec![];
        for (object, value) in rows {
            match (object, value) {
                (Some(object), _) if object.starts_with("_:") => {}
                (Some(object), _) => values.push(self.display_label(&object).await?),
                (None, Some(value)) => values.push(value),
                (None, None) => {}
            }
        }
        Ok(values)
    }

    /// Named superclasses of a term.
    pub async fn parents(&mut self, term_id: &str) -> AppResult<Vec<String>> {
        Ok(query_scalar(
            "SELECT object FROM statements
                WHERE stanza = $1 AND subject = $1 AND predicate = 'rdfs:subClassOf'
                AND object IS NOT NULL AND object NOT LIKE '\\_:%' ESCAPE '\\'
                ORDER BY object",
        )
        .bind(term_id)
        .fetch_all(&mut self.conn)
        .await?)
    }

    /// Named subclasses of a term, at most `limit` of them.
    pub async fn children(&mut self, term_id: &str, limit: i64) -> AppResult<Vec<String>> {
        Ok(query_scalar(
            "SELECT DISTINCT subject FROM statements
                WHERE predicate = 'rdfs:subClassOf' AND object = $1
                AND subject NOT LIKE '\\_:%' ESCAPE '\\'
                ORDER BY subject
                LIMIT $2",
        )
        .bind(term_id)
        .bind(limit)
        .fetch_all(&mut self.conn)
        .await?)
    }

    /// Classes with no named superclass other than `owl:Thing`.
    pub async fn top_level(&mut self) -> AppResult<Vec<String>> {
        Ok(query_scalar(
            "SELECT DISTINCT subject FROM statements
                WHERE predicate = 'rdf:type' AND object = 'owl:Class'
                AND subject NOT LIKE '\\_:%' ESCAPE '\\'
                AND subject NOT IN (
                    SELECT subject FROM statements
                    WHERE predicate = 'rdfs:subClassOf'
                    AND object IS NOT NULL
                    AND object != 'owl:Thing'
                    AND object NOT LIKE '\\_:%' ESCAPE '\\'
                )
                ORDER BY subject",
        )
        .fetch_all(&mut self.conn)
        .await?)
    }

    /// Returns `(id, label)` pairs whose id or label contains `text`.
    async fn label_matches(&mut self, text: &str) -> AppResult<Vec<(String, String)>> {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        Ok(sqlx::query_as(
            "SELECT DISTINCT stanza, value FROM statements
                WHERE predicate = 'rdfs:label' AND value IS NOT NULL
                AND stanza = subject
                AND (value LIKE $1 ESCAPE '\\' OR stanza LIKE $1 ESCAPE '\\')",
        )
        .bind(pattern)
        .fetch_all(&mut self.conn)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{create_statements_db, sample_ontology, test_layout};

    #[test]
    fn known_namespaces() {
        assert_eq!(namespace_title("obi").unwrap(), BASE_TITLE);
        assert_eq!(namespace_title("go").unwrap(), "Gene Ontology");
        assert!(is_import("ncbitaxon"));
        assert!(!is_import("obi"));
        assert!(matches!(namespace_title("xyz"), Err(AppError::UnknownOntology(_))));
    }

    #[tokio::test]
    async fn missing_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        let err = OntologyStore::open(&layout, "obi").await.unwrap_err();
        assert!(matches!(err, AppError::MissingDatabase(_)));
    }

    #[tokio::test]
    async fn queries() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        create_statements_db(&layout.database("obi"), &sample_ontology()).await;
        let mut store = OntologyStore::open(&layout, "obi").await.unwrap();

        assert_eq!(store.label("OBI:0000070").await.unwrap().as_deref(), Some("assay"));
        assert_eq!(store.label("OBI:9").await.unwrap(), None);
        assert!(store.term_exists("OBI:0000070").await.unwrap());
        assert_eq!(
            store.id_for_label("planned process").await.unwrap().as_deref(),
            Some("OBI:0000011")
        );

        let properties = store.annotation_properties().await.unwrap();
        assert_eq!(
            properties.into_iter().collect::<Vec<_>>(),
            [("IAO:0000115".to_string(), "definition".to_string())]
        );

        assert_eq!(store.parents("OBI:0000070").await.unwrap(), ["OBI:0000011"]);
        assert_eq!(
            store.values("OBI:0000070", "rdfs:subClassOf").await.unwrap(),
            ["planned process"]
        );
        assert_eq!(
            store.children("OBI:0000011", 100).await.unwrap(),
            ["OBI:0000070", "OBI:0000100"]
        );
        assert_eq!(store.children("OBI:0000011", 1).await.unwrap().len(), 1);
        assert_eq!(store.top_level().await.unwrap(), ["BFO:0000015"]);
    }
}
