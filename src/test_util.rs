//! Fixtures shared by the unit tests.

use std::path::Path;
use std::sync::Arc;

use axum_extra::extract::cookie::Key;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, SqlitePool};

use crate::env::{Config, GitHubConfig};
use crate::tables::Layout;
use crate::AppState;

pub type Statement = (&'static str, &'static str, Option<&'static str>, Option<&'static str>);

pub fn test_layout(dir: &Path) -> Layout {
    Layout {
        ontology_root: dir.join("ontology"),
        build_dir: dir.join("build"),
    }
}

pub fn write_file(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Creates a term database holding `(stanza, predicate, object, value)`
/// statements about the stanza itself.
pub async fn create_statements_db(path: &Path, statements: &[Statement]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE statements (
            stanza TEXT, subject TEXT, predicate TEXT, object TEXT,
            value TEXT, datatype TEXT, language TEXT
        )",
    )
    .execute(&mut conn)
    .await
    .unwrap();
    for (stanza, predicate, object, value) in statements {
        sqlx::query(
            "INSERT INTO statements (stanza, subject, predicate, object, value)
                VALUES ($1, $1, $2, $3, $4)",
        )
        .bind(*stanza)
        .bind(*predicate)
        .bind(*object)
        .bind(*value)
        .execute(&mut conn)
        .await
        .unwrap();
    }
    conn.close().await.unwrap();
}

/// A small class hierarchy: process > planned process > {assay, specimen
/// collection}, with one definition.
pub fn sample_ontology() -> Vec<Statement> {
    vec![
        ("IAO:0000115", "rdf:type", Some("owl:AnnotationProperty"), None),
        ("IAO:0000115", "rdfs:label", None, Some("definition")),
        ("BFO:0000015", "rdf:type", Some("owl:Class"), None),
        ("BFO:0000015", "rdfs:label", None, Some("process")),
        ("OBI:0000011", "rdf:type", Some("owl:Class"), None),
        ("OBI:0000011", "rdfs:label", None, Some("planned process")),
        ("OBI:0000011", "rdfs:subClassOf", Some("BFO:0000015"), None),
        ("OBI:0000070", "rdf:type", Some("owl:Class"), None),
        ("OBI:0000070", "rdfs:label", None, Some("assay")),
        ("OBI:0000070", "rdfs:subClassOf", Some("OBI:0000011"), None),
        ("OBI:0000070", "rdfs:subClassOf", Some("_:b0"), None),
        (
            "OBI:0000070",
            "IAO:0000115",
            None,
            Some("A planned process with the objective to produce information"),
        ),
        ("OBI:0000100", "rdf:type", Some("owl:Class"), None),
        ("OBI:0000100", "rdfs:label", None, Some("specimen collection")),
        ("OBI:0000100", "rdfs:subClassOf", Some("OBI:0000011"), None),
    ]
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        domain_name: "http://localhost:5000".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        rust_log: "info".to_string(),
        secret_key: "x".repeat(64),
        field_table: dir.join("field.tsv"),
        layout: test_layout(dir),
        github: GitHubConfig {
            app_id: "1".to_string(),
            app_state: "state".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            private_key: dir.join("key.pem"),
            repo: "example/obi".to_string(),
            base_branch: "master".to_string(),
        },
    }
}

/// App state around a test pool, with files under `dir`.
pub fn test_state(pool: SqlitePool, dir: &Path) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config(dir)),
        cookie_key: Key::generate(),
        http: reqwest::Client::new(),
    }
}
