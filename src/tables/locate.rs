use std::path::{Path, PathBuf};

use super::{tsv_reader, Layout, IMPORT_ID_COLUMN, TEMPLATE_ID_COLUMN};
use crate::db::{FileKind, UserId};
use crate::ontology::OntologyStore;
use crate::AppResult;

/// Where a term is defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Row of a template file. `line` is the 1-based line in `path`, counting
    /// the header as line 1.
    Template {
        name: String,
        path: PathBuf,
        line: u64,
    },
    /// Row of an import file.
    Import {
        name: String,
        path: PathBuf,
        line: u64,
    },
    /// Asserted directly in the base ontology's editable store.
    BaseStore,
}

/// Finds the file line holding `term_id` in the given identifier column.
pub fn find_row(path: &Path, column: &str, term_id: &str) -> AppResult<Option<u64>> {
    let mut reader = tsv_reader(path)?;
    let Some(index) = reader.headers()?.iter().position(|h| h == column) else {
        return Ok(None);
    };
    for record in reader.records() {
        let record = record?;
        if record.get(index) == Some(term_id) {
            return Ok(record.position().map(|p| p.line()));
        }
    }
    Ok(None)
}

fn scan(
    layout: &Layout,
    user: Option<UserId>,
    kind: FileKind,
    term_id: &str,
) -> AppResult<Option<Location>> {
    let (dir, column) = match kind {
        FileKind::Template => (layout.templates_dir(), TEMPLATE_ID_COLUMN),
        FileKind::Import => (layout.imports_dir(), IMPORT_ID_COLUMN),
    };
    for file in Layout::tsv_files(&dir)? {
        let path = layout.read_target(user, kind, &file);
        if let Some(line) = find_row(&path, column, term_id)? {
            let name = file.trim_end_matches(".tsv").to_string();
            return Ok(Some(match kind {
                FileKind::Template => Location::Template { name, path, line },
                FileKind::Import => Location::Import { name, path, line },
            }));
        }
    }
    Ok(None)
}

/// Locates a term: templates first, then imports, then the base store. A
/// user's working copies stand in for the canonical files they shadow.
pub async fn locate_term(
    layout: &Layout,
    user: Option<UserId>,
    term_id: &str,
) -> AppResult<Option<Location>> {
    if let Some(location) = scan(layout, user, FileKind::Template, term_id)? {
        return Ok(Some(location));
    }
    if let Some(location) = scan(layout, user, FileKind::Import, term_id)? {
        return Ok(Some(location));
    }
    let mut store = OntologyStore::open_path(&layout.edit_database()).await?;
    if store.term_exists(term_id).await? {
        return Ok(Some(Location::BaseStore));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{create_statements_db, test_layout, write_file};

    async fn setup(dir: &Path) -> Layout {
        let layout = test_layout(dir);
        write_file(
            &layout.templates_dir().join("assays.tsv"),
            "ontology ID\tlabel\nID\tLABEL\nOBI:0000070\tassay\nOBI:0000100\tother assay\n",
        );
        write_file(
            &layout.imports_dir().join("go_terms.tsv"),
            "Source\tID\tLabel\ngo\tGO:0008150\tbiological_process\ngo\tOBI:0000070\tshadowed\n",
        );
        create_statements_db(
            &layout.edit_database(),
            &[("OBI:0000011", "rdfs:label", None, Some("planned process"))],
        )
        .await;
        layout
    }

    #[tokio::test]
    async fn templates_then_imports_then_store() {
        let dir = tempfile::tempdir().unwrap();
        let layout = setup(dir.path()).await;

        let found = locate_term(&layout, None, "OBI:0000100").await.unwrap();
        assert_eq!(
            found,
            Some(Location::Template {
                name: "assays".to_string(),
                path: layout.templates_dir().join("assays.tsv"),
                line: 4,
            })
        );

        // Present in both a template and an import; the template wins.
        let found = locate_term(&layout, None, "OBI:0000070").await.unwrap();
        assert!(matches!(found, Some(Location::Template { line: 3, .. })));

        let found = locate_term(&layout, None, "GO:0008150").await.unwrap();
        assert!(matches!(found, Some(Location::Import { ref name, line: 2, .. }) if name == "go_terms"));

        let found = locate_term(&layout, None, "OBI:0000011").await.unwrap();
        assert_eq!(found, Some(Location::BaseStore));

        assert_eq!(locate_term(&layout, None, "OBI:9999999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn staged_terms_are_found_in_the_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let layout = setup(dir.path()).await;
        let user = UserId(1);
        let working = layout.working_copy(user, "assays.tsv");
        write_file(
            &working,
            "ontology ID\tlabel\nID\tLABEL\nOBI:0000050\tnew assay\nOBI:0000070\tassay\n",
        );

        let found = locate_term(&layout, Some(user), "OBI:0000050").await.unwrap();
        assert_eq!(
            found,
            Some(Location::Template {
                name: "assays".to_string(),
                path: working.clone(),
                line: 3,
            })
        );
        // Other users still see the canonical file.
        assert_eq!(locate_term(&layout, Some(UserId(2)), "OBI:0000050").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        assert!(locate_term(&layout, None, "OBI:1").await.is_err());
    }
}
