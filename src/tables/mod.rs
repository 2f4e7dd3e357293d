//! Tab-separated template and import files, and the per-user working copies
//! that stage edits to them.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::db::{FileKind, UserId};
use crate::{AppError, AppResult};

pub mod diff;
pub mod fields;
pub mod import_edit;
pub mod locate;
pub mod template_edit;

/// Identifier column of template files.
pub const TEMPLATE_ID_COLUMN: &str = "ontology ID";
/// Label column of template files.
pub const TEMPLATE_LABEL_COLUMN: &str = "label";
/// Identifier column of import files.
pub const IMPORT_ID_COLUMN: &str = "ID";

/// Where the ontology build output and the working copies live.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Root of the ontology build checkout.
    pub ontology_root: PathBuf,
    /// Directory holding one subdirectory of working copies per user.
    pub build_dir: PathBuf,
}

impl Layout {
    pub fn templates_dir(&self) -> PathBuf {
        self.ontology_root.join(FileKind::Template.repo_dir())
    }

    pub fn imports_dir(&self) -> PathBuf {
        self.ontology_root.join(FileKind::Import.repo_dir())
    }

    /// Term database built for a namespace.
    pub fn database(&self, ns: &str) -> PathBuf {
        self.ontology_root.join("build").join(format!("{ns}.db"))
    }

    /// Editable fact store for terms that live in the base ontology itself.
    pub fn edit_database(&self) -> PathBuf {
        self.database(&format!("{}-edit", crate::ontology::BASE_NAMESPACE))
    }

    pub fn user_dir(&self, user: UserId) -> PathBuf {
        self.build_dir.join(user.to_string())
    }

    pub fn working_copy(&self, user: UserId, file: &str) -> PathBuf {
        self.user_dir(user).join(file)
    }

    pub fn canonical(&self, kind: FileKind, file: &str) -> PathBuf {
        match kind {
            FileKind::Template => self.templates_dir().join(file),
            FileKind::Import => self.imports_dir().join(file),
        }
    }

    /// Returns the file a user reads and edits: their working copy if one
    /// exists, otherwise the canonical file.
    pub fn read_target(&self, user: Option<UserId>, kind: FileKind, file: &str) -> PathBuf {
        if let Some(user) = user {
            let working = self.working_copy(user, file);
            if working.exists() {
                return working;
            }
        }
        self.canonical(kind, file)
    }

    /// Lists the `.tsv` files of a directory by name, sorted.
    pub fn tsv_files(dir: &Path) -> AppResult<Vec<String>> {
        if !dir.is_dir() {
            return Ok(vec![]);
        }
        let mut files = vec![];
        for entry in std::fs::read_dir(dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tsv") {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Rejects names that could escape the directory they are joined onto.
pub fn check_name(name: &str) -> AppResult<&str> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(name)
    } else {
        Err(AppError::InvalidQuery(format!("Invalid file name: {name}")))
    }
}

pub(crate) fn tsv_reader(path: &Path) -> AppResult<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_path(path)?)
}

/// A whole tab-separated file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    /// Data rows, each padded to the header width.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Path) -> AppResult<Self> {
        let mut reader = tsv_reader(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = vec![];
        for record in reader.records() {
            let mut row: Vec<String> = record?.iter().map(str::to_string).collect();
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }
        Ok(Table { headers, rows })
    }

    /// Writes the table, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> AppResult {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str, file: &Path) -> AppResult<usize> {
        self.column(name).ok_or_else(|| AppError::MissingColumn {
            file: file.to_path_buf(),
            column: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_pads_short_rows_and_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tsv");
        std::fs::write(&path, "a\tb\tc\n1\t2\n4\t5\t6\n").unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.headers, ["a", "b", "c"]);
        assert_eq!(table.rows[0], ["1", "2", ""]);

        let out = dir.path().join("nested/out.tsv");
        table.write(&out).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "a\tb\tc\n1\t2\t\n4\t5\t6\n"
        );
    }

    #[test]
    fn check_name_rejects_paths() {
        assert!(check_name("assays").is_ok());
        assert!(check_name("go_terms").is_ok());
        assert!(check_name("../secret").is_err());
        assert!(check_name("a/b").is_err());
        assert!(check_name("").is_err());
    }

    #[test]
    fn read_target_prefers_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout {
            ontology_root: dir.path().join("root"),
            build_dir: dir.path().join("build"),
        };
        let user = UserId(3);
        assert_eq!(
            layout.read_target(Some(user), FileKind::Template, "x.tsv"),
            layout.templates_dir().join("x.tsv")
        );
        std::fs::create_dir_all(layout.user_dir(user)).unwrap();
        std::fs::write(layout.working_copy(user, "x.tsv"), "h\n").unwrap();
        assert_eq!(
            layout.read_target(Some(user), FileKind::Template, "x.tsv"),
            layout.working_copy(user, "x.tsv")
        );
        assert_eq!(
            layout.read_target(None, FileKind::Template, "x.tsv"),
            layout.templates_dir().join("x.tsv")
        );
    }
}
