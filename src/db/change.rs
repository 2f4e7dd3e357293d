use serde::{Deserialize, Serialize};
use sqlx::{query, query_as};

use super::UserId;
use crate::tables::{check_name, Layout};
use crate::{AppError, AppResult, AppState};

id_struct!(ChangeId, Change);

/// Kind of file a working copy shadows.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Template,
    Import,
}

impl FileKind {
    /// Directory of this kind of file, relative to the repository root.
    pub fn repo_dir(self) -> &'static str {
        match self {
            FileKind::Template => "src/ontology/templates",
            FileKind::Import => "src/ontology/imports",
        }
    }

    /// Import files are named `<ns>_terms.tsv`; everything else is a template.
    pub fn of_stem(stem: &str) -> Self {
        if stem.ends_with("_terms") {
            FileKind::Import
        } else {
            FileKind::Template
        }
    }
}

/// A file the user has a working copy of.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub id: ChangeId,
    pub user_id: UserId,
    /// File name, such as `assays.tsv`.
    pub file: String,
    pub file_type: FileKind,
}

impl Change {
    pub fn repo_path(&self) -> String {
        format!("{}/{}", self.file_type.repo_dir(), self.file)
    }

    pub fn stem(&self) -> &str {
        self.file.trim_end_matches(".tsv")
    }
}

impl AppState {
    /// Records that `user` has a working copy of `file`. Recording twice is a
    /// no-op.
    pub async fn record_change(&self, user: UserId, file: &str, kind: FileKind) -> sqlx::Result<()> {
        query(
            "INSERT INTO changes (user_id, file, file_type) VALUES ($1, $2, $3)
                ON CONFLICT (user_id, file) DO NOTHING",
        )
        .bind(user)
        .bind(file)
        .bind(kind)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_changes(&self, user: UserId) -> sqlx::Result<Vec<Change>> {
        query_as("SELECT * FROM changes WHERE user_id = $1 ORDER BY file")
            .bind(user)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_change(&self, user: UserId, file: &str) -> sqlx::Result<Option<Change>> {
        query_as("SELECT * FROM changes WHERE user_id = $1 AND file = $2")
            .bind(user)
            .bind(file)
            .fetch_optional(&self.pool)
            .await
    }

    /// Returns whether a record was removed.
    pub async fn remove_change(&self, user: UserId, file: &str) -> sqlx::Result<bool> {
        let result = query("DELETE FROM changes WHERE user_id = $1 AND file = $2")
            .bind(user)
            .bind(file)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the user's changes whose working copies exist. Records whose
    /// working copy has gone missing are deleted.
    pub async fn changed_files(&self, user: UserId, layout: &Layout) -> sqlx::Result<Vec<Change>> {
        let mut changes = vec![];
        for change in self.get_changes(user).await? {
            if layout.working_copy(user, &change.file).exists() {
                changes.push(change);
            } else {
                tracing::warn!(%user, file = %change.file, "removing change record with no working copy");
                self.remove_change(user, &change.file).await?;
            }
        }
        Ok(changes)
    }

    /// Throws away the user's working copy of `<stem>.tsv`.
    pub async fn discard_change(&self, user: UserId, layout: &Layout, stem: &str) -> AppResult {
        let file = format!("{}.tsv", check_name(stem)?);
        let path = layout.working_copy(user, &file);
        if !path.exists() {
            return Err(AppError::MissingWorkingCopy(file));
        }
        std::fs::remove_file(&path)?;
        if !self.remove_change(user, &file).await? {
            tracing::warn!(%user, %file, "discarded working copy had no change record");
        }
        tracing::info!(%user, %file, "discarded change");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::test_util::{test_state, write_file};

    #[test]
    fn repo_paths() {
        assert_eq!(FileKind::of_stem("go_terms"), FileKind::Import);
        assert_eq!(FileKind::of_stem("assays"), FileKind::Template);
        let change = Change {
            id: ChangeId(1),
            user_id: UserId(1),
            file: "go_terms.tsv".to_string(),
            file_type: FileKind::Import,
        };
        assert_eq!(change.repo_path(), "src/ontology/imports/go_terms.tsv");
        assert_eq!(change.stem(), "go_terms");
    }

    #[sqlx::test]
    async fn recording_is_idempotent(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let user = state.upsert_github_user(1, "alice", "tok").await.unwrap().id;

        state.record_change(user, "assays.tsv", FileKind::Template).await.unwrap();
        state.record_change(user, "assays.tsv", FileKind::Template).await.unwrap();
        state.record_change(user, "go_terms.tsv", FileKind::Import).await.unwrap();

        let changes = state.get_changes(user).await.unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].file, "assays.tsv");
        assert_eq!(changes[1].file_type, FileKind::Import);

        assert!(state.remove_change(user, "assays.tsv").await.unwrap());
        assert!(!state.remove_change(user, "assays.tsv").await.unwrap());
        assert!(state.get_change(user, "assays.tsv").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn orphaned_records_are_removed(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let layout = state.config.layout.clone();
        let user = state.upsert_github_user(1, "alice", "tok").await.unwrap().id;

        write_file(&layout.working_copy(user, "assays.tsv"), "ontology ID\n");
        state.record_change(user, "assays.tsv", FileKind::Template).await.unwrap();
        state.record_change(user, "devices.tsv", FileKind::Template).await.unwrap();

        let changes = state.changed_files(user, &layout).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].repo_path(), "src/ontology/templates/assays.tsv");
        assert!(state.get_change(user, "devices.tsv").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn discard_removes_file_and_record(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let layout = state.config.layout.clone();
        let user = state.upsert_github_user(1, "alice", "tok").await.unwrap().id;

        let path = layout.working_copy(user, "assays.tsv");
        write_file(&path, "ontology ID\n");
        state.record_change(user, "assays.tsv", FileKind::Template).await.unwrap();

        state.discard_change(user, &layout, "assays").await.unwrap();
        assert!(!path.exists());
        assert!(state.get_changes(user).await.unwrap().is_empty());

        let err = state.discard_change(user, &layout, "assays").await.unwrap_err();
        assert!(matches!(err, AppError::MissingWorkingCopy(_)));
        assert!(state.discard_change(user, &layout, "../x").await.is_err());
    }
}
