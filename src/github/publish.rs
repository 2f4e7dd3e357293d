use chrono::NaiveDateTime;
use itertools::Itertools;

use super::{FileUpdate, PullRequest, RepoHost};
use crate::db::{Change, User};
use crate::{AppError, AppResult, AppState};

/// Pull request opened from a user's staged changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPr {
    pub number: u64,
    pub url: String,
    pub branch: String,
    /// Repository paths that were committed.
    pub files: Vec<String>,
}

fn manual_pr_url(repo: &str, base: &str, branch: &str) -> String {
    format!("https://github.com/{repo}/compare/{base}...{branch}")
}

impl AppState {
    /// Commits each of the user's working copies to a new branch and opens a
    /// pull request against the base branch. Every committed file is removed
    /// from the ledger and from disk, and the export list is cleared once the
    /// pull request is open.
    ///
    /// Failures after the branch exists carry a link for opening the pull
    /// request by hand.
    pub async fn publish_changes<H: RepoHost>(
        &self,
        host: &H,
        user: &User,
        title: Option<&str>,
        now: NaiveDateTime,
    ) -> AppResult<PublishedPr> {
        let layout = &self.config.layout;
        let github = &self.config.github;

        let changes = self.changed_files(user.id, layout).await?;
        if changes.is_empty() {
            return Err(AppError::NothingToSubmit);
        }

        let mut branch = format!("{}-{}", user.github_login, now.format("%Y-%m-%d"));
        if host.branch_sha(&branch).await?.is_some() {
            branch = format!("{}-{}", user.github_login, now.format("%Y-%m-%d-%H%M"));
        }

        let base_sha = host
            .branch_sha(&github.base_branch)
            .await?
            .ok_or_else(|| AppError::MissingBaseBranch {
                branch: github.base_branch.clone(),
                repo: github.repo.clone(),
            })?;
        tracing::info!(%branch, base = %github.base_branch, "creating branch");
        host.create_branch(&branch, &base_sha).await?;

        let manual_url = manual_pr_url(&github.repo, &github.base_branch, &branch);
        let failed = |e: AppError| {
            tracing::error!(%branch, "could not open pull request: {}", e.message());
            AppError::PullRequestFailed {
                cause: e.message(),
                manual_url: manual_url.clone(),
            }
        };

        let mut files = vec![];
        for change in changes {
            let repo_path = self
                .commit_change(host, user, &change, &branch)
                .await
                .map_err(&failed)?;
            files.push(repo_path);
        }

        let pr = PullRequest {
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(&branch)
                .to_string(),
            body: format!(
                "Update files:\n\n{}",
                files.iter().map(|f| format!("- {f}")).join("\n")
            ),
            head: branch.clone(),
            base: github.base_branch.clone(),
        };
        let number = host
            .open_pull_request(&user.access_token, &pr)
            .await
            .map_err(&failed)?;

        self.clear_exports(user.id).await?;
        let url = format!("https://github.com/{}/pull/{number}", github.repo);
        tracing::info!(user = %user.id, %url, "opened pull request");
        Ok(PublishedPr {
            number,
            url,
            branch,
            files,
        })
    }

    /// Commits one working copy to `branch`, then drops it from the ledger
    /// and from disk. Returns the repository path.
    async fn commit_change<H: RepoHost>(
        &self,
        host: &H,
        user: &User,
        change: &Change,
        branch: &str,
    ) -> AppResult<String> {
        let github = &self.config.github;
        let path = self.config.layout.working_copy(user.id, &change.file);
        let content = std::fs::read_to_string(&path)?;
        let repo_path = change.repo_path();

        tracing::info!(user = %user.id, %repo_path, "committing file");
        let sha = host.file_sha(&repo_path, &github.base_branch).await?;
        host.update_file(FileUpdate {
            path: &repo_path,
            message: &format!("Update {}", change.file),
            content: &content,
            sha: &sha,
            branch,
        })
        .await?;

        self.remove_change(user.id, &change.file).await?;
        std::fs::remove_file(&path)?;
        Ok(repo_path)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use sqlx::SqlitePool;

    use super::*;
    use crate::db::FileKind;
    use crate::test_util::{test_state, write_file};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        CreateBranch { branch: String, sha: String },
        UpdateFile { path: String, message: String, content: String, sha: String, branch: String },
        OpenPr { token: String, pr: PullRequest },
    }

    #[derive(Default)]
    struct FakeHost {
        branches: Mutex<HashSet<String>>,
        calls: Mutex<Vec<Call>>,
        reject_pr: bool,
        /// 1-based index of the file commit that fails.
        fail_update_on: Option<usize>,
    }

    impl FakeHost {
        fn with_branches(branches: &[&str]) -> Self {
            FakeHost {
                branches: Mutex::new(branches.iter().map(|b| b.to_string()).collect()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RepoHost for FakeHost {
        async fn branch_sha(&self, branch: &str) -> AppResult<Option<String>> {
            let exists = self.branches.lock().unwrap().contains(branch);
            Ok(exists.then(|| format!("sha-{branch}")))
        }

        async fn create_branch(&self, branch: &str, sha: &str) -> AppResult {
            self.branches.lock().unwrap().insert(branch.to_string());
            self.calls.lock().unwrap().push(Call::CreateBranch {
                branch: branch.to_string(),
                sha: sha.to_string(),
            });
            Ok(())
        }

        async fn file_sha(&self, path: &str, branch: &str) -> AppResult<String> {
            Ok(format!("blob-{branch}-{path}"))
        }

        async fn update_file(&self, update: FileUpdate<'_>) -> AppResult {
            let mut calls = self.calls.lock().unwrap();
            let attempt = 1 + calls
                .iter()
                .filter(|c| matches!(c, Call::UpdateFile { .. }))
                .count();
            if self.fail_update_on == Some(attempt) {
                return Err(AppError::GitHubError("Bad credentials".to_string()));
            }
            calls.push(Call::UpdateFile {
                path: update.path.to_string(),
                message: update.message.to_string(),
                content: update.content.to_string(),
                sha: update.sha.to_string(),
                branch: update.branch.to_string(),
            });
            Ok(())
        }

        async fn open_pull_request(&self, user_token: &str, pr: &PullRequest) -> AppResult<u64> {
            if self.reject_pr {
                return Err(AppError::GitHubError("Validation Failed".to_string()));
            }
            self.calls.lock().unwrap().push(Call::OpenPr {
                token: user_token.to_string(),
                pr: pr.clone(),
            });
            Ok(17)
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(12, 34, 0)
            .unwrap()
    }

    async fn stage(state: &AppState, user: &User) {
        let layout = &state.config.layout;
        write_file(&layout.working_copy(user.id, "assays.tsv"), "ontology ID\nOBI:1\n");
        write_file(&layout.working_copy(user.id, "go_terms.tsv"), "ID\nGO:1\n");
        state.record_change(user.id, "assays.tsv", FileKind::Template).await.unwrap();
        state.record_change(user.id, "go_terms.tsv", FileKind::Import).await.unwrap();
    }

    #[sqlx::test]
    async fn publishes_every_change_and_cleans_up(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let user = state.upsert_github_user(1, "alice", "user-token").await.unwrap();
        stage(&state, &user).await;
        state.add_export(user.id, "OBI:1").await.unwrap();

        let host = FakeHost::with_branches(&["master"]);
        let published = state
            .publish_changes(&host, &user, Some("  "), noon())
            .await
            .unwrap();

        assert_eq!(published.branch, "alice-2024-03-05");
        assert_eq!(published.url, "https://github.com/example/obi/pull/17");
        assert_eq!(
            host.calls(),
            [
                Call::CreateBranch {
                    branch: "alice-2024-03-05".to_string(),
                    sha: "sha-master".to_string(),
                },
                Call::UpdateFile {
                    path: "src/ontology/templates/assays.tsv".to_string(),
                    message: "Update assays.tsv".to_string(),
                    content: "ontology ID\nOBI:1\n".to_string(),
                    sha: "blob-master-src/ontology/templates/assays.tsv".to_string(),
                    branch: "alice-2024-03-05".to_string(),
                },
                Call::UpdateFile {
                    path: "src/ontology/imports/go_terms.tsv".to_string(),
                    message: "Update go_terms.tsv".to_string(),
                    content: "ID\nGO:1\n".to_string(),
                    sha: "blob-master-src/ontology/imports/go_terms.tsv".to_string(),
                    branch: "alice-2024-03-05".to_string(),
                },
                Call::OpenPr {
                    token: "user-token".to_string(),
                    pr: PullRequest {
                        title: "alice-2024-03-05".to_string(),
                        body: "Update files:\n\n- src/ontology/templates/assays.tsv\n- src/ontology/imports/go_terms.tsv".to_string(),
                        head: "alice-2024-03-05".to_string(),
                        base: "master".to_string(),
                    },
                },
            ]
        );

        assert!(state.get_changes(user.id).await.unwrap().is_empty());
        assert!(!state.config.layout.working_copy(user.id, "assays.tsv").exists());
        assert!(state.get_exports(user.id).await.unwrap().is_empty());

        let err = state
            .publish_changes(&host, &user, None, noon())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NothingToSubmit));
    }

    #[sqlx::test]
    async fn existing_branch_gets_a_time_suffix(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let user = state.upsert_github_user(1, "alice", "tok").await.unwrap();
        stage(&state, &user).await;

        let host = FakeHost::with_branches(&["master", "alice-2024-03-05"]);
        let published = state
            .publish_changes(&host, &user, Some("New assays"), noon())
            .await
            .unwrap();
        assert_eq!(published.branch, "alice-2024-03-05-1234");
        match host.calls().last() {
            Some(Call::OpenPr { pr, .. }) => assert_eq!(pr.title, "New assays"),
            other => panic!("unexpected last call: {other:?}"),
        }
    }

    #[sqlx::test]
    async fn missing_base_branch_commits_nothing(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let user = state.upsert_github_user(1, "alice", "tok").await.unwrap();
        stage(&state, &user).await;

        let host = FakeHost::with_branches(&[]);
        let err = state
            .publish_changes(&host, &user, None, noon())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "'master' does not exist in repo example/obi");
        assert!(host.calls().is_empty());
        assert_eq!(state.get_changes(user.id).await.unwrap().len(), 2);
    }

    #[sqlx::test]
    async fn failed_pull_request_links_to_compare_page(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let user = state.upsert_github_user(1, "alice", "tok").await.unwrap();
        stage(&state, &user).await;

        let host = FakeHost {
            reject_pr: true,
            ..FakeHost::with_branches(&["master"])
        };
        let err = state
            .publish_changes(&host, &user, None, noon())
            .await
            .unwrap_err();
        match err {
            AppError::PullRequestFailed { cause, manual_url } => {
                assert_eq!(cause, "GitHub error: Validation Failed");
                assert_eq!(
                    manual_url,
                    "https://github.com/example/obi/compare/master...alice-2024-03-05"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[sqlx::test]
    async fn failed_commit_keeps_the_rest_and_links_to_compare_page(pool: SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(pool, dir.path());
        let layout = state.config.layout.clone();
        let user = state.upsert_github_user(1, "alice", "tok").await.unwrap();
        stage(&state, &user).await;
        state.add_export(user.id, "OBI:1").await.unwrap();

        let host = FakeHost {
            fail_update_on: Some(2),
            ..FakeHost::with_branches(&["master"])
        };
        let err = state
            .publish_changes(&host, &user, None, noon())
            .await
            .unwrap_err();
        match err {
            AppError::PullRequestFailed { cause, manual_url } => {
                assert_eq!(cause, "GitHub error: Bad credentials");
                assert_eq!(
                    manual_url,
                    "https://github.com/example/obi/compare/master...alice-2024-03-05"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(!host.calls().iter().any(|c| matches!(c, Call::OpenPr { .. })));
        assert!(!layout.working_copy(user.id, "assays.tsv").exists());
        assert!(layout.working_copy(user.id, "go_terms.tsv").exists());
        let remaining = state.get_changes(user.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file, "go_terms.tsv");
        assert_eq!(state.get_exports(user.id).await.unwrap(), ["OBI:1"]);
    }
}
