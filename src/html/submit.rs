use axum::response::Response;
use axum_typed_multipart::TryFromMultipart;

use super::message::Message;
use crate::db::{FileKind, User};
use crate::github::GitHubRepo;
use crate::tables::check_name;
use crate::tables::diff::diff_files;
use crate::{AppError, AppResult, AppState, RequestBody};

/// Lists the user's changed files, after discarding one if asked.
#[derive(serde::Deserialize)]
pub struct SubmitPage {
    discard: Option<String>,
}

async fn render_changes(state: &AppState, user: User, message: Option<Message>) -> AppResult<Response> {
    let changes = state.changed_files(user.id, &state.config.layout).await?;
    let changes: Vec<serde_json::Value> = changes
        .iter()
        .map(|c| serde_json::json!({ "name": c.stem(), "path": c.repo_path() }))
        .collect();
    Ok(crate::render_html_template(
        "submit.html",
        &Some(user),
        serde_json::json!({
            "changes": changes,
            "message": message,
        }),
    ))
}

impl RequestBody for SubmitPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let message = match self.discard.as_deref().filter(|d| !d.is_empty()) {
            Some(stem) => {
                state
                    .discard_change(user.id, &state.config.layout, stem)
                    .await?;
                Some(Message::success(format!(
                    "Successfully removed changes to {stem}.tsv!"
                )))
            }
            None => None,
        };
        render_changes(&state, user, message).await
    }
}

/// Opens a pull request with every changed file.
#[derive(serde::Deserialize, TryFromMultipart)]
pub struct SubmitRequest {
    pr_name: Option<String>,
}

impl RequestBody for SubmitRequest {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        if state.changed_files(user.id, &state.config.layout).await?.is_empty() {
            let warning = Message::warning(AppError::NothingToSubmit.message());
            return render_changes(&state, user, Some(warning)).await;
        }

        let repo = GitHubRepo::for_app(&state.http, &state.config.github).await?;
        let now = chrono::Local::now().naive_local();
        let published = state
            .publish_changes(&repo, &user, self.pr_name.as_deref(), now)
            .await?;

        Ok(crate::render_html_template(
            "submitted.html",
            &Some(user),
            serde_json::json!({
                "url": published.url,
                "number": published.number,
                "files": published.files,
            }),
        ))
    }
}

/// Shows the changed lines of one working copy.
#[derive(serde::Deserialize)]
pub struct DiffPage {
    name: String,
}

impl RequestBody for DiffPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let layout = &state.config.layout;
        let file = format!("{}.tsv", check_name(&self.name)?);
        let working = layout.working_copy(user.id, &file);
        if !working.exists() {
            return Err(AppError::MissingWorkingCopy(file));
        }
        let kind = match state.get_change(user.id, &file).await? {
            Some(change) => change.file_type,
            None => FileKind::of_stem(&self.name),
        };
        let canonical = layout.canonical(kind, &file);
        let diff = diff_files(&canonical, &working)?;

        Ok(crate::render_html_template(
            "diff.html",
            &Some(user),
            serde_json::json!({
                "file": file,
                "headers": diff.headers,
                "rows": diff.display_rows(),
            }),
        ))
    }
}
