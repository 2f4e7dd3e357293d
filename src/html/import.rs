use axum::response::Response;
use axum_typed_multipart::TryFromMultipart;

use super::message::Message;
use super::tree::render_tree;
use crate::db::{FileKind, User};
use crate::tables::import_edit::{apply_import_edit, resolve_import_term};
use crate::{AppError, AppResult, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct ImportPage {
    ns: String,
    term: Option<String>,
}

impl RequestBody for ImportPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        render_tree(&state, user, &self.ns, self.term.as_deref(), None).await
    }
}

/// Stages a term from an imported ontology in the namespace's import file.
#[derive(serde::Deserialize, TryFromMultipart)]
pub struct StageImportRequest {
    ns: String,
    term: String,
    parent: Option<String>,
    related_entities: Option<String>,
}

impl StageImportRequest {
    async fn stage(&self, state: &AppState, user: &User) -> AppResult<String> {
        let layout = &state.config.layout;
        let term = resolve_import_term(
            layout,
            &self.ns,
            self.term.trim(),
            self.parent.as_deref(),
            self.related_entities.as_deref().unwrap_or(""),
        )
        .await?;
        let edit = apply_import_edit(layout, user.id, &term)?;
        state.record_change(user.id, &edit.file, FileKind::Import).await?;
        Ok(edit.message)
    }
}

impl RequestBody for StageImportRequest {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let mut term = Some(self.term.trim());
        let message = match self.stage(&state, &user).await {
            Ok(text) => Message::success(text),
            Err(e) => {
                if matches!(e, AppError::UnknownImportTerm { .. }) {
                    term = None;
                }
                Message::from_rejection(e)?
            }
        };
        render_tree(&state, Some(user), &self.ns, term, Some(message)).await
    }
}
