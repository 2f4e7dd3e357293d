use axum::response::Response;
use axum_typed_multipart::TryFromMultipart;

use super::message::Message;
use super::tree::render_tree;
use crate::db::User;
use crate::ontology::BASE_NAMESPACE;
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct BrowsePage {
    term: Option<String>,
}

impl RequestBody for BrowsePage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        render_tree(&state, user, BASE_NAMESPACE, self.term.as_deref(), None).await
    }
}

/// Adds the browsed term to the user's export list.
#[derive(serde::Deserialize, TryFromMultipart)]
pub struct AddExportRequest {
    term: String,
}

impl RequestBody for AddExportRequest {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let term = self.term.trim();
        if term.is_empty() {
            return Err(AppError::InvalidQuery("A term ID was not specified".to_string()));
        }

        let message = if state.add_export(user.id, term).await? {
            tracing::info!(user = %user.id, term, "added term to export");
            Message::success("Term added to export! Click 'Export' to view all export terms.")
        } else {
            Message::warning(
                "This term already exists in your export! Click 'Export' to view all export terms.",
            )
        };
        render_tree(&state, Some(user), BASE_NAMESPACE, Some(term), Some(message)).await
    }
}
