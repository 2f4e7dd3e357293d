use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::User;
use crate::ontology::{ExportFormat, OntologyStore, BASE_NAMESPACE};
use crate::{AppError, AppState, RequestBody};

use super::message::Message;

#[derive(serde::Deserialize)]
pub struct ExportPage {
    /// Term to drop from the export list first.
    remove: Option<String>,
    /// `tsv` or `csv` to download instead of viewing.
    format: Option<String>,
}

impl RequestBody for ExportPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let format = self
            .format
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(ExportFormat::parse)
            .transpose()?;

        if let Some(term) = self.remove.as_deref().filter(|t| !t.is_empty()) {
            state.remove_export(user.id, term).await?;
            tracing::info!(user = %user.id, term, "removed term from export");
        }

        let terms = state.get_exports(user.id).await?;
        if terms.is_empty() {
            return Ok(crate::render_html_template(
                "export.html",
                &Some(user),
                serde_json::json!({
                    "headers": [],
                    "rows": [],
                    "message": Message::info("There are no terms to export."),
                }),
            ));
        }

        let mut store = OntologyStore::open(&state.config.layout, BASE_NAMESPACE).await?;
        let table = store.export_terms(&terms).await?;

        if let Some(format) = format {
            let filename = match format {
                ExportFormat::Tsv => "export.tsv",
                ExportFormat::Csv => "export.csv",
            };
            return Ok((
                [
                    (header::CONTENT_TYPE, format.mime_type().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                table.to_delimited(format)?,
            )
                .into_response());
        }

        #[derive(serde::Serialize)]
        struct Row<'a> {
            id: &'a str,
            cells: &'a [String],
        }
        let rows: Vec<Row<'_>> = terms
            .iter()
            .zip(&table.rows)
            .map(|(id, cells)| Row { id, cells })
            .collect();

        Ok(crate::render_html_template(
            "export.html",
            &Some(user),
            serde_json::json!({
                "headers": table.headers,
                "rows": rows,
            }),
        ))
    }
}
