use axum::response::Response;

use crate::db::User;
use crate::ontology::{BASE_TITLE, IMPORTS};
use crate::tables::Layout;
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct IndexPage {}

impl RequestBody for IndexPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let templates: Vec<String> = Layout::tsv_files(&state.config.layout.templates_dir())?
            .iter()
            .map(|f| f.trim_end_matches(".tsv").to_string())
            .collect();
        let imports: Vec<serde_json::Value> = IMPORTS
            .iter()
            .map(|(ns, title)| serde_json::json!({ "ns": ns, "title": title }))
            .collect();

        Ok(crate::render_html_template(
            "index.html",
            &user,
            serde_json::json!({
                "base_title": BASE_TITLE,
                "templates": templates,
                "imports": imports,
            }),
        ))
    }
}
