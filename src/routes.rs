use crate::traits::RequestBody;
use crate::{html, static_files, AppState};

pub(crate) fn router() -> axum::Router<AppState> {
    use axum::routing::{get, post};
    use axum_embed::ServeEmbed;

    axum::Router::new()
        // Authentication
        .route("/login", get(html::auth::login))
        .route("/logout", get(html::auth::logout))
        .route("/github_callback", get(html::auth::github_callback))
        // Browsing
        .route("/", get(html::index::IndexPage::as_handler_query))
        .route(
            "/browse",
            get(html::browse::BrowsePage::as_handler_query)
                .post(html::browse::AddExportRequest::as_multipart_form_handler),
        )
        .route(
            "/import",
            get(html::import::ImportPage::as_handler_query)
                .post(html::import::StageImportRequest::as_multipart_form_handler),
        )
        .route("/search", get(html::search::SearchRequest::as_handler_query))
        // Editing
        .route(
            "/add-term",
            get(html::edit_term::AddTermPage::as_handler_query)
                .post(html::edit_term::TermForm::as_form_handler),
        )
        .route(
            "/update",
            get(html::edit_term::UpdateTermPage::as_handler_query)
                .post(html::edit_term::UpdateTermRequest::as_form_handler),
        )
        .route("/export", get(html::export::ExportPage::as_handler_query))
        // Publishing
        .route(
            "/submit",
            get(html::submit::SubmitPage::as_handler_query)
                .post(html::submit::SubmitRequest::as_multipart_form_handler),
        )
        .route("/diff", get(html::submit::DiffPage::as_handler_query))
        // Resources
        .nest_service("/js", ServeEmbed::<static_files::JsFiles>::new())
        .nest_service("/css", ServeEmbed::<static_files::CssFiles>::new())
}
