use axum::response::Response;

use super::message::Message;
use crate::db::User;
use crate::ontology::{self, OntologyStore, BASE_NAMESPACE};
use crate::{AppResult, AppState};

/// Renders the hierarchy browser for a namespace, around `term` or at the
/// top level.
pub async fn render_tree(
    state: &AppState,
    user: Option<User>,
    ns: &str,
    term: Option<&str>,
    message: Option<Message>,
) -> AppResult<Response> {
    let title = ontology::namespace_title(ns)?;
    let mut store = OntologyStore::open(&state.config.layout, ns).await?;
    let tree = store.tree(term.filter(|t| !t.is_empty())).await?;

    let is_import = ns != BASE_NAMESPACE;
    let link_prefix = if is_import {
        format!("/import?ns={ns}&term=")
    } else {
        "/browse?term=".to_string()
    };

    Ok(crate::render_html_template(
        "tree.html",
        &user,
        serde_json::json!({
            "ns": ns,
            "title": title,
            "is_import": is_import,
            "link_prefix": link_prefix,
            "tree": tree,
            "message": message,
        }),
    ))
}
