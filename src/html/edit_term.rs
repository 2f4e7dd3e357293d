//! New-term and update forms for template terms.

use std::collections::BTreeMap;

use axum::response::Response;

use super::form::build_form_html;
use super::message::Message;
use super::tree::render_tree;
use crate::db::{FileKind, User};
use crate::ontology::{OntologyStore, BASE_NAMESPACE};
use crate::tables::fields::{FieldSchema, FieldSpec};
use crate::tables::locate::{locate_term, Location};
use crate::tables::template_edit::{apply_template_edit, EditMode};
use crate::tables::{check_name, Table, TEMPLATE_ID_COLUMN, TEMPLATE_LABEL_COLUMN};
use crate::{AppError, AppResult, AppState, RequestBody};

struct EditForm<'a> {
    title: String,
    action: &'a str,
    metadata_html: String,
    logic_html: String,
    editable: bool,
}

fn render_edit_form(user: User, form: EditForm<'_>, message: Option<Message>) -> Response {
    crate::render_html_template(
        "edit-term.html",
        &Some(user),
        serde_json::json!({
            "title": form.title,
            "action": form.action,
            "metadata_html": form.metadata_html,
            "logic_html": form.logic_html,
            "editable": form.editable,
            "message": message,
        }),
    )
}

/// Maps submitted form names back to template columns.
fn submitted_columns(values: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(name, value)| (name.replace('-', " "), value.clone()))
        .collect()
}

fn template_form(
    state: &AppState,
    template: &str,
    title: String,
    action: &'static str,
    values: &BTreeMap<String, String>,
) -> AppResult<EditForm<'static>> {
    let fields = FieldSchema::load(&state.config.field_table)?.template_fields(template);
    Ok(EditForm {
        title,
        action,
        metadata_html: build_form_html(&fields.metadata, values, &[("template", template)])?,
        logic_html: build_form_html(&fields.logic, values, &[])?,
        editable: true,
    })
}

fn require_template(state: &AppState, template: &str) -> AppResult<String> {
    let template = check_name(template)?;
    let file = format!("{template}.tsv");
    if !state.config.layout.canonical(FileKind::Template, &file).exists() {
        return Err(AppError::UnknownTemplate(template.to_string()));
    }
    Ok(template.to_string())
}

fn new_term_title(template: &str) -> String {
    format!("Add '{template}' term")
}

#[derive(serde::Deserialize)]
pub struct AddTermPage {
    template: String,
}

impl RequestBody for AddTermPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let template = require_template(&state, &self.template)?;
        let form = template_form(
            &state,
            &template,
            new_term_title(&template),
            "/add-term",
            &BTreeMap::new(),
        )?;
        Ok(render_edit_form(user, form, None))
    }
}

/// Submitted edit form. Field names are template columns with `-` for
/// spaces, plus a hidden `template`.
#[derive(serde::Deserialize)]
pub struct TermForm {
    #[serde(flatten)]
    values: BTreeMap<String, String>,
}

impl TermForm {
    fn template(&self) -> AppResult<&str> {
        self.values
            .get("template")
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::InvalidQuery("A template was not specified".to_string()))
    }

    fn term_id(&self) -> Option<&str> {
        self.values
            .get(&super::form::field_name(TEMPLATE_ID_COLUMN))
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }

    /// Writes the edit to the user's working copy and records the change.
    async fn stage(&self, state: &AppState, user: &User, mode: EditMode) -> AppResult<String> {
        let template = self.template()?;
        let edit = apply_template_edit(&state.config.layout, user.id, template, &self.values, mode)?;
        state.record_change(user.id, &edit.file, FileKind::Template).await?;
        Ok(edit.message())
    }
}

impl RequestBody for TermForm {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let template = require_template(&state, self.template()?)?;

        // A successful insert shows a fresh form; a rejected one keeps what
        // was typed.
        let (message, values) = match self.stage(&state, &user, EditMode::Insert).await {
            Ok(text) => (Message::success(text), BTreeMap::new()),
            Err(e) => (Message::from_rejection(e)?, submitted_columns(&self.values)),
        };
        let form = template_form(&state, &template, new_term_title(&template), "/add-term", &values)?;
        Ok(render_edit_form(user, form, Some(message)))
    }
}

#[derive(serde::Deserialize)]
pub struct UpdateTermPage {
    term: String,
}

impl RequestBody for UpdateTermPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        render_update_form(&state, user, self.term.trim(), None).await
    }
}

/// Replaces a template row with the submitted values.
#[derive(serde::Deserialize)]
#[serde(transparent)]
pub struct UpdateTermRequest {
    form: TermForm,
}

impl RequestBody for UpdateTermRequest {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let term_id = self
            .form
            .term_id()
            .ok_or_else(|| AppError::MissingIdentifier {
                template: self.form.template().unwrap_or_default().to_string(),
            })?
            .to_string();
        let message = match self.form.stage(&state, &user, EditMode::Update).await {
            Ok(text) => Message::success(text),
            Err(e) => Message::from_rejection(e)?,
        };
        render_update_form(&state, user, &term_id, Some(message)).await
    }
}

/// Renders the edit form for wherever the term is defined.
async fn render_update_form(
    state: &AppState,
    user: User,
    term_id: &str,
    message: Option<Message>,
) -> AppResult<Response> {
    let layout = &state.config.layout;
    let title = format!("Update {term_id}");

    match locate_term(layout, Some(user.id), term_id).await? {
        Some(Location::Template { name, path, line }) => {
            let table = Table::read(&path)?;
            // Line 1 is the header.
            let row = (line as usize)
                .checked_sub(2)
                .and_then(|i| table.rows.get(i))
                .ok_or(AppError::NotFound)?;
            let values: BTreeMap<String, String> =
                table.headers.iter().cloned().zip(row.iter().cloned()).collect();
            let form = template_form(state, &name, title, "/update", &values)?;
            Ok(render_edit_form(user, form, message))
        }
        Some(Location::Import { .. }) => {
            let warning = Message::warning("Unable to edit import terms at this time.");
            render_tree(state, Some(user), BASE_NAMESPACE, Some(term_id), Some(warning)).await
        }
        Some(Location::BaseStore) => {
            let mut store = OntologyStore::open_path(&layout.edit_database()).await?;
            let form = base_store_form(&mut store, term_id, title).await?;
            let message = message.or_else(|| {
                Some(Message::info(
                    "This term is asserted in the ontology itself and cannot be edited here.",
                ))
            });
            Ok(render_edit_form(user, form, message))
        }
        None => Err(AppError::InvalidQuery(format!(
            "{term_id} is not defined in any template, import or the ontology"
        ))),
    }
}

/// Read-only form showing a base store term's annotations and logic.
async fn base_store_form(
    store: &mut OntologyStore,
    term_id: &str,
    title: String,
) -> AppResult<EditForm<'static>> {
    let mut values = BTreeMap::from([
        (TEMPLATE_ID_COLUMN.to_string(), term_id.to_string()),
        (
            TEMPLATE_LABEL_COLUMN.to_string(),
            store.label(term_id).await?.unwrap_or_default(),
        ),
    ]);
    let mut metadata = vec![
        FieldSpec::new(TEMPLATE_ID_COLUMN, "text", true),
        FieldSpec::new(TEMPLATE_LABEL_COLUMN, "text", true),
    ];
    for (property, label) in store.annotation_properties().await? {
        values.insert(label.clone(), store.values(term_id, &property).await?.join("|"));
        metadata.push(FieldSpec::new(&label, "textarea", false));
    }

    let mut logic = vec![];
    for (column, predicate) in [
        ("parent class", "rdfs:subClassOf"),
        ("equivalent class", "owl:equivalentClass"),
    ] {
        values.insert(column.to_string(), store.values(term_id, predicate).await?.join("|"));
        logic.push(FieldSpec::new(column, "search", false));
    }

    Ok(EditForm {
        title,
        action: "/update",
        metadata_html: build_form_html(&metadata, &values, &[])?,
        logic_html: build_form_html(&logic, &values, &[])?,
        editable: false,
    })
}
