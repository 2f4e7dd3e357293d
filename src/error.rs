use std::path::PathBuf;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

pub type AppResult<T = ()> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    SqlError(sqlx::Error),
    IoError(std::io::Error),
    TableError(csv::Error),
    GitHubError(String),
    NotLoggedIn,
    NotFound,
    InvalidQuery(String),

    MissingDatabase(PathBuf),
    UnknownOntology(String),
    UnknownTemplate(String),
    UnknownImport(String),
    MissingColumn { file: PathBuf, column: String },
    UnknownInputType { column: String, input_type: String },
    InvalidExportFormat(String),
    MissingWorkingCopy(String),

    /// Inserting a term whose identifier is already in the template.
    DuplicateTerm {
        template: String,
        term_id: String,
        label: String,
        existing_label: String,
    },
    /// Updating a term whose identifier is not in the template.
    MissingTerm { template: String, term_id: String },
    /// Edit submitted without an `ontology ID`.
    MissingIdentifier { template: String },
    ParentNotFound {
        term_id: String,
        label: String,
        parent: String,
    },
    AlreadyImported {
        term_id: String,
        label: String,
        namespace: String,
    },
    /// Import submitted without a term.
    MissingImportTerm { namespace: String },
    /// Import of a term that is not in the namespace's database.
    UnknownImportTerm { term_id: String, namespace: String },

    NothingToSubmit,
    MissingBaseBranch { branch: String, repo: String },
    PullRequestFailed { cause: String, manual_url: String },

    Other(String),
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            Self::SqlError(err) => format!("Internal SQL error: {err}"),
            Self::IoError(err) => format!("File error: {err}"),
            Self::TableError(err) => format!("Malformed table: {err}"),
            Self::GitHubError(msg) => format!("GitHub error: {msg}"),
            Self::NotLoggedIn => "Not logged in".to_string(),
            Self::NotFound => "Not found".to_string(),
            Self::InvalidQuery(msg) => msg.to_string(),

            Self::MissingDatabase(path) => {
                format!("A database does not exist at {}", path.display())
            }
            Self::UnknownOntology(ns) => format!("Unknown ontology: {ns}"),
            Self::UnknownTemplate(name) => format!("Unknown template: {name}"),
            Self::UnknownImport(ns) => format!("No import file exists for {ns}"),
            Self::MissingColumn { file, column } => {
                format!("{} has no '{column}' column", file.display())
            }
            Self::UnknownInputType { column, input_type } => {
                format!("Unknown input type '{input_type}' for column '{column}'")
            }
            Self::InvalidExportFormat(format) => format!("Not a valid export format: {format}"),
            Self::MissingWorkingCopy(file) => format!("Cannot find changed file: {file}"),

            Self::DuplicateTerm {
                template,
                term_id,
                label,
                existing_label,
            } => format!(
                "Cannot add '{label}' ({term_id}) to {template} template; \
                 {term_id} already exists in template as '{existing_label}'."
            ),
            Self::MissingTerm { template, term_id } => format!(
                "Cannot update {term_id} in {template} template; \
                 {term_id} does not exist in template."
            ),
            Self::MissingIdentifier { template } => {
                format!("Cannot add to {template} template; an ontology ID is required.")
            }
            Self::ParentNotFound {
                term_id,
                label,
                parent,
            } => format!(
                "'{label}' ({term_id}) could not be added; parent '{parent}' does not exist in OBI."
            ),
            Self::AlreadyImported {
                term_id,
                label,
                namespace,
            } => format!("'{label}' ({term_id}) already exists in {namespace} import."),
            Self::MissingImportTerm { namespace } => {
                format!("Cannot add to {namespace} import; a term is required.")
            }
            Self::UnknownImportTerm { term_id, namespace } => format!(
                "Cannot add {term_id} to {namespace} import; {term_id} does not exist in {namespace}."
            ),

            Self::NothingToSubmit => "There are no changes to submit.".to_string(),
            Self::MissingBaseBranch { branch, repo } => {
                format!("'{branch}' does not exist in repo {repo}")
            }
            Self::PullRequestFailed { cause, manual_url } => format!(
                "Unable to create a new pull request.\nCause: {cause}\n\
                 Please go to {manual_url} to manually create this PR."
            ),

            Self::Other(msg) => msg.to_string(),
        }
    }

    /// Returns whether this error is an edit the user can correct, which is
    /// shown as an alert on the page instead of an error response.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTerm { .. }
                | Self::MissingTerm { .. }
                | Self::MissingIdentifier { .. }
                | Self::ParentNotFound { .. }
                | Self::AlreadyImported { .. }
                | Self::MissingImportTerm { .. }
                | Self::UnknownImportTerm { .. }
        )
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TableError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::GitHubError(_) => StatusCode::BAD_GATEWAY,
            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,

            Self::MissingDatabase(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownOntology(_) => StatusCode::BAD_REQUEST,
            Self::UnknownTemplate(_) => StatusCode::NOT_FOUND,
            Self::UnknownImport(_) => StatusCode::NOT_FOUND,
            Self::MissingColumn { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownInputType { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidExportFormat(_) => StatusCode::BAD_REQUEST,
            Self::MissingWorkingCopy(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Self::DuplicateTerm { .. }
            | Self::MissingTerm { .. }
            | Self::MissingIdentifier { .. }
            | Self::ParentNotFound { .. }
            | Self::AlreadyImported { .. }
            | Self::MissingImportTerm { .. }
            | Self::UnknownImportTerm { .. } => StatusCode::BAD_REQUEST,

            Self::NothingToSubmit => StatusCode::BAD_REQUEST,
            Self::MissingBaseBranch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PullRequestFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,

            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response<Body> {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self.message());
        }
        (
            status,
            crate::render_html_template(
                "error.html",
                &None,
                serde_json::json!({ "error_msg": self.message() }),
            ),
        )
            .into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> AppError {
        AppError::SqlError(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> AppError {
        AppError::IoError(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> AppError {
        AppError::TableError(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> AppError {
        AppError::GitHubError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> AppError {
        AppError::GitHubError(format!("could not sign app token: {err}"))
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> AppError {
        AppError::Other(format!("template error: {err}"))
    }
}
