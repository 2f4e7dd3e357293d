use std::path::PathBuf;

use eyre::{Context, Result};

use crate::tables::Layout;

/// Server configuration, read once at startup from the environment (and from
/// `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string for users, changes and exports.
    pub database_url: String,
    /// Public URL of this server, with no trailing slash. Example:
    /// `https://odk.example.org`
    pub domain_name: String,
    pub bind_address: String,
    /// Logging configuration.
    pub rust_log: String,
    /// Key used to sign session cookies. Must be at least 64 bytes.
    pub secret_key: String,
    /// Field table describing the form fields of every template.
    pub field_table: PathBuf,
    pub layout: Layout,
    pub github: GitHubConfig,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub app_id: String,
    /// Fixed OAuth `state` value sent to GitHub and checked on callback.
    pub app_state: String,
    pub client_id: String,
    pub client_secret: String,
    /// Path to the GitHub App's PEM private key.
    pub private_key: PathBuf,
    /// Target repository, as `owner/name`.
    pub repo: String,
    /// Branch that pull requests are opened against.
    pub base_branch: String,
}

fn var(name: &str) -> Result<String> {
    dotenvy::var(name).wrap_err_with(|| format!("missing {name} environment variable"))
}

fn var_or(name: &str, default: &str) -> String {
    dotenvy::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: var("DATABASE_URL")?,
            domain_name: var("DOMAIN_NAME")?.trim_end_matches('/').to_string(),
            bind_address: var_or("BIND_ADDRESS", "0.0.0.0:5000"),
            rust_log: var_or("RUST_LOG", "info"),
            secret_key: var("SECRET_KEY")?,
            field_table: var_or("FIELD_TABLE", "src/field.tsv").into(),
            layout: Layout {
                ontology_root: var("ONTOLOGY_BUILD_PATH")?.into(),
                build_dir: var_or("BUILD_DIR", "build").into(),
            },
            github: GitHubConfig {
                app_id: var("GITHUB_APP_ID")?,
                app_state: var("GITHUB_APP_STATE")?,
                client_id: var("GITHUB_CLIENT_ID")?,
                client_secret: var("GITHUB_CLIENT_SECRET")?,
                private_key: var("GITHUB_PRIVATE_KEY")?.into(),
                repo: var("GITHUB_REPO")?,
                base_branch: var("BASE_BRANCH")?,
            },
        })
    }

    /// OAuth redirect target registered with the GitHub App.
    pub fn callback_url(&self) -> String {
        format!("{}/github_callback", self.domain_name)
    }
}
