#[macro_use]
extern crate lazy_static;
#[macro_use]
mod macros;

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use clap::Parser;
use eyre::{eyre, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

mod cli;
mod cookies;
mod db;
mod env;
mod error;
mod github;
mod html;
mod ontology;
mod routes;
mod static_files;
mod tables;
mod traits;

#[cfg(test)]
mod test_util;

pub use error::{AppError, AppResult};
pub use static_files::render_html_template;
pub use traits::RequestBody;

use cli::{Args, Command};
use env::Config;
use tables::fields::FieldSchema;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub cookie_key: Key,
    pub http: reqwest::Client,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.rust_log))
        .init();

    if let Some(Command::Fields { template }) = &args.command {
        let schema = FieldSchema::load(&config.field_table).map_err(|e| eyre!(e.message()))?;
        let fields = schema.template_fields(template);
        for (category, specs) in [("metadata", &fields.metadata), ("logic", &fields.logic)] {
            for spec in specs {
                let required = if spec.required { " (required)" } else { "" };
                println!("{category}\t{}\t{}{required}", spec.column, spec.input_type);
            }
        }
        return Ok(());
    }

    let cookie_key = Key::try_from(config.secret_key.as_bytes())
        .map_err(|e| eyre!("invalid SECRET_KEY: {e}"))?;

    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .connect_with(options)
        .await
        .wrap_err("can't connect to database")?;

    let state = AppState {
        pool,
        config: Arc::new(config),
        cookie_key,
        http: reqwest::Client::new(),
    };
    state.migrate().await?;

    match args.command.unwrap_or_default() {
        Command::Run => {
            std::fs::create_dir_all(&state.config.layout.build_dir)?;
            let bind_address = state.config.bind_address.clone();
            let app = routes::router()
                .fallback(html::not_found::handler_query)
                .with_state(state);
            let listener = tokio::net::TcpListener::bind(&bind_address).await?;
            tracing::info!(%bind_address, "listening");
            axum::serve(listener, app).await?;
        }
        Command::Migrate => tracing::info!("database is up to date"),
        Command::Fields { .. } => (),
    }

    Ok(())
}
