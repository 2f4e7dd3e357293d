use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use handlebars::{handlebars_helper, Handlebars, TemplateError};
use serde_json::{Map, Value};

use crate::db::User;

lazy_static! {
    /// Page templates and partials, keyed by file name without `.hbs`.
    pub static ref HBS: Handlebars<'static> =
        page_templates().expect("error loading page templates");
}

handlebars_helper!(urlencode: |s: str| {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>()
});

/// Templates are read from disk on every render in debug builds.
fn page_templates() -> Result<Handlebars<'static>, TemplateError> {
    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(true);
    hbs.set_dev_mode(cfg!(debug_assertions));
    hbs.register_helper("urlencode", Box::new(urlencode));
    hbs.register_embed_templates_with_extension::<HtmlTemplates>(".hbs")?;
    Ok(hbs)
}

/// Adds the fields the shared partials read: the signed-in user and an
/// optional alert.
fn page_context(active_user: &Option<User>, data: Value) -> Value {
    let mut context = match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => Map::from_iter([("data".to_string(), other)]),
    };
    context.insert(
        "active_user".to_string(),
        active_user.as_ref().map_or(Value::Null, User::to_header_json),
    );
    context.entry("message").or_insert(Value::Null);
    Value::Object(context)
}

pub fn render_html_template(
    template_name: &str,
    active_user: &Option<User>,
    data: serde_json::Value,
) -> Response {
    match HBS.render(template_name, &page_context(active_user, data)) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            let error_msg = format!("template error: {e}");
            tracing::error!(template_name, "{error_msg}");
            let context = page_context(active_user, serde_json::json!({ "error_msg": error_msg }));
            let body = HBS
                .render("error.html", &context)
                .unwrap_or(error_msg);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
        }
    }
}

#[derive(rust_embed::RustEmbed, Copy, Clone)]
#[folder = "./html"]
#[include = "*.hbs"]
pub struct HtmlTemplates;

#[derive(rust_embed::RustEmbed, Copy, Clone)]
#[folder = "./js"]
#[include = "*.js"]
pub struct JsFiles;

#[derive(rust_embed::RustEmbed, Copy, Clone)]
#[folder = "./css"]
#[include = "*.css"]
pub struct CssFiles;
