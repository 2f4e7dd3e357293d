use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::SignedCookieJar;

use crate::{error::AppError, AppState};

/// Fallback route handler that returns a 404 error.
#[axum::debug_handler(state = AppState)]
pub async fn handler_query(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let (user, jar) = crate::cookies::process_cookies(&state, jar).await?;
    Ok((
        StatusCode::NOT_FOUND,
        jar,
        crate::render_html_template("404.html", &user, serde_json::json!({})),
    )
        .into_response())
}
