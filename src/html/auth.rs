use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;

use crate::cookies::{sign_in, sign_out};
use crate::github::oauth;
use crate::{AppResult, AppState};

pub async fn login(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    (sign_out(jar), Redirect::to(&oauth::authorize_url(&state.config))).into_response()
}

pub async fn logout(jar: SignedCookieJar) -> Response {
    (sign_out(jar), Redirect::to("/")).into_response()
}

#[derive(serde::Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    next: Option<String>,
}

/// Completes the OAuth flow and signs the user in.
pub async fn github_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    let next = query
        .next
        .filter(|n| n.starts_with('/'))
        .unwrap_or_else(|| "/".to_string());

    if query.state.as_deref() != Some(state.config.github.app_state.as_str()) {
        tracing::error!("OAuth callback state does not match");
        return Ok((sign_out(jar), Redirect::to("/")).into_response());
    }
    let Some(code) = query.code else {
        tracing::error!("OAuth callback without a code");
        return Ok(Redirect::to(&next).into_response());
    };

    let token = match oauth::exchange_code(&state.http, &state.config, &code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("{}", e.message());
            return Ok(Redirect::to(&next).into_response());
        }
    };
    let github_user = oauth::fetch_user(&state.http, &token).await?;
    let user = state
        .upsert_github_user(github_user.id, &github_user.login, &token)
        .await?;

    Ok((sign_in(jar, user.id), Redirect::to(&next)).into_response())
}
