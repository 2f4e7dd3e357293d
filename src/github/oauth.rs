use reqwest::Method;
use serde::Deserialize;

use super::{api_request, check, GITHUB_OAUTH_URL};
use crate::env::Config;
use crate::{AppError, AppResult};

/// Where to send the browser to start signing in.
pub fn authorize_url(config: &Config) -> String {
    let callback = config.callback_url();
    let params = [
        ("client_id", config.github.client_id.as_str()),
        ("state", config.github.app_state.as_str()),
        ("redirect_uri", callback.as_str()),
    ];
    match url::Url::parse_with_params(&format!("{GITHUB_OAUTH_URL}/authorize"), params) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{GITHUB_OAUTH_URL}/authorize"),
    }
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    error_description: Option<String>,
}

/// Exchanges the temporary code from the callback for an access token.
pub async fn exchange_code(http: &reqwest::Client, config: &Config, code: &str) -> AppResult<String> {
    let callback = config.callback_url();
    let response = http
        .post(format!("{GITHUB_OAUTH_URL}/access_token"))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("client_id", config.github.client_id.as_str()),
            ("client_secret", config.github.client_secret.as_str()),
            ("code", code),
            ("state", config.github.app_state.as_str()),
            ("redirect_uri", callback.as_str()),
        ])
        .send()
        .await?;
    let body: TokenResponse = check("/login/oauth/access_token", response)
        .await?
        .json()
        .await?;
    bearer_token(body)
}

fn bearer_token(body: TokenResponse) -> AppResult<String> {
    let Some(token) = body.access_token else {
        let cause = body
            .error_description
            .unwrap_or_else(|| "no token returned".to_string());
        return Err(AppError::GitHubError(format!(
            "Could not retrieve access token: {cause}"
        )));
    };
    match body.token_type {
        Some(t) if t.eq_ignore_ascii_case("bearer") => Ok(token),
        Some(t) => Err(AppError::GitHubError(format!(
            "Unexpected token type retrieved: {t}"
        ))),
        None => Err(AppError::GitHubError("No token type returned".to_string())),
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
}

pub async fn fetch_user(http: &reqwest::Client, access_token: &str) -> AppResult<GitHubUser> {
    let endpoint = "/user";
    let response = api_request(http, Method::GET, endpoint, &format!("token {access_token}"))
        .send()
        .await?;
    Ok(check(endpoint, response).await?.json().await?)
}
