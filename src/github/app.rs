use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{api_request, check, GitHubRepo};
use crate::env::GitHubConfig;
use crate::{AppError, AppResult};

/// Lifetime of the app JWT, in seconds.
const APP_TOKEN_LIFETIME: i64 = 10 * 60;

#[derive(Serialize, Debug, PartialEq, Eq)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

fn app_claims(app_id: &str, now: i64) -> AppClaims {
    AppClaims {
        iat: now,
        exp: now + APP_TOKEN_LIFETIME,
        iss: app_id.to_string(),
    }
}

#[derive(Deserialize)]
struct Installation {
    id: i64,
}

#[derive(Deserialize)]
struct AccessToken {
    token: String,
}

/// Signs a JWT for the GitHub App and trades it for an installation token
/// with read/write access to the repository.
pub async fn installation_token(http: &reqwest::Client, config: &GitHubConfig) -> AppResult<String> {
    let pem = std::fs::read(&config.private_key)?;
    let claims = app_claims(&config.app_id, chrono::Utc::now().timestamp());
    let jwt = jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(&pem)?,
    )?;
    let bearer = format!("Bearer {jwt}");

    let endpoint = "/app/installations";
    let installations: Vec<Installation> =
        check(endpoint, api_request(http, Method::GET, endpoint, &bearer).send().await?)
            .await?
            .json()
            .await?;
    let installation = installations.first().ok_or_else(|| {
        AppError::GitHubError("Unable to retrieve GitHub installation ID".to_string())
    })?;

    let endpoint = format!("/app/installations/{}/access_tokens", installation.id);
    let token: AccessToken =
        check(&endpoint, api_request(http, Method::POST, &endpoint, &bearer).send().await?)
            .await?
            .json()
            .await?;
    Ok(token.token)
}

impl GitHubRepo {
    /// Connects to the configured repository as the GitHub App.
    pub async fn for_app(http: &reqwest::Client, config: &GitHubConfig) -> AppResult<Self> {
        let token = installation_token(http, config).await?;
        Ok(GitHubRepo::new(http.clone(), &config.repo, token))
    }
}
