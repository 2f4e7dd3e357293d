use serde::Serialize;
use sqlx::{query, query_as};

use crate::AppState;

id_struct!(UserId, User);

/// Collaborator signed in through GitHub.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub github_id: i64,
    pub github_login: String,
    /// OAuth token used to open pull requests on the user's behalf.
    #[serde(skip)]
    pub access_token: String,
}

impl User {
    /// Returns the data shown in the page header.
    pub fn to_header_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "login": self.github_login,
        })
    }
}

impl AppState {
    pub async fn get_opt_user(&self, id: UserId) -> sqlx::Result<Option<User>> {
        query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_opt_user_from_github_id(&self, github_id: i64) -> sqlx::Result<Option<User>> {
        query_as("SELECT * FROM users WHERE github_id = $1")
            .bind(github_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_user(
        &self,
        github_id: i64,
        github_login: &str,
        access_token: &str,
    ) -> sqlx::Result<User> {
        query_as(
            "INSERT INTO users (github_id, github_login, access_token)
                VALUES ($1, $2, $3)
                RETURNING *",
        )
        .bind(github_id)
        .bind(github_login)
        .bind(access_token)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_user_login(
        &self,
        id: UserId,
        github_login: &str,
        access_token: &str,
    ) -> sqlx::Result<()> {
        query("UPDATE users SET github_login = $1, access_token = $2 WHERE id = $3")
            .bind(github_login)
            .bind(access_token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Creates the user on first login; afterwards refreshes the login name
    /// and access token.
    pub async fn upsert_github_user(
        &self,
        github_id: i64,
        github_login: &str,
        access_token: &str,
    ) -> sqlx::Result<User> {
        match self.get_opt_user_from_github_id(github_id).await? {
            Some(user) => {
                self.update_user_login(user.id, github_login, access_token)
                    .await?;
                tracing::info!(user = %user.id, github_login, "user logged in");
                Ok(User {
                    github_login: github_login.to_string(),
                    access_token: access_token.to_string(),
                    ..user
                })
            }
            None => {
                let user = self
                    .create_user(github_id, github_login, access_token)
                    .await?;
                tracing::info!(user = %user.id, github_login, "created user");
                Ok(user)
            }
        }
    }
}
