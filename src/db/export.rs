use sqlx::{query, query_scalar};

use super::UserId;
use crate::AppState;

impl AppState {
    /// Queues a term for export. Returns `false` if it was already queued.
    pub async fn add_export(&self, user: UserId, term_id: &str) -> sqlx::Result<bool> {
        let result = query(
            "INSERT INTO exports (user_id, term_id) VALUES ($1, $2)
                ON CONFLICT (user_id, term_id) DO NOTHING",
        )
        .bind(user)
        .bind(term_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn remove_export(&self, user: UserId, term_id: &str) -> sqlx::Result<()> {
        query("DELETE FROM exports WHERE user_id = $1 AND term_id = $2")
            .bind(user)
            .bind(term_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Empties the user's export list once their changes are submitted.
    pub async fn clear_exports(&self, user: UserId) -> sqlx::Result<()> {
        query("DELETE FROM exports WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_exports(&self, user: UserId) -> sqlx::Result<Vec<String>> {
        query_scalar("SELECT term_id FROM exports WHERE user_id = $1 ORDER BY term_id")
            .bind(user)
            .fetch_all(&self.pool)
            .await
    }
}
