use eyre::Result;

use crate::AppState;

impl AppState {
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}
