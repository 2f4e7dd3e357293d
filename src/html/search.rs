use axum::Json;

use crate::db::User;
use crate::ontology::{OntologyStore, SearchHit};
use crate::{AppError, AppState, RequestBody};

/// Most suggestions returned to the typeahead.
const SEARCH_LIMIT: usize = 30;

#[derive(serde::Deserialize)]
pub struct SearchRequest {
    db: Option<String>,
    text: Option<String>,
}

impl RequestBody for SearchRequest {
    type Response = Json<Vec<SearchHit>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let db = self
            .db
            .ok_or_else(|| AppError::InvalidQuery("A db parameter is required".to_string()))?;
        let mut store = OntologyStore::open(&state.config.layout, &db).await?;
        let text = self.text.unwrap_or_default();
        Ok(Json(store.search(&text, SEARCH_LIMIT).await?))
    }
}
