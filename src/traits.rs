use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::SignedCookieJar;
use axum_typed_multipart::{TryFromMultipartWithState, TypedMultipart};

use crate::db::User;
use crate::error::AppError;
use crate::AppState;

/// Object that can be received as a request.
pub trait RequestBody {
    type Response;

    async fn request(self, state: AppState, user: Option<User>)
        -> Result<Self::Response, AppError>;

    /// Resolves the session, runs the request and attaches any cookie
    /// changes. Pages that need a login send anonymous users home.
    async fn respond(self, state: AppState, jar: SignedCookieJar) -> Result<Response, AppError>
    where
        Self: Sized,
        Self::Response: IntoResponse,
    {
        let (user, jar) = crate::cookies::process_cookies(&state, jar).await?;
        match self.request(state, user).await {
            Ok(response) => Ok((jar, response).into_response()),
            Err(AppError::NotLoggedIn) => Ok((jar, Redirect::to("/")).into_response()),
            Err(e) => Err(e),
        }
    }

    async fn as_handler_query(
        State(state): State<AppState>,
        jar: SignedCookieJar,
        Query(item): Query<Self>,
    ) -> Result<Response, AppError>
    where
        Self: Sized,
        Self::Response: IntoResponse,
    {
        item.respond(state, jar).await
    }

    async fn as_form_handler(
        State(state): State<AppState>,
        jar: SignedCookieJar,
        Form(item): Form<Self>,
    ) -> Result<Response, AppError>
    where
        Self: Sized,
        Self::Response: IntoResponse,
    {
        item.respond(state, jar).await
    }

    async fn as_multipart_form_handler(
        State(state): State<AppState>,
        jar: SignedCookieJar,
        TypedMultipart(item): TypedMultipart<Self>,
    ) -> Result<Response, AppError>
    where
        Self: TryFromMultipartWithState<AppState>,
        Self::Response: IntoResponse,
    {
        item.respond(state, jar).await
    }
}
