use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::SignedCookieJar;

use crate::db::{User, UserId};
use crate::{AppResult, AppState};

const USER_COOKIE: &str = "user_id";

/// Looks up the signed-in user. A cookie naming a user that does not exist
/// is removed.
pub async fn process_cookies(
    state: &AppState,
    jar: SignedCookieJar,
) -> AppResult<(Option<User>, SignedCookieJar)> {
    let Some(cookie) = jar.get(USER_COOKIE) else {
        return Ok((None, jar));
    };
    let user = match cookie.value().parse::<UserId>() {
        Ok(id) => state.get_opt_user(id).await?,
        Err(_) => None,
    };
    match user {
        Some(user) => Ok((Some(user), jar)),
        None => {
            tracing::info!(cookie = cookie.value(), "no user for session cookie, signing out");
            Ok((None, sign_out(jar)))
        }
    }
}

pub fn sign_in(jar: SignedCookieJar, user: UserId) -> SignedCookieJar {
    jar.add(
        Cookie::build((USER_COOKIE, user.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

pub fn sign_out(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(USER_COOKIE).path("/"))
}
