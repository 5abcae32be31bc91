//! Session cookie handling on top of [`mindwell_auth::SessionManager`].
//!
//! [`MaybeUser`] answers "who is signed in, if anyone"; [`RequireUser`]
//! rejects with [`AppError::Unauthenticated`], which redirects to the
//! sign-in page.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use mindwell_auth::SessionUser;
use tracing::info;

use crate::{
    error::{AppError, LOGIN_PATH},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "__session";
pub const HOME_PATH: &str = "/";

fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value())
}

/// The signed-in user, or `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(MaybeUser(state.sessions.current_user(session_token(&jar))))
    }
}

/// The signed-in user; anonymous requests are redirected to sign-in.
#[derive(Debug, Clone)]
pub struct RequireUser(pub SessionUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user = state.sessions.require_user(session_token(&jar))?;
        Ok(RequireUser(user))
    }
}

/// Sign a session for `user_id` / `email`, store it in the cookie and
/// redirect home.
pub fn create_session(
    state: &AppState,
    jar: CookieJar,
    user_id: &str,
    email: &str,
) -> Result<Response, AppError> {
    let token = state.sessions.issue(user_id, email)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies)
        .max_age(time::Duration::seconds(state.sessions.lifetime_secs()));

    info!(user_id = %user_id, "Session created");

    Ok((jar.add(cookie), Redirect::to(HOME_PATH)).into_response())
}

/// Clear the session cookie and redirect to sign-in.
pub fn destroy_session(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(LOGIN_PATH)).into_response()
}
