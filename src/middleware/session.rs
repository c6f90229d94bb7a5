//! Session cookie middleware
//!
//! Binds a `Session` handle to every request. The id comes from the session
//! cookie, but only when the store still holds that session; requests
//! without a usable cookie get a fresh session, and the cookie is only
//! issued once that fresh session has been written to.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::SessionConfig;
use crate::session::Session;
use crate::state::HasIdentity;

/// Session ids are 32 lowercase hex characters
fn is_session_id(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Build the cookie carrying `session_id`
pub fn session_cookie(config: &SessionConfig, session_id: &str) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Build a cookie that clears the session cookie in the browser
pub fn expired_session_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .build()
}

pub async fn session_middleware<S: HasIdentity>(
    State(state): State<S>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config().session;
    let store = state.session_store();

    let session = match jar.get(&config.cookie_name).map(|c| c.value()) {
        Some(id) if is_session_id(id) => {
            let known = store.exists(id).await;
            match known {
                Ok(true) => Session::new(id, store),
                Ok(false) => {
                    tracing::debug!("Unknown session id, starting a fresh session");
                    Session::fresh(store)
                }
                Err(e) => {
                    tracing::warn!("Session lookup failed, starting a fresh session: {}", e);
                    Session::fresh(store)
                }
            }
        }
        Some(_) => {
            tracing::debug!("Discarding malformed session cookie");
            Session::fresh(store)
        }
        None => Session::fresh(store),
    };

    request.extensions_mut().insert(session.clone());
    let response = next.run(request).await;

    if session.needs_cookie() {
        let jar = CookieJar::new().add(session_cookie(config, session.id()));
        return (jar, response).into_response();
    }
    response
}
