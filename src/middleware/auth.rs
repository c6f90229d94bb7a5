//! Identity middleware and signed-in user extractors
//!
//! `identity_middleware` resolves the request identity once and stores the
//! `Resolution` in the request extensions. Handlers read it back through:
//! - `CurrentUser` for routes requiring a signed-in user (401 otherwise)
//! - `OptionalUser` for routes that also serve anonymous visitors

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::User;
use crate::service::{AuthMethod, RequestInfo, Resolution};
use crate::session::Session;
use crate::state::HasIdentity;

/// Resolve the identity of every request passing through
///
/// Must run inside `session_middleware`. Without a session only the
/// mechanisms that do not need one can succeed.
pub async fn identity_middleware<S: HasIdentity>(
    State(state): State<S>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let session = match request.extensions().get::<Session>() {
        Some(session) => session.clone(),
        None => {
            tracing::warn!("identity_middleware installed without session_middleware");
            Session::fresh(state.session_store())
        }
    };

    let resolution = state
        .identity_resolver()
        .resolve_user(RequestInfo::from(&request), &session)
        .await;

    if let Some(user) = &resolution.user {
        tracing::debug!(
            user_id = user.id,
            method = resolution.method.as_str(),
            "Request authenticated"
        );
    }

    request.extensions_mut().insert(resolution);
    next.run(request).await
}

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// The request carries no identity
    NotSignedIn,
    /// No resolution was recorded for the request
    Unresolved,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::NotSignedIn => "Sign in required",
            AuthError::Unresolved => {
                tracing::error!("CurrentUser extractor used without identity_middleware");
                "Sign in required"
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": "UNAUTHORIZED"
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// The signed-in user of the request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// Signed in with HTTP Basic credentials on this request
    pub basic_auth: bool,
    pub method: AuthMethod,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let resolution = parts
            .extensions
            .get::<Resolution>()
            .ok_or(AuthError::Unresolved)?;

        match &resolution.user {
            Some(user) => Ok(CurrentUser {
                user: user.clone(),
                basic_auth: resolution.basic_auth,
                method: resolution.method,
            }),
            None => Err(AuthError::NotSignedIn),
        }
    }
}

/// The signed-in user, if any
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<Resolution>()
            .and_then(|resolution| resolution.user.clone());
        Ok(OptionalUser(user))
    }
}
