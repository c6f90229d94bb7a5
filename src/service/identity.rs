//! Request identity resolution
//!
//! Resolves an incoming request to at most one user. Mechanisms are tried in
//! a fixed order and the first definitive answer wins:
//!
//! 1. API access token (`Authorization: token <sha>`, API paths only)
//! 2. Signed-in user id stored in the session
//! 3. Reverse-proxy header, then HTTP Basic credentials
//!
//! Every failure is expressed as "no identity". Unexpected lookup errors are
//! logged and counted, never returned to the caller.

use crate::config::AuthConfig;
use crate::crypto::decode_basic_credentials;
use crate::domain::{CreateUserInput, User};
use crate::error::AppError;
use crate::repository::{AccessTokenRepository, UserRepository};
use crate::session::Session;
use crate::state::Readiness;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// User id meaning "nobody is signed in"
pub const ANONYMOUS_ID: i64 = 0;

/// The parts of a request the resolver looks at
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a, B> From<&'a Request<B>> for RequestInfo<'a> {
    fn from(request: &'a Request<B>) -> Self {
        Self {
            path: request.uri().path(),
            headers: request.headers(),
        }
    }
}

impl<'a> From<&'a Parts> for RequestInfo<'a> {
    fn from(parts: &'a Parts) -> Self {
        Self {
            path: parts.uri.path(),
            headers: &parts.headers,
        }
    }
}

/// How the identity of a request was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    AccessToken,
    Session,
    ReverseProxy,
    Basic,
    #[default]
    Anonymous,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::AccessToken => "access_token",
            AuthMethod::Session => "session",
            AuthMethod::ReverseProxy => "reverse_proxy",
            AuthMethod::Basic => "basic",
            AuthMethod::Anonymous => "anonymous",
        }
    }
}

/// Outcome of resolving a request
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub user: Option<User>,
    /// Credentials were re-verified on this request (HTTP Basic)
    pub basic_auth: bool,
    pub method: AuthMethod,
}

impl Resolution {
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn signed_in(user: User, method: AuthMethod) -> Self {
        Self {
            user: Some(user),
            basic_auth: method == AuthMethod::Basic,
            method,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> i64 {
        self.user.as_ref().map(|u| u.id).unwrap_or(ANONYMOUS_ID)
    }
}

/// Return the credential of `Authorization: <scheme> <credential>`.
///
/// The header must split into exactly two whitespace-separated fields and the
/// scheme must match exactly.
fn authorization_credential<'h>(headers: &'h HeaderMap, scheme: &str) -> Option<&'h str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(found), Some(credential), None) if found == scheme => Some(credential),
        _ => None,
    }
}

fn lookup_failed(operation: &'static str, err: &AppError) {
    error!("{}: {}", operation, err);
    counter!("portcullis_auth_lookup_errors_total", "operation" => operation).increment(1);
}

pub struct IdentityResolver<U: UserRepository, T: AccessTokenRepository> {
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    config: AuthConfig,
    readiness: Readiness,
}

impl<U: UserRepository, T: AccessTokenRepository> IdentityResolver<U, T> {
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        config: AuthConfig,
        readiness: Readiness,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            config,
            readiness,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Id of the signed-in user, or `ANONYMOUS_ID`.
    pub async fn resolve_user_id(&self, request: RequestInfo<'_>, session: &Session) -> i64 {
        self.resolve_id(request, session).await.0
    }

    /// Full user plus whether Basic credentials were used.
    pub async fn resolve_user(&self, request: RequestInfo<'_>, session: &Session) -> Resolution {
        if !self.readiness.is_ready() {
            return Resolution::anonymous();
        }

        let resolution = self.resolve(request, session).await;
        counter!(
            "portcullis_auth_resolutions_total",
            "method" => resolution.method.as_str()
        )
        .increment(1);
        resolution
    }

    async fn resolve(&self, request: RequestInfo<'_>, session: &Session) -> Resolution {
        let (uid, method) = self.resolve_id(request, session).await;

        if uid > ANONYMOUS_ID {
            return match self.user_repo.find_by_id(uid).await {
                Ok(Some(user)) => Resolution::signed_in(user, method),
                Ok(None) => {
                    lookup_failed(
                        "find_user_by_id",
                        &AppError::NotFound(format!("User {} not found", uid)),
                    );
                    Resolution::anonymous()
                }
                Err(e) => {
                    lookup_failed("find_user_by_id", &e);
                    Resolution::anonymous()
                }
            };
        }

        if self.config.reverse_proxy_auth_enabled {
            let proxied = request
                .headers
                .get(self.config.reverse_proxy_auth_user.as_str())
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty());
            if let Some(name) = proxied {
                return self.reverse_proxy_user(name).await;
            }
        }

        self.basic_auth_user(request.headers)
            .await
            .unwrap_or_else(Resolution::anonymous)
    }

    async fn resolve_id(&self, request: RequestInfo<'_>, session: &Session) -> (i64, AuthMethod) {
        if !self.readiness.is_ready() {
            return (ANONYMOUS_ID, AuthMethod::Anonymous);
        }

        if request.path.starts_with(&self.config.api_path_prefix) {
            if let Some(sha) = authorization_credential(request.headers, "token") {
                return match self.token_repo.find_by_sha(sha).await {
                    Ok(Some(token)) => (token.uid, AuthMethod::AccessToken),
                    Ok(None) => (ANONYMOUS_ID, AuthMethod::Anonymous),
                    Err(e) => {
                        lookup_failed("find_access_token_by_sha", &e);
                        (ANONYMOUS_ID, AuthMethod::Anonymous)
                    }
                };
            }
        }

        (self.session_user_id(session).await, AuthMethod::Session)
    }

    async fn session_user_id(&self, session: &Session) -> i64 {
        let raw = match session.get(&self.config.session_user_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ANONYMOUS_ID,
            Err(e) => {
                lookup_failed("session_get", &e);
                return ANONYMOUS_ID;
            }
        };

        let id = match raw.parse::<i64>() {
            Ok(id) if id > ANONYMOUS_ID => id,
            _ => {
                debug!("Ignoring malformed session user id {:?}", raw);
                return ANONYMOUS_ID;
            }
        };

        match self.user_repo.find_by_id(id).await {
            Ok(Some(_)) => id,
            Ok(None) => ANONYMOUS_ID,
            Err(e) => {
                lookup_failed("find_user_by_id", &e);
                ANONYMOUS_ID
            }
        }
    }

    async fn reverse_proxy_user(&self, name: &str) -> Resolution {
        match self.user_repo.find_by_name(name).await {
            Ok(Some(user)) => Resolution::signed_in(user, AuthMethod::ReverseProxy),
            Ok(None) if self.config.reverse_proxy_auto_register => self.auto_register(name).await,
            Ok(None) => Resolution::anonymous(),
            Err(e) => {
                lookup_failed("find_user_by_name", &e);
                Resolution::anonymous()
            }
        }
    }

    async fn auto_register(&self, name: &str) -> Resolution {
        let input = CreateUserInput {
            name: name.to_string(),
            email: format!("{}@{}", Uuid::new_v4(), self.config.auto_register_email_domain),
            password: name.to_string(),
            is_active: true,
        };

        if let Err(e) = input.validate() {
            warn!("Refusing to auto-register reverse-proxy user {:?}: {}", name, e);
            counter!("portcullis_auth_auto_registrations_total", "result" => "invalid")
                .increment(1);
            return Resolution::anonymous();
        }

        match self.user_repo.create(&input).await {
            Ok(user) => {
                info!(user_id = user.id, "Auto-registered reverse-proxy user {}", user.name);
                counter!("portcullis_auth_auto_registrations_total", "result" => "created")
                    .increment(1);
                Resolution::signed_in(user, AuthMethod::ReverseProxy)
            }
            // Lost a race against a concurrent first login of the same user
            Err(AppError::Conflict(_)) => match self.user_repo.find_by_name(name).await {
                Ok(Some(user)) => {
                    counter!("portcullis_auth_auto_registrations_total", "result" => "raced")
                        .increment(1);
                    Resolution::signed_in(user, AuthMethod::ReverseProxy)
                }
                Ok(None) => {
                    error!("create_user: {:?} conflicts but cannot be found", name);
                    counter!("portcullis_auth_auto_registrations_total", "result" => "failed")
                        .increment(1);
                    Resolution::anonymous()
                }
                Err(e) => {
                    lookup_failed("find_user_by_name", &e);
                    Resolution::anonymous()
                }
            },
            Err(e) => {
                error!("create_user: {}", e);
                counter!("portcullis_auth_auto_registrations_total", "result" => "failed")
                    .increment(1);
                Resolution::anonymous()
            }
        }
    }

    async fn basic_auth_user(&self, headers: &HeaderMap) -> Option<Resolution> {
        let encoded = authorization_credential(headers, "Basic")?;

        let (username, password) = match decode_basic_credentials(encoded) {
            Ok(credentials) => credentials,
            Err(e) => {
                debug!("Ignoring undecodable Basic credentials: {}", e);
                return None;
            }
        };

        match self.user_repo.find_by_name(&username).await {
            Ok(Some(user)) if user.validate_password(&password) => {
                Some(Resolution::signed_in(user, AuthMethod::Basic))
            }
            Ok(Some(_)) => {
                debug!("Basic auth password mismatch for {:?}", username);
                None
            }
            Ok(None) => None,
            Err(e) => {
                lookup_failed("find_user_by_name", &e);
                None
            }
        }
    }
}
