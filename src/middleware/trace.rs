//! TraceLayer span maker that keeps credentials out of request logs.

use axum::http::{HeaderMap, Request, Uri};
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Query parameters whose values are replaced in logs
const SENSITIVE_PARAMS: &[&str] = &["token", "access_token", "password", "retype", "sha"];

/// Span maker recording the method, the redacted URI and the credential
/// scheme of the request, never the credential itself.
#[derive(Clone, Debug)]
pub struct SanitizedMakeSpan;

impl<B> MakeSpan<B> for SanitizedMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %sanitize_uri(request.uri()),
            auth_scheme = auth_scheme(request.headers()),
            version = ?request.version(),
        )
    }
}

/// Scheme word of the Authorization header, `none` without one
fn auth_scheme(headers: &HeaderMap) -> &str {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().next())
        .unwrap_or("none")
}

/// `/user/login?uname=a&password=x` becomes `/user/login?uname=a&password=[REDACTED]`
fn sanitize_uri(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };

    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SENSITIVE_PARAMS.contains(&key.to_ascii_lowercase().as_str()) => {
                format!("{key}=[REDACTED]")
            }
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", uri.path(), pairs.join("&"))
}
