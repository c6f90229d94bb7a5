//! HTTP request metrics
//!
//! Implemented as a Tower Layer/Service so it wraps the whole router,
//! including requests rejected by inner middleware.

use axum::{body::Body, http::Request, response::Response};
use metrics::{counter, histogram};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};

#[derive(Clone)]
pub struct HttpMetricsLayer;

impl<S> Layer<S> for HttpMetricsLayer {
    type Service = HttpMetrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMetrics { inner }
    }
}

#[derive(Clone)]
pub struct HttpMetrics<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for HttpMetrics<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let method = request.method().to_string();
        let path = normalize_path(request.uri().path());
        let start = Instant::now();

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let response = inner.call(request).await?;

            let status = response.status().as_u16().to_string();
            counter!(
                "portcullis_http_requests_total",
                "method" => method.clone(),
                "path" => path.clone(),
                "status" => status
            )
            .increment(1);
            histogram!(
                "portcullis_http_request_duration_seconds",
                "method" => method,
                "path" => path
            )
            .record(start.elapsed().as_secs_f64());

            Ok(response)
        })
    }
}

/// Collapse numeric path segments (user and token ids) to `{id}`
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_with_ids() {
        assert_eq!(
            normalize_path("/api/v1/users/42/tokens/7"),
            "/api/v1/users/{id}/tokens/{id}"
        );
    }

    #[test]
    fn test_normalize_path_keeps_versions() {
        assert_eq!(normalize_path("/api/v1/user"), "/api/v1/user");
        assert_eq!(normalize_path("/"), "/");
    }
}
