//! API middleware components

pub mod auth;
pub mod logging;
pub mod metrics;

use axum::{body::Body, extract::MatchedPath, http::Request};

pub use auth::RequireCaller;
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;

/// Route template for the request, so labels stay low-cardinality.
/// Requests that matched no route are grouped under `unmatched`.
pub(crate) fn route_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_route() {
        let request = Request::builder()
            .uri("/random/123")
            .body(Body::empty())
            .unwrap();

        assert_eq!(route_path(&request), "unmatched");
    }
}
