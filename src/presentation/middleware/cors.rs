//! CORS layer for the browser front-end

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsSettings;

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Origins from settings; `*` (or an empty list) allows any origin.
pub fn create_cors_layer(settings: &CorsSettings) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origin(&settings.allowed_origins))
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

fn allowed_origin(origins: &[String]) -> AllowOrigin {
    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return AllowOrigin::from(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    AllowOrigin::list(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn preflight(allowed: Vec<String>, origin: &str) -> Option<HeaderValue> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(create_cors_layer(&CorsSettings {
                allowed_origins: allowed,
            }));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn test_listed_origin_is_echoed() {
        let allow = preflight(
            vec!["http://localhost:3000".into()],
            "http://localhost:3000",
        )
        .await;
        assert_eq!(allow.as_ref().map(|v| v.as_bytes()), Some(&b"http://localhost:3000"[..]));
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_header() {
        let allow = preflight(vec!["http://localhost:3000".into()], "https://evil.example").await;
        assert!(allow.is_none());
    }

    #[tokio::test]
    async fn test_wildcard_allows_any_origin() {
        let allow = preflight(vec!["*".into()], "https://app.example").await;
        assert_eq!(allow.as_ref().map(|v| v.as_bytes()), Some(&b"*"[..]));
    }
}
