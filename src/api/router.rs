//! API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//! Middleware: body limit → audit logger → handler.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::endpoints::identify::MAX_IMAGE_BYTES;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::pipeline::PillIdentifier;

/// Base64 inflates by 4/3; leave headroom for the JSON envelope.
const MAX_BODY_BYTES: usize = MAX_IMAGE_BYTES / 3 * 4 + 64 * 1024;

pub fn api_router(identifier: Arc<PillIdentifier>) -> Router {
    build_router(ApiContext::new(identifier))
}

fn build_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/identify", post(endpoints::identify::identify))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new().nest("/api", routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use base64::Engine;
    use tower::ServiceExt;

    use crate::models::enums::ListKind;
    use crate::pipeline::classify::{MockClassifier, Prediction};
    use crate::pipeline::detail::MockDetailSource;
    use crate::pipeline::registry::MockRegistry;
    use crate::pipeline::PipelineSettings;

    fn test_identifier() -> Arc<PillIdentifier> {
        let registry = MockRegistry::new()
            .with_identifiers("씨코나졸정", &["201405281"])
            .with_identifiers("콜레스틴정20밀리그램", &["200201767"])
            .with_taboo("201405281", &["200201767"]);
        let settings = PipelineSettings {
            record_lists: vec![ListKind::Elderly],
            ..PipelineSettings::default()
        };
        Arc::new(PillIdentifier::new(
            Box::new(MockClassifier::new(vec![
                Prediction::new("씨코나졸정", 0.91),
                Prediction::new("콜레스틴정20mg", 0.77),
            ])),
            Box::new(registry),
            Box::new(MockDetailSource::new()),
            settings,
        ))
    }

    fn identify_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/identify")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = api_router(test_identifier());
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn identify_without_image_returns_empty_result() {
        let app = api_router(test_identifier());
        let response = app
            .oneshot(identify_request(serde_json::json!({ "image": null })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["pills"], serde_json::json!({}));
        assert_eq!(json["taboo"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn identify_with_image_returns_pills_and_taboo() {
        let app = api_router(test_identifier());
        let image = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0])
        );
        let response = app
            .oneshot(identify_request(serde_json::json!({ "image": image })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["pills"]["201405281"]["약이름"], "씨코나졸정");
        assert_eq!(json["pills"]["200201767"]["약이름"], "콜레스틴정20밀리그램");
        assert_eq!(
            json["taboo"],
            serde_json::json!([["씨코나졸정", "콜레스틴정20밀리그램"]])
        );
        assert!(json["report"]
            .as_str()
            .unwrap()
            .contains("씨코나졸정 - 콜레스틴정20밀리그램"));
    }

    #[tokio::test]
    async fn identify_rejects_invalid_base64() {
        let app = api_router(test_identifier());
        let response = app
            .oneshot(identify_request(serde_json::json!({ "image": "%%%not base64" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = api_router(test_identifier());
        let req = Request::builder()
            .uri("/api/unknown")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
