//! HTTP boundary for the tool dispatcher.
//!
//! `POST /api/cloudatlas/tools` runs a tool, `GET /api/cloudatlas/tools`
//! lists descriptors, and `GET /health` reports graph connectivity.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use cloudatlas_core::ServerSettings;
use cloudatlas_graph::QueryRunner;

use crate::dispatcher::{FailureKind, ToolDispatcher};
use crate::registry;

pub const TOOLS_PATH: &str = "/api/cloudatlas/tools";

/// Body of a tool call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub args: Option<Value>,
}

/// Build the router.
pub fn router<R>(dispatcher: ToolDispatcher<R>, settings: &ServerSettings) -> Router
where
    R: QueryRunner + ?Sized + 'static,
{
    // Browser access is limited to local front ends.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(is_local_origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(TOOLS_PATH, get(list_tools_handler).post(invoke_handler::<R>))
        .route("/health", get(health_handler::<R>))
        .with_state(dispatcher)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
}

fn is_local_origin(origin: &HeaderValue, _parts: &Parts) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    ["http://localhost", "http://127.0.0.1", "http://[::1]"]
        .iter()
        .any(|base| match origin.strip_prefix(base) {
            Some(rest) => rest.is_empty() || rest.starts_with(':'),
            None => false,
        })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn invoke_handler<R>(
    State(dispatcher): State<ToolDispatcher<R>>,
    body: Result<Json<ToolRequest>, JsonRejection>,
) -> Response
where
    R: QueryRunner + ?Sized + 'static,
{
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected tool request body");
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return error_response(status, rejection.body_text());
        }
    };

    match dispatcher.invoke(&request.tool_name, request.args).await {
        Ok(value) => Json(value).into_response(),
        Err(failure) => {
            let status = match failure.kind {
                FailureKind::Client => StatusCode::BAD_REQUEST,
                FailureKind::Server => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(failure)).into_response()
        }
    }
}

async fn list_tools_handler() -> impl IntoResponse {
    Json(registry::descriptors())
}

async fn health_handler<R>(State(dispatcher): State<ToolDispatcher<R>>) -> impl IntoResponse
where
    R: QueryRunner + ?Sized + 'static,
{
    let graph = match dispatcher.runner().check_connection().await {
        Ok(nodes) => json!({ "connected": true, "nodes": nodes }),
        Err(e) => json!({ "connected": false, "error": e.to_string() }),
    };
    let status = if graph["connected"] == true { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "server": "cloudatlas",
        "version": env!("CARGO_PKG_VERSION"),
        "graph": graph
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::tests::StubRunner;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(runner: StubRunner) -> Router {
        router(
            ToolDispatcher::new(Arc::new(runner)),
            &ServerSettings::default(),
        )
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(TOOLS_PATH)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invoke_returns_tool_result() {
        let response = app(StubRunner::with_rows(vec![json!({
            "name": "logs",
            "region": "us-east-1",
            "creationDate": null,
            "versioningStatus": "Enabled",
            "isPublic": true
        })]))
        .oneshot(post(r#"{"toolName": "find_public_s3_buckets"}"#))
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["riskLevel"], "CRITICAL");
        assert_eq!(body["data"][0]["name"], "logs");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_bad_request() {
        let response = app(StubRunner::with_rows(Vec::new()))
            .oneshot(post(r#"{"toolName": "does_not_exist", "args": {}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Unknown tool: does_not_exist"})
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app(StubRunner::with_rows(Vec::new()))
            .oneshot(post(r#"{"args": []}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_connection_failure_is_server_error() {
        let response = app(StubRunner::failing("connection refused"))
            .oneshot(post(
                r#"{"toolName": "get_cloud_graph_snapshot", "args": ["EC2Instance", 5]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Neo4j connection error: connection refused");
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = app(StubRunner::with_rows(Vec::new()))
            .oneshot(Request::builder().uri(TOOLS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 8);
        assert!(body[0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_health_reports_graph_status() {
        let response = app(StubRunner::with_rows(vec![json!({"cnt": 12})]))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["graph"]["nodes"], 12);

        let response = app(StubRunner::failing("refused"))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["graph"]["connected"], false);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let settings = ServerSettings {
            max_body_bytes: 64,
            ..ServerSettings::default()
        };
        let app = router(
            ToolDispatcher::new(Arc::new(StubRunner::with_rows(Vec::new()))),
            &settings,
        );
        let padding = "x".repeat(256);
        let response = app
            .oneshot(post(&format!(
                r#"{{"toolName": "list_s3_buckets", "args": "{padding}"}}"#
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_local_origins_only() {
        let parts = Request::builder().body(()).unwrap().into_parts().0;
        let check = |origin: &str| is_local_origin(&HeaderValue::from_str(origin).unwrap(), &parts);

        assert!(check("http://localhost:3000"));
        assert!(check("http://127.0.0.1:8080"));
        assert!(check("http://localhost"));
        assert!(!check("http://localhost.evil.com"));
        assert!(!check("https://example.com"));
    }
}
