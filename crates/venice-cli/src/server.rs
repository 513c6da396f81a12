use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};
use venice_contracts::tools::{ErrorClass, ToolError, ToolName};
use venice_engine::{ToolDispatcher, ToolOutput};

use crate::config::ServerConfig;
use crate::render::image_fragment;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<ToolDispatcher>,
}

#[derive(Debug, Deserialize)]
struct CallRequest {
    #[serde(alias = "name")]
    tool_name: String,
    #[serde(default, alias = "arguments")]
    parameters: Value,
}

pub fn router(dispatcher: Arc<ToolDispatcher>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mcp/tools/list", get(list_tools))
        .route("/mcp/tools/call", post(call_tool))
        .route("/approve/:image_id", get(approve_link).post(approve_link))
        .route(
            "/regenerate/:image_id",
            get(regenerate_link).post(regenerate_link),
        )
        .route("/debug/cache", get(debug_cache))
        .with_state(AppState { dispatcher })
}

pub async fn serve(config: &ServerConfig, dispatcher: Arc<ToolDispatcher>) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(
        addr = %addr,
        backend = %config.backend,
        tools_list = %config.tools_list_url(),
        tools_call = %config.tools_call_url(),
        "Venice image tool server listening"
    );

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failure")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"tools": state.dispatcher.list_tools()}))
}

async fn call_tool(
    State(state): State<AppState>,
    payload: Result<Json<CallRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => run_tool(state, request.tool_name, request.parameters).await,
        Err(rejection) => error_response(&ToolError::invalid("body", rejection.body_text())),
    }
}

async fn approve_link(State(state): State<AppState>, Path(image_id): Path<String>) -> Response {
    run_tool(
        state,
        ToolName::ApproveImage.as_str().to_string(),
        json!({"image_id": image_id}),
    )
    .await
}

async fn regenerate_link(State(state): State<AppState>, Path(image_id): Path<String>) -> Response {
    run_tool(
        state,
        ToolName::RegenerateImage.as_str().to_string(),
        json!({"image_id": image_id}),
    )
    .await
}

async fn debug_cache(State(state): State<AppState>) -> Response {
    match state.dispatcher.images().snapshot() {
        Ok(records) => {
            let mut cache = Map::new();
            for record in records {
                let id = record.id.clone();
                cache.insert(id, serde_json::to_value(record).unwrap_or(Value::Null));
            }
            Json(Value::Object(cache)).into_response()
        }
        Err(err) => error_response(&ToolError::Internal(format!("{err:#}"))),
    }
}

/// Runs the dispatcher on the blocking pool; backend calls block on HTTP.
async fn run_tool(state: AppState, tool_name: String, parameters: Value) -> Response {
    let dispatcher = Arc::clone(&state.dispatcher);
    let joined = tokio::task::spawn_blocking(move || {
        dispatcher
            .call_tool(&tool_name, &parameters)
            .and_then(output_body)
    })
    .await;
    match joined {
        Ok(Ok(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Err(err)) => error_response(&err),
        Err(err) => {
            error!(error = %err, "tool worker failed");
            error_response(&ToolError::Internal(format!("tool worker failed: {err}")))
        }
    }
}

fn output_body(output: ToolOutput) -> Result<Value, ToolError> {
    let html = match &output {
        ToolOutput::Image(image) => Some(image_fragment(image)),
        _ => None,
    };
    let mut body = serde_json::to_value(&output).map_err(ToolError::internal)?;
    if let (Some(html), Some(fields)) = (html, body.as_object_mut()) {
        fields.insert("html".to_string(), Value::String(html));
    }
    Ok(body)
}

fn status_for(err: &ToolError) -> StatusCode {
    match err.class() {
        ErrorClass::Client => StatusCode::BAD_REQUEST,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Server => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &ToolError) -> Response {
    let mut body = json!({
        "error": err.to_string(),
        "kind": err.kind(),
    });
    if let Some(field) = err.field() {
        body["field"] = Value::String(field.to_string());
    }
    (status_for(err), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use venice_contracts::images::InMemoryImageRegistry;
    use venice_contracts::models::ModelInfo;
    use venice_engine::{
        ActionLinks, BackendError, DryrunBackend, GenerateRequest, ImageBackend, ToolDispatcher,
    };

    use super::router;

    struct OfflineBackend;

    impl ImageBackend for OfflineBackend {
        fn name(&self) -> &str {
            "offline"
        }

        fn generate_image(&self, _request: &GenerateRequest) -> Result<String, BackendError> {
            Err(BackendError::MissingCredentials("VENICE_API_KEY not set".to_string()))
        }

        fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
            Err(BackendError::MissingCredentials("VENICE_API_KEY not set".to_string()))
        }
    }

    fn app_with(backend: Arc<dyn ImageBackend>) -> Router {
        let dispatcher = ToolDispatcher::new(
            backend,
            Arc::new(InMemoryImageRegistry::new()),
            ActionLinks::new("http://localhost:8000"),
        );
        router(Arc::new(dispatcher))
    }

    fn app() -> Router {
        app_with(Arc::new(DryrunBackend))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => request.body(Body::empty())?,
        };
        let response = app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    async fn call(app: &Router, tool: &str, parameters: Value) -> anyhow::Result<(StatusCode, Value)> {
        send(
            app,
            Method::POST,
            "/mcp/tools/call",
            Some(json!({"tool_name": tool, "parameters": parameters})),
        )
        .await
    }

    #[tokio::test]
    async fn health_reports_healthy() -> anyhow::Result<()> {
        let (status, body) = send(&app(), Method::GET, "/health", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy"}));
        Ok(())
    }

    #[tokio::test]
    async fn tools_list_names_all_tools() -> anyhow::Result<()> {
        let (status, body) = send(&app(), Method::GET, "/mcp/tools/list", None).await?;
        assert_eq!(status, StatusCode::OK);
        let names = body["tools"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row["name"].as_str().map(str::to_string))
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();
        for expected in [
            "generate_venice_image",
            "approve_image",
            "regenerate_image",
            "list_available_models",
        ] {
            assert!(names.iter().any(|name| name == expected), "missing {expected}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn generate_approve_regenerate_over_http() -> anyhow::Result<()> {
        let app = app();
        let (status, generated) =
            call(&app, "generate_venice_image", json!({"prompt": "a red cube"})).await?;
        assert_eq!(status, StatusCode::OK);
        let image_id = generated["image_id"].as_str().unwrap_or_default().to_string();
        assert!(!image_id.is_empty());
        for key in ["image_url", "thumbs_up_url", "thumbs_down_url", "html"] {
            assert!(
                generated[key].as_str().map(|value| !value.is_empty()).unwrap_or(false),
                "missing {key}"
            );
        }
        let html = generated["html"].as_str().unwrap_or_default();
        assert!(html.contains("venice-image-container"));
        assert!(html.contains("callRegenerateImage"));

        let (status, approved) = call(&app, "approve_image", json!({"image_id": image_id})).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["success"], json!(true));
        assert!(approved["message"].as_str().is_some());

        let (status, regenerated) =
            call(&app, "regenerate_image", json!({"image_id": image_id})).await?;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(regenerated["image_id"], json!(image_id));
        assert!(regenerated["html"].as_str().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn action_links_drive_the_same_tools() -> anyhow::Result<()> {
        let app = app();
        let (_, generated) = call(&app, "generate_venice_image", json!({"prompt": "kite"})).await?;
        let image_id = generated["image_id"].as_str().unwrap_or_default().to_string();

        let (status, approved) =
            send(&app, Method::POST, &format!("/approve/{image_id}"), None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["success"], json!(true));

        let (status, regenerated) =
            send(&app, Method::GET, &format!("/regenerate/{image_id}"), None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(regenerated["image_id"], json!(image_id));

        let (status, cache) = send(&app, Method::GET, "/debug/cache", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_object().map(|rows| rows.len()), Some(2));
        assert_eq!(cache[&image_id]["approved"], json!(true));
        Ok(())
    }

    #[tokio::test]
    async fn list_models_falls_back_when_backend_is_offline() -> anyhow::Result<()> {
        let app = app_with(Arc::new(OfflineBackend));
        let (status, body) = call(&app, "list_available_models", json!({})).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["degraded"], json!(true));
        assert_eq!(body["models"].as_array().map(Vec::len), Some(3));
        assert!(body["usage_hint"].as_str().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn offline_generation_returns_flagged_placeholder() -> anyhow::Result<()> {
        let app = app_with(Arc::new(OfflineBackend));
        let (status, body) = call(&app, "generate_venice_image", json!({"prompt": "storm"})).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["degraded"], json!(true));
        assert!(body["image_url"]
            .as_str()
            .map(|url| url.starts_with("https://placehold.co/"))
            .unwrap_or(false));
        Ok(())
    }

    #[tokio::test]
    async fn errors_map_to_status_classes() -> anyhow::Result<()> {
        let app = app();

        let (status, body) = call(&app, "generate_venice_image", json!({})).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], json!("ValidationError"));
        assert_eq!(body["field"], json!("prompt"));
        assert!(body["error"].as_str().is_some());

        let (status, body) = call(&app, "paint_fence", json!({})).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], json!("UnknownTool"));

        let (status, body) = call(&app, "approve_image", json!({"image_id": "missing"})).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], json!("NotFound"));

        let (status, _) = send(&app, Method::POST, "/regenerate/missing", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() -> anyhow::Result<()> {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/mcp/tools/call")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))?;
        let response = app.clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/mcp/tools/call",
            Some(json!({"parameters": {}})),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], json!("ValidationError"));
        Ok(())
    }

    #[tokio::test]
    async fn accepts_name_and_arguments_aliases() -> anyhow::Result<()> {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/mcp/tools/call",
            Some(json!({"name": "list_available_models", "arguments": {}})),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["degraded"], json!(false));
        Ok(())
    }
}
