use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use quorum_core::{
    engine::{ApprovalEngine, EngineError},
    store_memory::MemoryStore,
    types::{ApprovalConfig, ApprovalSignal, StatusSnapshot},
};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ApprovalEngine>,
}

// API types
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Management payload returned when a workflow is started, mirroring the
/// status/signal endpoints for the new instance.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementPayload {
    pub id: Uuid,
    pub status_query_get_uri: String,
    pub send_signal_post_uri: String,
}

impl ManagementPayload {
    fn for_instance(id: Uuid) -> Self {
        Self {
            id,
            status_query_get_uri: format!("/api/approvals/{id}"),
            send_signal_post_uri: format!("/api/approvals/{id}/signals"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "quorum_server=info,quorum_core=info,tower_http=debug".into()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(ApprovalEngine::new(store));
    let app_state = AppState { engine };

    let app = create_router(app_state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{port}");
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/approvals", post(request_approval))
        .route("/api/approvals/:id", get(get_status))
        .route("/api/approvals/:id/signals", post(submit_signal))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

fn ok<T>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
}

fn fail<T>(err: &EngineError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match err {
        EngineError::InvalidConfig(_) | EngineError::InvalidSignal(_) => StatusCode::BAD_REQUEST,
        EngineError::UnknownInstance(_) => StatusCode::NOT_FOUND,
        EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }),
    )
}

fn bad_request<T>(message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }),
    )
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        success: true,
        data: Some("OK".to_string()),
        error: None,
    })
}

// Start a new approval workflow instance
async fn request_approval(
    State(state): State<AppState>,
    Json(config): Json<ApprovalConfig>,
) -> (StatusCode, Json<ApiResponse<ManagementPayload>>) {
    info!("Requesting a new approval workflow");
    match state.engine.start_new(config).await {
        Ok(id) => ok(ManagementPayload::for_instance(id)),
        Err(e) => {
            warn!("Failed to start approval workflow: {e}");
            fail(&e)
        }
    }
}

// Submit one approver's vote to a running instance
async fn submit_signal(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(signal): Json<ApprovalSignal>,
) -> (StatusCode, Json<ApiResponse<StatusSnapshot>>) {
    let Ok(instance_id) = Uuid::parse_str(&id) else {
        return bad_request("Invalid workflow instance id");
    };
    match state.engine.raise_signal(instance_id, signal).await {
        Ok(snapshot) => ok(snapshot),
        Err(e) => {
            warn!("Failed to submit signal for {instance_id}: {e}");
            fail(&e)
        }
    }
}

// Query an instance's status
async fn get_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<StatusSnapshot>>) {
    let Ok(instance_id) = Uuid::parse_str(&id) else {
        return bad_request("Invalid workflow instance id");
    };
    match state.engine.get_status(instance_id).await {
        Ok(snapshot) => ok(snapshot),
        Err(e) => fail(&e),
    }
}
