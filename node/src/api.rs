//! HTTP API for LANDREG node

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use landreg_core::{PropertyRecord, RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::runtime::NodeRuntime;

/// API state containing node runtime
pub type ApiState = Arc<NodeRuntime>;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Create record request: the key plus the five record fields
#[derive(Deserialize)]
pub struct CreateRecordRequest {
    pub key: String,
    #[serde(flatten)]
    pub record: PropertyRecord,
}

/// Owner transfer request
#[derive(Deserialize)]
pub struct TransferRequest {
    pub new_owner: String,
}

/// Generic function invocation
#[derive(Deserialize)]
pub struct InvokeRequest {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Seed response
#[derive(Serialize)]
pub struct SeedResponse {
    pub seeded: usize,
}

/// Create response
#[derive(Serialize)]
pub struct CreateResponse {
    pub key: String,
}

/// HTTP status for a registry error
pub fn error_status(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::AlreadyExists(_) | RegistryError::MvccConflict { .. } => StatusCode::CONFLICT,
        RegistryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        RegistryError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(
    result: RegistryResult<T>,
    success: StatusCode,
) -> (StatusCode, Json<ApiResponse<T>>) {
    match result {
        Ok(data) => (success, Json(ApiResponse::ok(data))),
        Err(e) => {
            let status = error_status(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!("Request failed: {}", e);
            }
            (status, Json(ApiResponse::err(e)))
        }
    }
}

/// Create API router
pub fn create_router(state: ApiState) -> Router {
    let enable_cors = state.config().api.enable_cors;

    let router = Router::new()
        // Health
        .route("/health", get(health))
        .route("/status", get(status))
        // Records
        .route("/ledger/seed", post(seed_ledger))
        .route("/records", post(create_record).get(list_records))
        .route("/records/:key", get(read_record))
        .route("/records/:key/owner", put(transfer_owner))
        .route("/owners/:owner/records", get(query_by_owner))
        // Generic invocation
        .route("/invoke", post(invoke))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Node status
async fn status(State(runtime): State<ApiState>) -> impl IntoResponse {
    respond(runtime.status(), StatusCode::OK)
}

async fn seed_ledger(State(runtime): State<ApiState>) -> impl IntoResponse {
    let result = runtime
        .seed_ledger()
        .await
        .map(|seeded| SeedResponse { seeded });
    respond(result, StatusCode::CREATED)
}

async fn create_record(
    State(runtime): State<ApiState>,
    Json(req): Json<CreateRecordRequest>,
) -> impl IntoResponse {
    let result = runtime
        .create_record(&req.key, req.record)
        .await
        .map(|_| CreateResponse { key: req.key });
    respond(result, StatusCode::CREATED)
}

async fn list_records(State(runtime): State<ApiState>) -> impl IntoResponse {
    respond(runtime.list_all_records().await, StatusCode::OK)
}

async fn read_record(
    State(runtime): State<ApiState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    respond(runtime.read_record(&key).await, StatusCode::OK)
}

async fn transfer_owner(
    State(runtime): State<ApiState>,
    Path(key): Path<String>,
    Json(req): Json<TransferRequest>,
) -> impl IntoResponse {
    respond(
        runtime.transfer_owner(&key, &req.new_owner).await,
        StatusCode::OK,
    )
}

async fn query_by_owner(
    State(runtime): State<ApiState>,
    Path(owner): Path<String>,
) -> impl IntoResponse {
    respond(runtime.query_by_owner(&owner).await, StatusCode::OK)
}

async fn invoke(
    State(runtime): State<ApiState>,
    Json(req): Json<InvokeRequest>,
) -> impl IntoResponse {
    respond(
        runtime.invoke_function(&req.function, &req.args).await,
        StatusCode::OK,
    )
}

/// Start API server
pub async fn start_api_server(runtime: Arc<NodeRuntime>, listen_addr: &str) -> anyhow::Result<()> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listen_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
