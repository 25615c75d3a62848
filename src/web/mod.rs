pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{inference::InferencePipeline, models::ModelRegistry, utils::error::BiomedError, Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: InferencePipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: InferencePipeline) -> Self {
        Self { config, pipeline }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 初始化模型注册表（阻塞加载，只执行一次）
    let registry = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || ModelRegistry::shared(&config))
            .await
            .map_err(|e| BiomedError::Internal(format!("Model registry initialization panicked: {}", e)))?
    };

    for warning in registry.warnings() {
        tracing::warn!("[{}] {}: {}", warning.code, warning.model, warning.message);
    }

    let pipeline = InferencePipeline::new(registry)
        .with_max_image_size(config.server_config.max_image_size);
    let app = create_app(AppState::new(config.clone(), pipeline));

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        BiomedError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict        - JSON base64 upload");
    tracing::info!("  POST /predict/upload - Multipart file upload");
    tracing::info!("  GET  /               - Web UI");
    tracing::info!("  GET  /health         - Health check");
    tracing::info!("  GET  /api/models     - Model catalog");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BiomedError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| BiomedError::Internal(format!("Server failed: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        // 推理API路由
        .route("/predict", post(handlers::predict_json_handler))
        .route("/predict/upload", post(handlers::predict_upload_handler))
        .route("/api/models", get(handlers::models_handler))
        // Web UI路由
        .route("/", get(ui::index_handler))
        // 系统路由
        .route("/health", get(health_handler))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点；部分模型缺失时为 degraded
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let registry = state.pipeline.registry();
    let loaded = registry.available().len();
    let total = registry.descriptors().len();

    let status = if loaded == total { "healthy" } else { "degraded" };

    Json(json!({
        "status": status,
        "models_loaded": loaded,
        "models_total": total,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
