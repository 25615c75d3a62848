use crate::{
    inference::{InferencePipeline, InferenceResult},
    models::ModelStats,
    utils::error::BiomedError,
    web::{
        extractors::{RequestId, ValidatedJson, ValidationError},
        AppState,
    },
    Result,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct PredictJsonRequest {
    /// 模型名称，如 "Blood Cell"
    pub model: String,

    /// Base64编码的图像数据
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }

    pub fn error(code: String, message: String, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError { code, message }),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 带请求ID的失败响应
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
    request_id: String,
}

impl ApiFailure {
    pub fn new(err: BiomedError, request_id: &str) -> Self {
        Self {
            status: err.status_code(),
            code: err.error_code(),
            message: err.to_string(),
            request_id: request_id.to_string(),
        }
    }

    pub fn validation(err: ValidationError, request_id: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR",
            message: err.to_string(),
            request_id: request_id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                "Request failed: request_id={}, {} ({})",
                self.request_id,
                self.message,
                self.status
            );
        } else {
            tracing::warn!(
                "Request rejected: request_id={}, {} ({})",
                self.request_id,
                self.message,
                self.status
            );
        }

        let body = ApiResponse::<()>::error(self.code.to_string(), self.message, self.request_id);
        (self.status, Json(body)).into_response()
    }
}

type HandlerResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiFailure>;

/// 在阻塞线程池上执行推理
async fn run_blocking<T, F>(pipeline: &InferencePipeline, f: F) -> Result<T>
where
    F: FnOnce(&InferencePipeline) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pipeline = pipeline.clone();
    tokio::task::spawn_blocking(move || f(&pipeline))
        .await
        .map_err(|e| BiomedError::Internal(format!("Inference task failed: {}", e)))?
}

/// 请求体超过 `RequestBodyLimitLayer` 限制时 multer 报告 413
fn multipart_error(err: MultipartError, limit: usize, context: &str) -> BiomedError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        BiomedError::PayloadTooLarge(limit)
    } else {
        BiomedError::InvalidInput(format!("{}: {}", context, err.body_text()))
    }
}

/// JSON base64上传处理器
pub async fn predict_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<PredictJsonRequest>,
) -> HandlerResult<InferenceResult> {
    let start_time = Instant::now();

    tracing::info!(
        "Processing JSON predict request: request_id={}, model={}",
        request_id,
        request.model
    );

    let PredictJsonRequest { model, image } = request;
    let result = run_blocking(&state.pipeline, move |pipeline| {
        pipeline.infer_base64(&model, &image)
    })
    .await
    .map_err(|e| ApiFailure::new(e, &request_id))?;

    tracing::info!(
        "JSON predict completed: request_id={}, label={}, time={:.3}s",
        request_id,
        result.predicted_label,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

/// Multipart文件上传处理器
///
/// 字段 `model` 为模型名称，`file` 为图像；未提供 `file` 时不做推理，data 为 null。
pub async fn predict_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> HandlerResult<Option<InferenceResult>> {
    let start_time = Instant::now();

    tracing::info!("Processing multipart predict request: request_id={}", request_id);

    let result = predict_upload(&state, multipart)
        .await
        .map_err(|e| ApiFailure::new(e, &request_id))?;

    match &result {
        Some(result) => tracing::info!(
            "Upload predict completed: request_id={}, label={}, time={:.3}s",
            request_id,
            result.predicted_label,
            start_time.elapsed().as_secs_f32()
        ),
        None => tracing::info!("Upload predict idle: request_id={}, no file", request_id),
    }

    Ok(Json(ApiResponse::success(result, request_id)))
}

async fn predict_upload(state: &AppState, mut multipart: Multipart) -> Result<Option<InferenceResult>> {
    let limit = state.config.server_config.max_request_size;
    let mut model_name: Option<String> = None;
    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit, "Failed to read multipart field"))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "model" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, limit, "Failed to read model field"))?;
                model_name = Some(value.trim().to_string());
            }
            "file" => {
                // 浏览器未选择文件时会提交空文件名的空字段
                let has_file_name = field.file_name().is_some_and(|name| !name.is_empty());

                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
                        return Err(BiomedError::UnsupportedFormat(content_type.to_string()));
                    }
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, limit, "Failed to read file data"))?;

                if data.is_empty() && !has_file_name {
                    continue;
                }

                tracing::debug!("Received file: {} bytes", data.len());
                image_data = Some(data);
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let model_name = model_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BiomedError::InvalidInput("No model selected".to_string()))?;

    run_blocking(&state.pipeline, move |pipeline| {
        pipeline.infer_upload(&model_name, image_data.as_deref())
    })
    .await
}

/// 模型目录与可用状态
pub async fn models_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
) -> Json<ApiResponse<ModelStats>> {
    Json(ApiResponse::success(state.pipeline.registry().stats(), request_id))
}
