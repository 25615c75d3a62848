use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiomedError {
    #[error("Model artifact not found: {}", .0.display())]
    ModelArtifactMissing(PathBuf),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Unsupported format: {0}, expected JPEG or PNG")]
    UnsupportedFormat(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Request body exceeds limit of {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Input shape mismatch: model expects {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<i64>, actual: Vec<usize> },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for BiomedError {
    fn from(err: image::ImageError) -> Self {
        BiomedError::ImageDecode(err.to_string())
    }
}

impl BiomedError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BiomedError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            BiomedError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BiomedError::Base64(_) => StatusCode::BAD_REQUEST,
            BiomedError::Json(_) => StatusCode::BAD_REQUEST,
            BiomedError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            BiomedError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            BiomedError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            BiomedError::ModelArtifactMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            BiomedError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            BiomedError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            BiomedError::ModelArtifactMissing(_) => "MODEL_ARTIFACT_MISSING",
            BiomedError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            BiomedError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            BiomedError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            BiomedError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            BiomedError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            BiomedError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            BiomedError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            BiomedError::Inference(_) => "INFERENCE_ERROR",
            BiomedError::InvalidInput(_) => "INVALID_INPUT",
            BiomedError::Config(_) => "CONFIG_ERROR",
            BiomedError::Io(_) => "IO_ERROR",
            BiomedError::Json(_) => "JSON_ERROR",
            BiomedError::Base64(_) => "BASE64_DECODE_ERROR",
            BiomedError::Ort(_) => "ORT_ERROR",
            BiomedError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
