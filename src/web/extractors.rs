use crate::web::handlers::ApiFailure;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 验证的JSON提取器
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let RequestId(request_id) = RequestId::from_headers(req.headers());

        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|err| {
            ApiFailure::validation(ValidationError::JsonParse(err.body_text()), &request_id)
        })?;

        value.validate().map_err(|err| {
            ApiFailure::validation(ValidationError::Validation(err.to_string()), &request_id)
        })?;

        Ok(ValidatedJson(value))
    }
}

/// 验证trait
pub trait Validate {
    type Error: std::fmt::Display;

    fn validate(&self) -> Result<(), Self::Error>;
}

/// 验证错误类型
#[derive(Debug)]
pub enum ValidationError {
    JsonParse(String),
    Validation(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::JsonParse(msg) => write!(f, "JSON parse error: {}", msg),
            ValidationError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Validate for crate::web::handlers::PredictJsonRequest {
    type Error = String;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if self.image.trim().is_empty() {
            return Err("Image data cannot be empty".to_string());
        }

        Ok(())
    }
}

/// 请求ID提取器，优先使用 X-Request-ID 头
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        RequestId(request_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestId::from_headers(&parts.headers))
    }
}
