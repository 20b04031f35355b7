use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::advice::AdviceError;
use crate::cycle::CycleError;
use crate::llm::LlmError;
use crate::models::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("OpenAI API error: {0}")]
    Upstream(LlmError),

    #[error("internal error")]
    Internal(CycleError),
}

impl From<AdviceError> for ApiError {
    fn from(e: AdviceError) -> Self {
        match e {
            AdviceError::Upstream(e) => ApiError::Upstream(e),
            AdviceError::Calculation(e) => ApiError::Internal(e),
        }
    }
}

impl From<CycleError> for ApiError {
    fn from(e: CycleError) -> Self {
        ApiError::Internal(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn log(&self) {
        match self {
            ApiError::Validation(e) => tracing::info!("⚠️ Rejected input: {}", e),
            ApiError::Upstream(e) => tracing::error!("❌ OpenAI call failed: {}", e),
            ApiError::Internal(e) => tracing::error!("❌ Cycle calculation defect: {}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}
