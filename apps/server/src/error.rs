use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use coinhub_core::errors::Error as CoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::BadRequest(_) | CoreError::Validation(_) | CoreError::InvalidTimezone(_) => {
            StatusCode::BAD_REQUEST
        }
        CoreError::Unauthorized | CoreError::InvalidToken => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden | CoreError::TraderDisabled(_) => StatusCode::FORBIDDEN,
        CoreError::ExchangeNotFound(_) | CoreError::TraderNotFound(_) | CoreError::NotFound(_) => {
            StatusCode::NOT_FOUND
        }
        CoreError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        CoreError::Repository(_) | CoreError::InternalServerError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::Core(e) => (core_status(e), e.to_string()),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ApiError::Internal(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason.clone()),
        };
        if status.is_server_error() {
            tracing::error!("{}", msg);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
