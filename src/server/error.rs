use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    // seconds until the client can retry
    #[error("too many requests, retry in {0}s")]
    TooManyRequests(u64),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("unexpected error occurred")]
    InternalServerError,

    #[error("{0}")]
    InternalServerErrorWithContext(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected upstream payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) | Self::Http(_) | Self::Json(_) => StatusCode::BAD_GATEWAY,
            Self::InternalServerError
            | Self::InternalServerErrorWithContext(_)
            | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // never hand internal context back to the client, it ends up in the logs instead
        let message = if status.is_server_error() {
            error!("request failed ({}): {}", status, self);
            match status {
                StatusCode::BAD_GATEWAY => "upstream service failed".to_string(),
                _ => Self::InternalServerError.to_string(),
            }
        } else {
            self.to_string()
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if let Self::TooManyRequests(retry_after) = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
