// src/error.rs

use actix_web::error::{JsonPayloadError, PathError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use portfolio_analytics::AnalyticsError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::{ErrorBody, ErrorDetail};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Analytics(err) => err.kind(),
            ServiceError::Validation(_) | ServiceError::BadRequest(_) => "InvalidRequest",
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        let (ticker, range) = match self {
            ServiceError::Analytics(err) => (err.ticker().map(str::to_string), err.range()),
            _ => (None, None),
        };
        ErrorDetail {
            kind: self.kind().to_string(),
            message: self.to_string(),
            status: self.status_code().as_u16(),
            ticker,
            start_date: range.map(|r| r.start),
            end_date: range.map(|r| r.end),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Analytics(err) => {
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ServiceError::Validation(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.detail() })
    }
}

// Malformed bodies, unknown operations and bad dates share the InvalidRequest shape
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::BadRequest(err.to_string()).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::BadRequest(err.to_string()).into()
}
