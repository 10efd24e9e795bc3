use actix_web::{
    error::{BlockingError, JsonPayloadError, PathError, QueryPayloadError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use thiserror::Error;

use crate::protocol::SimpleResponse;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
    #[error("DB error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("DB connection error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("blocking task failed")]
    Blocking(#[from] BlockingError),
}

impl ApiError {
    pub fn bad_request<S: ToString>(msg: S) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn unauthorized<S: ToString>(msg: S) -> Self {
        Self::Unauthorized(msg.to_string())
    }

    pub fn forbidden<S: ToString>(msg: S) -> Self {
        Self::Forbidden(msg.to_string())
    }

    pub fn not_found<S: ToString>(msg: S) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Message shown to the client. Server-side failures are reported generically.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(diesel::result::Error::NotFound) => "Record not found".to_string(),
            Self::Internal(_) | Self::Database(_) | Self::Pool(_) | Self::Blocking(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(diesel::result::Error::NotFound) => StatusCode::NOT_FOUND,
            Self::Internal(_) | Self::Database(_) | Self::Pool(_) | Self::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(SimpleResponse::err(self.public_message()))
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(format!("Invalid request body: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(format!("Invalid query string: {}", err)).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(format!("Invalid path: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = ApiError::forbidden("Not allowed to change this appointment");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.public_message(), "Not allowed to change this appointment");

        let err = ApiError::bad_request("This slot is already booked");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "This slot is already booked");
    }

    #[test]
    fn diesel_not_found_is_a_404() {
        let err = ApiError::from(diesel::result::Error::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Record not found");
    }

    #[test]
    fn server_failures_are_hidden() {
        let err = ApiError::from(diesel::result::Error::RollbackTransaction);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");

        let err = ApiError::Internal("pool missing from app data".to_string());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[actix_web::test]
    async fn error_response_uses_the_envelope() {
        let resp = ApiError::not_found("No such appointment").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "No such appointment");
    }
}
