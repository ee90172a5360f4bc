use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// `/upload`'s failures all carry this one fixed-shape sentinel body,
/// regardless of which of the HTTP statuses below they land on.
#[derive(Serialize)]
struct UploadFailureBody {
    result: &'static str,
    file_uuid: &'static str,
}

const UPLOAD_FAILURE_BODY: UploadFailureBody = UploadFailureBody {
    result: "-1",
    file_uuid: "-1",
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("malformed or missing upload")]
    BadRequest(String),
    #[error("upload exceeds size cap")]
    PayloadTooLarge,
    #[error("mime type not allowed")]
    UnsupportedMediaType,
    #[error("store error: {0}")]
    Store(#[from] tgcdn_store::StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => error!(error = %self, "upload failed"),
            _ => warn!(error = %self, "upload rejected"),
        }

        (status, Json(UPLOAD_FAILURE_BODY)).into_response()
    }
}

/// `/content`'s failures report `{"detail": "<message>"}`, mirroring how
/// the rest of this stack reports API errors as a one-field JSON object
/// rather than a bare status.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("resource not found")]
    NotFound,
    #[error("resolver unavailable")]
    ServiceUnavailable,
    #[error("upstream connection error")]
    GatewayTimeout,
}

#[derive(Serialize)]
struct DetailBody {
    detail: String,
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        let status = match &self {
            ContentError::NotFound => StatusCode::NOT_FOUND,
            ContentError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ContentError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        };

        warn!(error = %self, "content request failed");

        (status, Json(DetailBody { detail: self.to_string() })).into_response()
    }
}
