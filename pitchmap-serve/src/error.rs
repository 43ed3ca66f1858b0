use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pitchmap::geometry::{ransac::RansacError, session::SessionError, HomographyError};

/// Errors returned to HTTP clients as `{"success": false, "error": <message>}`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Homography(#[from] HomographyError),

    #[error(transparent)]
    Ransac(#[from] RansacError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Json(#[from] JsonRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(_) => StatusCode::CONFLICT,
            ApiError::Json(rejection) => rejection.status(),
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        log::warn!("request rejected ({status}): {self}");
        (
            status,
            Json(serde_json::json!({
                "success": false,
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}
