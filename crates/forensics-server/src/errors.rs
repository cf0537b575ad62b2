//! HTTP error shape (spec §7), grounded on kumomta's
//! `kumo_server_common::http_server::AppError`: a thin `anyhow::Error`
//! wrapper with a blanket `From` so handlers can use `?` freely. Extended
//! here to recover the §7 status-code taxonomy by downcasting back to
//! `ApiError` rather than always answering 500.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use forensics_types::ApiError;
use serde_json::json;

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0.downcast_ref::<ApiError>() {
            Some(api_err) => {
                let status =
                    StatusCode::from_u16(api_err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let mut response = (status, Json(json!({ "error": api_err.message() }))).into_response();
                if matches!(api_err, ApiError::Unauthorized) {
                    response.headers_mut().insert(
                        header::WWW_AUTHENTICATE,
                        HeaderValue::from_static("Basic realm=\"Admin Area\""),
                    );
                }
                response
            }
            None => {
                tracing::error!(error = %self.0, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": self.0.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
