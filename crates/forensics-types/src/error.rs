use serde::Serialize;

/// §7 error taxonomy. Carried as plain data here (no HTTP-layer
/// dependencies) so that every crate in the workspace can produce one;
/// `forensics-server` is the only crate that knows how to turn it into a
/// `Response`.
#[derive(Clone, Debug, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Forbidden(_) => 403,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(m) => m.clone(),
            ApiError::Unauthorized => "unauthorized".to_string(),
            ApiError::NotFound(m) => m.clone(),
            ApiError::Forbidden(m) => m.clone(),
            ApiError::Internal(m) => m.clone(),
        }
    }
}
