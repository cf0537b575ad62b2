//! Admin Basic-auth middleware (spec §6/§7). Grounded on kumomta's
//! `AuthKind::from_header` shape (split on the scheme, base64-decode,
//! split on `:`), simplified to compare directly against the two
//! environment-sourced credentials instead of dispatching through a Lua
//! policy callback.

use crate::config::ServerConfig;
use crate::errors::AppError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use data_encoding::BASE64;
use forensics_types::ApiError;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

fn check(config: &ServerConfig, request: &Request) -> Result<(), ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let (scheme, contents) = header.split_once(' ').ok_or(ApiError::Unauthorized)?;
    if scheme != "Basic" {
        return Err(ApiError::Unauthorized);
    }

    let decoded = BASE64
        .decode(contents.as_bytes())
        .map_err(|_| ApiError::Unauthorized)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
    let (user, password) = decoded.split_once(':').ok_or(ApiError::Unauthorized)?;

    let password_hash = hex::encode(Sha256::digest(password.as_bytes()));
    let user_matches = user == config.admin_username;
    let hash_matches = password_hash.as_bytes().len() == config.admin_password_hash.as_bytes().len()
        && password_hash
            .as_bytes()
            .ct_eq(config.admin_password_hash.as_bytes())
            .unwrap_u8()
            == 1;

    if user_matches && hash_matches {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    check(&state.config, &request)?;
    Ok(next.run(request).await)
}
