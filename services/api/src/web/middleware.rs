//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting the staff routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use barbershop_core::ports::PortError;
use std::sync::Arc;
use tracing::warn;

use crate::web::rest::{port_error, HttpError};
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Reads the auth session id out of the `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session cookie and extracts the staff id.
///
/// If valid, inserts the staff id (`Uuid`) into request extensions for handlers to use.
/// If invalid or missing, returns 401 with an `unauthorized` error body.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let auth_session_id =
        session_cookie(req.headers()).ok_or_else(|| port_error(PortError::Unauthorized))?;

    let staff_id = state
        .staff
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            if e.is_store_failure() {
                warn!("Failed to validate auth session: {:?}", e);
                return port_error(e);
            }
            port_error(PortError::Unauthorized)
        })?;

    req.extensions_mut().insert(staff_id);
    Ok(next.run(req).await)
}
