//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for staff signup, login, and logout.
//!
//! The first account ever created bootstraps the shop and is always an admin. After
//! that, only a logged-in admin can create accounts.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use barbershop_core::domain::{Staff, StaffRole};
use barbershop_core::ports::PortError;
use barbershop_core::validation;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::{session_cookie, SESSION_COOKIE};
use crate::web::rest::{internal_error, port_error, HttpError, HttpResult};
use crate::web::state::AppState;

const SESSION_DAYS: i64 = 30;
const MIN_PASSWORD_LEN: usize = 8;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `admin` or `barber` (default).
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub staff_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<Staff> for AuthResponse {
    fn from(staff: Staff) -> Self {
        Self {
            staff_id: staff.id,
            name: staff.name,
            email: staff.email,
            role: staff.role.as_str().to_string(),
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn invalid_credentials() -> HttpError {
    let (status, Json(mut body)) = port_error(PortError::Unauthorized);
    body.message = "Invalid email or password".to_string();
    (status, Json(body))
}

/// Who may sign up: anyone while no account exists (`None`), an admin afterwards.
async fn authorize_signup(state: &AppState, headers: &HeaderMap) -> HttpResult<Option<Staff>> {
    if !state.staff.has_staff().await.map_err(port_error)? {
        return Ok(None);
    }
    let auth_session_id =
        session_cookie(headers).ok_or_else(|| port_error(PortError::Unauthorized))?;
    let staff_id = state
        .staff
        .validate_auth_session(auth_session_id)
        .await
        .map_err(port_error)?;
    let caller = state.staff.get_staff(staff_id).await.map_err(|e| match e {
        PortError::NotFound(_) => port_error(PortError::Unauthorized),
        other => port_error(other),
    })?;
    if caller.role != StaffRole::Admin {
        return Err(port_error(PortError::Forbidden(
            "Only an admin can create staff accounts".to_string(),
        )));
    }
    Ok(Some(caller))
}

/// Creates an auth session for `staff_id` and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, staff_id: Uuid) -> HttpResult<String> {
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);
    state
        .staff
        .create_auth_session(&auth_session_id, staff_id, expires_at)
        .await
        .map_err(port_error)?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        Duration::days(SESSION_DAYS).num_seconds()
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a staff account
///
/// Open only while the shop has no accounts; that first account is an admin and is
/// logged in. Afterwards an admin session is required and the caller stays logged in
/// as themselves.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = crate::web::rest::ErrorBody),
        (status = 401, description = "Accounts exist and no session was sent", body = crate::web::rest::ErrorBody),
        (status = 403, description = "The caller is not an admin", body = crate::web::rest::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SignupRequest>,
) -> HttpResult<Response> {
    // 1. Check who is asking
    let creator = authorize_signup(&state, &headers).await?;

    // 2. Validate the input
    let name = validation::required("name", &req.name).map_err(port_error)?;
    let email = validation::email(&req.email).map_err(port_error)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(port_error(PortError::validation(
            "password",
            format!("must have at least {} characters", MIN_PASSWORD_LEN),
        )));
    }
    let requested = match req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(role) => role
            .parse::<StaffRole>()
            .map_err(|e| port_error(PortError::validation("role", e)))?,
        None => StaffRole::Barber,
    };
    let role = match creator {
        Some(_) => requested,
        None => StaffRole::Admin,
    };

    // 3. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            internal_error()
        })?
        .to_string();

    // 4. Create the account
    let staff = state
        .staff
        .create_staff(&name, &email, role, &password_hash)
        .await
        .map_err(port_error)?;

    match creator {
        Some(admin) => {
            info!(
                "Admin {} created {} account {}",
                admin.id,
                staff.role.as_str(),
                staff.id
            );
            Ok((StatusCode::CREATED, Json(AuthResponse::from(staff))).into_response())
        }
        None => {
            // 5. Log the bootstrap account in
            info!("Created the first account {} as admin", staff.id);
            let cookie = start_session(&state, staff.id).await?;
            Ok((
                StatusCode::CREATED,
                [(header::SET_COOKIE, cookie)],
                Json(AuthResponse::from(staff)),
            )
                .into_response())
        }
    }
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HttpResult<impl IntoResponse> {
    // 1. Get the account by email
    let credentials = state
        .staff
        .get_staff_by_email(req.email.trim())
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => invalid_credentials(),
            other => port_error(other),
        })?;

    // 2. Verify the password
    let parsed_hash = PasswordHash::new(&credentials.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        internal_error()
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    // 3. Start the session
    let cookie = start_session(&state, credentials.staff.id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(credentials.staff)),
    ))
}

/// POST /auth/logout - Logout and invalidate the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<impl IntoResponse> {
    let auth_session_id =
        session_cookie(&headers).ok_or_else(|| port_error(PortError::Unauthorized))?;

    state
        .staff
        .delete_auth_session(auth_session_id)
        .await
        .map_err(port_error)?;

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}
