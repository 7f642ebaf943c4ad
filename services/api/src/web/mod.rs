pub mod appointments;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod ledger;
pub mod middleware;
pub mod notifications;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use rest::ApiDoc;
use state::AppState;

pub use middleware::require_auth;

/// Builds the complete application: public routes, staff routes behind
/// `require_auth`, CORS for the configured origin and the Swagger UI.
pub fn router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = state.config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid CORS origin '{}': {}",
            state.config.cors_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/slots", get(booking::get_slots_handler))
        .route("/bookings", post(booking::create_booking_handler))
        .route("/services", get(catalog::list_services_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Staff routes (auth required)
    let protected_routes = Router::new()
        .route("/services", post(catalog::create_service_handler))
        .route(
            "/services/{id}",
            put(catalog::update_service_handler).delete(catalog::delete_service_handler),
        )
        .route(
            "/clients",
            get(catalog::list_clients_handler).post(catalog::create_client_handler),
        )
        .route("/appointments", get(appointments::list_appointments_handler))
        .route("/appointments/expire", post(appointments::expire_handler))
        .route("/appointments/{id}", get(appointments::get_appointment_handler))
        .route(
            "/appointments/{id}/status",
            patch(appointments::change_status_handler),
        )
        .route(
            "/appointments/{id}/schedule",
            patch(appointments::reschedule_handler),
        )
        .route(
            "/appointments/{id}/staff",
            patch(appointments::assign_staff_handler),
        )
        .route("/cash-register", get(ledger::get_register_handler))
        .route("/cash-register/open", post(ledger::open_register_handler))
        .route("/cash-register/close", post(ledger::close_register_handler))
        .route(
            "/cash-register/expenses",
            get(ledger::list_expenses_handler).post(ledger::record_expense_handler),
        )
        .route("/cash-register/sales", post(ledger::record_sale_handler))
        .route("/cash-register/movements", get(ledger::list_movements_handler))
        .route("/payments/today", get(ledger::todays_payments_handler))
        .route(
            "/notifications",
            get(notifications::list_notifications_handler),
        )
        .route(
            "/notifications/read-all",
            post(notifications::mark_all_read_handler),
        )
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_read_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
