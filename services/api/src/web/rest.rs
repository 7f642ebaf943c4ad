//! services/api/src/web/rest.rs
//!
//! Contains the master definition for the OpenAPI specification and the error
//! body shared by every REST handler.

use axum::{http::StatusCode, Json};
use barbershop_core::ports::PortError;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::web::{appointments, auth, booking, catalog, ledger, notifications};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        booking::get_slots_handler,
        booking::create_booking_handler,
        catalog::list_services_handler,
        catalog::create_service_handler,
        catalog::update_service_handler,
        catalog::delete_service_handler,
        catalog::list_clients_handler,
        catalog::create_client_handler,
        appointments::list_appointments_handler,
        appointments::get_appointment_handler,
        appointments::change_status_handler,
        appointments::reschedule_handler,
        appointments::assign_staff_handler,
        appointments::expire_handler,
        ledger::get_register_handler,
        ledger::open_register_handler,
        ledger::close_register_handler,
        ledger::record_expense_handler,
        ledger::list_expenses_handler,
        ledger::record_sale_handler,
        ledger::list_movements_handler,
        ledger::todays_payments_handler,
        notifications::list_notifications_handler,
        notifications::mark_read_handler,
        notifications::mark_all_read_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
    ),
    components(
        schemas(
            ErrorBody,
            booking::SlotResponse,
            booking::SlotsResponse,
            booking::BookingPayload,
            catalog::ServiceResponse,
            catalog::ServicePayload,
            catalog::ClientResponse,
            catalog::ClientPayload,
            appointments::AppointmentResponse,
            appointments::BookedServiceResponse,
            appointments::StatusPayload,
            appointments::SchedulePayload,
            appointments::StaffPayload,
            appointments::ExpiredResponse,
            ledger::SessionResponse,
            ledger::MovementResponse,
            ledger::ExpenseResponse,
            ledger::OpenPayload,
            ledger::ClosePayload,
            ledger::ExpensePayload,
            ledger::SalePayload,
            ledger::PaymentResponse,
            ledger::PaymentsReportResponse,
            notifications::NotificationResponse,
            notifications::MarkedResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
        )
    ),
    tags(
        (name = "Barbershop API", description = "Booking, catalog, appointments and cash register endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payloads
//=========================================================================================

/// The body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// One of `validation`, `conflict`, `not_found`, `unauthorized`, `unavailable`, `internal`.
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

pub type HttpError = (StatusCode, Json<ErrorBody>);
pub type HttpResult<T> = Result<T, HttpError>;

/// `?date=YYYY-MM-DD`, defaulting to today in shop-local time.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

impl DateQuery {
    pub fn or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| shop_now().date())
    }
}

/// Appointment times are stored without a zone, in the shop's local time.
pub fn shop_now() -> NaiveDateTime {
    Local::now().naive_local()
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn body(status: StatusCode, kind: &str, message: String, field: Option<String>) -> HttpError {
    (
        status,
        Json(ErrorBody {
            error: kind.to_string(),
            message,
            field,
        }),
    )
}

/// Maps a port failure to its HTTP status and error body.
pub fn port_error(e: PortError) -> HttpError {
    match e {
        PortError::Validation { field, message } => {
            body(StatusCode::BAD_REQUEST, "validation", message, Some(field))
        }
        PortError::Conflict(message) => body(StatusCode::CONFLICT, "conflict", message, None),
        PortError::NotFound(message) => body(StatusCode::NOT_FOUND, "not_found", message, None),
        PortError::Unauthorized => body(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Authentication required".to_string(),
            None,
        ),
        PortError::Forbidden(message) => body(StatusCode::FORBIDDEN, "forbidden", message, None),
        PortError::Unavailable(detail) => {
            error!("Store unavailable: {}", detail);
            body(
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable",
                "The store is temporarily unavailable, please retry".to_string(),
                None,
            )
        }
        PortError::Unexpected(detail) => {
            error!("Unexpected store error: {}", detail);
            internal_error()
        }
    }
}

pub fn internal_error() -> HttpError {
    body(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal",
        "An unexpected error occurred".to_string(),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_the_field() {
        let (status, Json(body)) = port_error(PortError::validation("phone", "is malformed"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation");
        assert_eq!(body.field.as_deref(), Some("phone"));
    }

    #[test]
    fn store_details_are_not_leaked() {
        let (status, Json(body)) =
            port_error(PortError::Unexpected("relation \"cita\" exploded".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal");
        assert!(!body.message.contains("cita"));

        let (status, Json(body)) = port_error(PortError::Unavailable("pool timed out".into()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "unavailable");
    }

    #[test]
    fn forbidden_maps_to_403() {
        let (status, Json(body)) = port_error(PortError::Forbidden("admins only".into()));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "forbidden");
        assert_eq!(body.message, "admins only");
    }

    #[test]
    fn conflicts_map_to_409() {
        let (status, Json(body)) = port_error(PortError::Conflict("taken".into()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "conflict");
        assert!(body.field.is_none());
    }
}
