//! services/api/src/web/appointments.rs
//!
//! Staff-side appointment endpoints: day listing, status changes, rescheduling and
//! the overdue sweep.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use barbershop_core::domain::{Appointment, AppointmentStatus, BookedService};
use barbershop_core::ports::PortError;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, shop_now, DateQuery, HttpResult};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct BookedServiceResponse {
    pub service_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
}

impl From<BookedService> for BookedServiceResponse {
    fn from(s: BookedService) -> Self {
        Self {
            service_id: s.service_id,
            name: s.name,
            price: s.price,
            duration_minutes: s.duration_minutes,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub scheduled_at: NaiveDateTime,
    /// `HH:MM`, as shown in the slot list.
    pub time: String,
    pub status: String,
    pub notes: Option<String>,
    pub total_price: Decimal,
    pub total_duration_minutes: u32,
    pub services: Vec<BookedServiceResponse>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        Self {
            total_price: a.total_price(),
            total_duration_minutes: a.total_duration_minutes(),
            id: a.id,
            client_id: a.client_id,
            staff_id: a.staff_id,
            time: a.scheduled_at.format("%H:%M").to_string(),
            scheduled_at: a.scheduled_at,
            status: a.status.to_string(),
            notes: a.notes,
            services: a.services.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct StatusPayload {
    /// `PENDING`, `CONFIRMED`, `CANCELLED` or `ATTENDED`.
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SchedulePayload {
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StaffPayload {
    pub staff_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct ExpiredResponse {
    pub expired: u64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /appointments - Every appointment of a day, by time
#[utoipa::path(
    get,
    path = "/appointments",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    responses(
        (status = 200, description = "Appointments of the day", body = [AppointmentResponse]),
        (status = 401, description = "Not logged in", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn list_appointments_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> HttpResult<Json<Vec<AppointmentResponse>>> {
    let mut appointments = state
        .appointments
        .list_for_date(query.or_today())
        .await
        .map_err(port_error)?;
    appointments.sort_by_key(|a| a.scheduled_at);
    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

/// GET /appointments/{id}
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment", body = AppointmentResponse),
        (status = 404, description = "Unknown appointment", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn get_appointment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<AppointmentResponse>> {
    let appointment = state.appointments.get(id).await.map_err(port_error)?;
    Ok(Json(appointment.into()))
}

/// PATCH /appointments/{id}/status - Move an appointment along its lifecycle
///
/// Marking an appointment ATTENDED credits its total to the day's cash register.
#[utoipa::path(
    patch,
    path = "/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = StatusPayload,
    responses(
        (status = 200, description = "Status changed", body = AppointmentResponse),
        (status = 400, description = "Unknown status or forbidden transition", body = crate::web::rest::ErrorBody),
        (status = 404, description = "Unknown appointment", body = crate::web::rest::ErrorBody),
        (status = 409, description = "The slot is already confirmed for someone else", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn change_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(staff_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> HttpResult<Json<AppointmentResponse>> {
    let next = payload
        .status
        .parse::<AppointmentStatus>()
        .map_err(|e| port_error(PortError::validation("status", e)))?;
    let appointment = state
        .appointments
        .change_status(id, next, Some(staff_id))
        .await
        .map_err(port_error)?;
    Ok(Json(appointment.into()))
}

/// PATCH /appointments/{id}/schedule - Move an appointment to another slot
#[utoipa::path(
    patch,
    path = "/appointments/{id}/schedule",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = SchedulePayload,
    responses(
        (status = 200, description = "Rescheduled", body = AppointmentResponse),
        (status = 400, description = "Invalid slot or closed appointment", body = crate::web::rest::ErrorBody),
        (status = 409, description = "Slot taken", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn reschedule_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SchedulePayload>,
) -> HttpResult<Json<AppointmentResponse>> {
    let appointment = state
        .appointments
        .reschedule(id, payload.date, &payload.time, shop_now())
        .await
        .map_err(port_error)?;
    Ok(Json(appointment.into()))
}

/// PATCH /appointments/{id}/staff - Assign (or clear) the barber
#[utoipa::path(
    patch,
    path = "/appointments/{id}/staff",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = StaffPayload,
    responses(
        (status = 200, description = "Assigned", body = AppointmentResponse),
        (status = 404, description = "Unknown appointment", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn assign_staff_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StaffPayload>,
) -> HttpResult<Json<AppointmentResponse>> {
    let appointment = state
        .appointments
        .assign_staff(id, payload.staff_id)
        .await
        .map_err(port_error)?;
    Ok(Json(appointment.into()))
}

/// POST /appointments/expire - Cancel open appointments of past days
#[utoipa::path(
    post,
    path = "/appointments/expire",
    responses(
        (status = 200, description = "Number of appointments cancelled", body = ExpiredResponse)
    )
)]
pub async fn expire_handler(State(state): State<Arc<AppState>>) -> HttpResult<impl IntoResponse> {
    let expired = state
        .appointments
        .expire_overdue(shop_now())
        .await
        .map_err(port_error)?;
    Ok(Json(ExpiredResponse { expired }))
}
