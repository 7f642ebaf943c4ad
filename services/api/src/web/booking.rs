//! services/api/src/web/booking.rs
//!
//! The two public endpoints customers use: the slot list and the booking write.
//! A taken slot is answered with `409` and `{"error": "conflict"}` so the caller
//! can re-fetch the slots and let the customer choose again.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use barbershop_core::domain::Slot;
use barbershop_core::BookingRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::appointments::AppointmentResponse;
use crate::web::rest::{port_error, shop_now, HttpResult};
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct SlotResponse {
    /// `HH:MM`
    pub time: String,
    pub available: bool,
}

impl From<Slot> for SlotResponse {
    fn from(slot: Slot) -> Self {
        Self {
            time: slot.time,
            available: slot.available,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<SlotResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct BookingPayload {
    pub name: String,
    pub phone: String,
    pub service_id: Uuid,
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
    pub notes: Option<String>,
}

/// GET /slots - The bookable slots of a day and whether each is free
#[utoipa::path(
    get,
    path = "/slots",
    params(SlotsQuery),
    responses(
        (status = 200, description = "18 slots from 09:00 to 17:30", body = SlotsResponse),
        (status = 503, description = "Appointments could not be read", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn get_slots_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> HttpResult<Json<SlotsResponse>> {
    let slots = state
        .booking
        .slots()
        .slots_for(query.date)
        .await
        .map_err(port_error)?;
    Ok(Json(SlotsResponse {
        date: query.date,
        slots: slots.into_iter().map(Into::into).collect(),
    }))
}

/// POST /bookings - Book a slot
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = BookingPayload,
    responses(
        (status = 201, description = "Appointment confirmed", body = AppointmentResponse),
        (status = 400, description = "Invalid input", body = crate::web::rest::ErrorBody),
        (status = 409, description = "The slot is no longer available", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingPayload>,
) -> HttpResult<impl IntoResponse> {
    let request = BookingRequest {
        name: payload.name,
        phone: payload.phone,
        service_id: payload.service_id,
        date: payload.date,
        time: payload.time,
        notes: payload.notes,
    };
    let appointment = state
        .booking
        .book(request, shop_now())
        .await
        .map_err(|e| {
            info!("Booking rejected: {}", e);
            port_error(e)
        })?;
    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(appointment))))
}
