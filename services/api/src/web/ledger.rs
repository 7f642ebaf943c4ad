//! services/api/src/web/ledger.rs
//!
//! Cash register endpoints and the day's payments report. The ledger answers with
//! the same shapes whether it is backed by the database or by its in-memory
//! fallback.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use barbershop_core::domain::{
    CashMovement, CashRegisterSession, Expense, Payment, PaymentsReport,
};
use barbershop_core::payments::todays_payments;
use barbershop_core::{ExpenseInput, SaleInput};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, DateQuery, HttpResult};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    /// `OPEN` or `CLOSED`.
    pub status: String,
    pub opening_cash: Decimal,
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    /// `opening_cash + total_sales - total_expenses`
    pub current_cash: Decimal,
    pub closing_cash: Option<Decimal>,
    pub cash_variance: Option<Decimal>,
    pub opened_by: Option<Uuid>,
    pub closed_by: Option<Uuid>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<CashRegisterSession> for SessionResponse {
    fn from(s: CashRegisterSession) -> Self {
        Self {
            status: if s.is_open() { "OPEN" } else { "CLOSED" }.to_string(),
            current_cash: s.current_cash(),
            id: s.id,
            date: s.date,
            opening_cash: s.opening_cash,
            total_sales: s.total_sales,
            total_expenses: s.total_expenses,
            closing_cash: s.closing_cash,
            cash_variance: s.cash_variance,
            opened_by: s.opened_by,
            closed_by: s.closed_by,
            opened_at: s.opened_at,
            closed_at: s.closed_at,
            notes: s.notes,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    /// `SALE`, `EXPENSE`, `OPENING`, `CLOSING` or `ADJUSTMENT`.
    pub kind: String,
    /// Signed: expenses are negative.
    pub amount: Decimal,
    pub description: String,
    pub appointment_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<CashMovement> for MovementResponse {
    fn from(m: CashMovement) -> Self {
        Self {
            id: m.id,
            kind: m.kind.to_string(),
            amount: m.amount,
            description: m.description,
            appointment_id: m.appointment_id,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub receipt_number: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            amount: e.amount,
            description: e.description,
            category: e.category,
            receipt_number: e.receipt_number,
            created_by: e.created_by,
            created_at: e.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct OpenPayload {
    pub opening_cash: Decimal,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ClosePayload {
    pub closing_cash: Decimal,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ExpensePayload {
    pub concept: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub category: Option<String>,
    pub receipt_number: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SalePayload {
    pub amount: Decimal,
    pub appointment_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentResponse {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub services: Vec<String>,
    pub total_price: Decimal,
    pub total_duration_minutes: u32,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            appointment_id: p.appointment_id,
            client_id: p.client_id,
            scheduled_at: p.scheduled_at,
            services: p.services,
            total_price: p.total_price,
            total_duration_minutes: p.total_duration_minutes,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaymentsReportResponse {
    pub date: NaiveDate,
    pub payments: Vec<PaymentResponse>,
    pub total: Decimal,
}

impl From<PaymentsReport> for PaymentsReportResponse {
    fn from(r: PaymentsReport) -> Self {
        Self {
            date: r.date,
            payments: r.payments.into_iter().map(Into::into).collect(),
            total: r.total,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /cash-register - The session of the day, opened with zero cash on first view
#[utoipa::path(
    get,
    path = "/cash-register",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    responses((status = 200, description = "The session", body = SessionResponse))
)]
pub async fn get_register_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> HttpResult<Json<SessionResponse>> {
    let session = state
        .ledger
        .session_for(query.or_today())
        .await
        .map_err(port_error)?;
    Ok(Json(session.into()))
}

/// POST /cash-register/open - Set the opening cash of the day
#[utoipa::path(
    post,
    path = "/cash-register/open",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    request_body = OpenPayload,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 400, description = "Negative amount", body = crate::web::rest::ErrorBody),
        (status = 409, description = "The day is already closed", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn open_register_handler(
    State(state): State<Arc<AppState>>,
    Extension(staff_id): Extension<Uuid>,
    Query(query): Query<DateQuery>,
    Json(payload): Json<OpenPayload>,
) -> HttpResult<Json<SessionResponse>> {
    let session = state
        .ledger
        .open_session(
            query.or_today(),
            payload.opening_cash,
            payload.notes,
            Some(staff_id),
        )
        .await
        .map_err(port_error)?;
    Ok(Json(session.into()))
}

/// POST /cash-register/close - Close the day with the counted cash
#[utoipa::path(
    post,
    path = "/cash-register/close",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    request_body = ClosePayload,
    responses(
        (status = 200, description = "Session closed, variance recorded", body = SessionResponse),
        (status = 404, description = "No session for the day", body = crate::web::rest::ErrorBody),
        (status = 409, description = "Already closed", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn close_register_handler(
    State(state): State<Arc<AppState>>,
    Extension(staff_id): Extension<Uuid>,
    Query(query): Query<DateQuery>,
    Json(payload): Json<ClosePayload>,
) -> HttpResult<Json<SessionResponse>> {
    let session = state
        .ledger
        .close_session(
            query.or_today(),
            payload.closing_cash,
            payload.notes,
            Some(staff_id),
        )
        .await
        .map_err(port_error)?;
    Ok(Json(session.into()))
}

/// POST /cash-register/expenses - Pay a purchase from the till
#[utoipa::path(
    post,
    path = "/cash-register/expenses",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    request_body = ExpensePayload,
    responses(
        (status = 201, description = "Expense recorded", body = ExpenseResponse),
        (status = 400, description = "Invalid input or closed register", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn record_expense_handler(
    State(state): State<Arc<AppState>>,
    Extension(staff_id): Extension<Uuid>,
    Query(query): Query<DateQuery>,
    Json(payload): Json<ExpensePayload>,
) -> HttpResult<impl IntoResponse> {
    let input = ExpenseInput {
        concept: payload.concept,
        quantity: payload.quantity,
        unit_price: payload.unit_price,
        category: payload.category,
        receipt_number: payload.receipt_number,
    };
    let expense = state
        .ledger
        .record_expense(query.or_today(), input, Some(staff_id))
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(expense))))
}

/// GET /cash-register/expenses
#[utoipa::path(
    get,
    path = "/cash-register/expenses",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    responses((status = 200, description = "Expenses of the day, oldest first", body = [ExpenseResponse]))
)]
pub async fn list_expenses_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> HttpResult<Json<Vec<ExpenseResponse>>> {
    let expenses = state
        .ledger
        .expenses(query.or_today())
        .await
        .map_err(port_error)?;
    Ok(Json(expenses.into_iter().map(Into::into).collect()))
}

/// POST /cash-register/sales - Take a payment into the till
#[utoipa::path(
    post,
    path = "/cash-register/sales",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    request_body = SalePayload,
    responses(
        (status = 200, description = "Sale recorded", body = SessionResponse),
        (status = 400, description = "Invalid amount or closed register", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn record_sale_handler(
    State(state): State<Arc<AppState>>,
    Extension(staff_id): Extension<Uuid>,
    Query(query): Query<DateQuery>,
    Json(payload): Json<SalePayload>,
) -> HttpResult<Json<SessionResponse>> {
    let input = SaleInput {
        amount: payload.amount,
        appointment_id: payload.appointment_id,
        description: payload.description,
    };
    let session = state
        .ledger
        .record_sale(query.or_today(), input, Some(staff_id))
        .await
        .map_err(port_error)?;
    Ok(Json(session.into()))
}

/// GET /cash-register/movements
#[utoipa::path(
    get,
    path = "/cash-register/movements",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    responses((status = 200, description = "Movement log of the day, oldest first", body = [MovementResponse]))
)]
pub async fn list_movements_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> HttpResult<Json<Vec<MovementResponse>>> {
    let movements = state
        .ledger
        .movements(query.or_today())
        .await
        .map_err(port_error)?;
    Ok(Json(movements.into_iter().map(Into::into).collect()))
}

/// GET /payments/today - Attended appointments of the day and their total
#[utoipa::path(
    get,
    path = "/payments/today",
    params(("date" = Option<NaiveDate>, Query, description = "Defaults to today.")),
    responses((status = 200, description = "Payments report", body = PaymentsReportResponse))
)]
pub async fn todays_payments_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> HttpResult<Json<PaymentsReportResponse>> {
    let report = todays_payments(state.appointment_store.as_ref(), query.or_today())
        .await
        .map_err(port_error)?;
    Ok(Json(report.into()))
}
