//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the PostgreSQL implementation of the
//! store ports from the `core` crate. It handles all interactions with the database
//! using `sqlx`.

use async_trait::async_trait;
use barbershop_core::domain::{
    Appointment, AppointmentStatus, BookedService, CashMovement, CashRegisterSession, Client,
    Expense, MovementType, NewAppointment, NewClient, Notification, Service, ServiceDraft,
    SessionStatus, Staff, StaffCredentials, StaffRole,
};
use barbershop_core::ports::{
    AppointmentStore, CatalogStore, LedgerStore, NotificationStore, PortError, PortResult,
    StaffStore,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const UNDEFINED_TABLE: &str = "42P01";
/// SQLSTATE class 22: numeric overflow, invalid text representation, ...
const DATA_EXCEPTION_CLASS: &str = "22";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every store port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Loads the service snapshots of `appointments` and attaches them.
    async fn attach_services(&self, records: Vec<AppointmentRecord>) -> PortResult<Vec<Appointment>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let lines = sqlx::query_as::<_, BookedServiceRecord>(
            "SELECT cita_id, service_id, name, price, duration_minutes FROM cita_service WHERE cita_id = ANY($1) ORDER BY cita_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let mut by_appointment: HashMap<Uuid, Vec<BookedService>> = HashMap::new();
        for line in lines {
            by_appointment
                .entry(line.cita_id)
                .or_default()
                .push(line.to_domain());
        }
        records
            .into_iter()
            .map(|r| {
                let services = by_appointment.remove(&r.id).unwrap_or_default();
                r.to_domain(services)
            })
            .collect()
    }

    async fn load_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        let record = sqlx::query_as::<_, AppointmentRecord>(
            "SELECT id, client_id, user_id, scheduled_at, status, notes, created_at, updated_at FROM cita WHERE id = $1",
        )
        .bind(appointment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Appointment {} not found", appointment_id))
            }
            _ => map_db_error(e),
        })?;
        self.attach_services(vec![record])
            .await?
            .pop()
            .ok_or_else(|| PortError::NotFound(format!("Appointment {} not found", appointment_id)))
    }
}

/// Translates `sqlx` failures into the port taxonomy.
fn map_db_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(e.to_string()),
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => code_to_port_error(&code, db.message()),
            None => PortError::Unexpected(e.to_string()),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => PortError::Unavailable(e.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// Maps a PostgreSQL error code. Rejected values are the caller's fault, so they
/// come back as `Validation` and never look like an outage.
fn code_to_port_error(code: &str, message: &str) -> PortError {
    match code {
        UNIQUE_VIOLATION => PortError::Conflict(message.to_string()),
        UNDEFINED_TABLE => PortError::Unavailable(message.to_string()),
        CHECK_VIOLATION => PortError::validation("value", message),
        c if c.starts_with(DATA_EXCEPTION_CLASS) => PortError::validation("value", message),
        _ => PortError::Unexpected(message.to_string()),
    }
}

/// Narrows a count to the `INTEGER` columns it is stored in.
fn db_int<T: TryInto<i32>>(field: &str, value: T) -> PortResult<i32> {
    value
        .try_into()
        .map_err(|_| PortError::validation(field, "is too large"))
}

fn not_found_if_untouched(rows: u64, what: &str, id: Uuid) -> PortResult<()> {
    if rows == 0 {
        return Err(PortError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

fn minutes(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ServiceRecord {
    id: Uuid,
    name: String,
    price: Decimal,
    duration_minutes: i32,
    active: bool,
}
impl ServiceRecord {
    fn to_domain(self) -> Service {
        Service {
            id: self.id,
            name: self.name,
            price: self.price,
            duration_minutes: minutes(self.duration_minutes),
            active: self.active,
        }
    }
}

#[derive(FromRow)]
struct ClientRecord {
    id: Uuid,
    name: String,
    phone: String,
    email: Option<String>,
    notes: Option<String>,
    user_id: Option<Uuid>,
}
impl ClientRecord {
    fn to_domain(self) -> Client {
        Client {
            id: self.id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            notes: self.notes,
            staff_id: self.user_id,
        }
    }
}

#[derive(FromRow)]
struct AppointmentRecord {
    id: Uuid,
    client_id: Uuid,
    user_id: Option<Uuid>,
    scheduled_at: NaiveDateTime,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl AppointmentRecord {
    fn to_domain(self, services: Vec<BookedService>) -> PortResult<Appointment> {
        let status = self
            .status
            .parse::<AppointmentStatus>()
            .map_err(PortError::Unexpected)?;
        Ok(Appointment {
            id: self.id,
            client_id: self.client_id,
            services,
            staff_id: self.user_id,
            scheduled_at: self.scheduled_at,
            status,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BookedServiceRecord {
    cita_id: Uuid,
    service_id: Uuid,
    name: String,
    price: Decimal,
    duration_minutes: i32,
}
impl BookedServiceRecord {
    fn to_domain(self) -> BookedService {
        BookedService {
            service_id: self.service_id,
            name: self.name,
            price: self.price,
            duration_minutes: minutes(self.duration_minutes),
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    date: NaiveDate,
    opening_cash: Decimal,
    total_sales: Decimal,
    total_expenses: Decimal,
    closing_cash: Option<Decimal>,
    cash_variance: Option<Decimal>,
    is_open: bool,
    opened_by: Option<Uuid>,
    closed_by: Option<Uuid>,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}
impl SessionRecord {
    fn to_domain(self) -> CashRegisterSession {
        CashRegisterSession {
            id: self.id,
            date: self.date,
            opening_cash: self.opening_cash,
            total_sales: self.total_sales,
            total_expenses: self.total_expenses,
            closing_cash: self.closing_cash,
            cash_variance: self.cash_variance,
            status: if self.is_open {
                SessionStatus::Open
            } else {
                SessionStatus::Closed
            },
            opened_by: self.opened_by,
            closed_by: self.closed_by,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            notes: self.notes,
        }
    }
}

#[derive(FromRow)]
struct MovementRecord {
    id: Uuid,
    session_id: Uuid,
    kind: String,
    amount: Decimal,
    description: String,
    appointment_id: Option<Uuid>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl MovementRecord {
    fn to_domain(self) -> PortResult<CashMovement> {
        Ok(CashMovement {
            id: self.id,
            session_id: self.session_id,
            kind: self.kind.parse::<MovementType>().map_err(PortError::Unexpected)?,
            amount: self.amount,
            description: self.description,
            appointment_id: self.appointment_id,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ExpenseRecord {
    id: Uuid,
    session_id: Uuid,
    amount: Decimal,
    description: String,
    category: String,
    receipt_number: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl ExpenseRecord {
    fn to_domain(self) -> Expense {
        Expense {
            id: self.id,
            session_id: self.session_id,
            amount: self.amount,
            description: self.description,
            category: self.category,
            receipt_number: self.receipt_number,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct NotificationRecord {
    id: Uuid,
    kind: String,
    title: String,
    message: String,
    is_read: bool,
    urgent: bool,
    related_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl NotificationRecord {
    fn to_domain(self) -> Notification {
        Notification {
            id: self.id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            read: self.is_read,
            urgent: self.urgent,
            related_id: self.related_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct StaffRecord {
    id: Uuid,
    name: String,
    email: String,
    hashed_password: String,
    role: String,
}
impl StaffRecord {
    fn to_domain(self) -> PortResult<StaffCredentials> {
        Ok(StaffCredentials {
            staff: Staff {
                id: self.id,
                name: self.name,
                email: self.email,
                role: self.role.parse::<StaffRole>().map_err(PortError::Unexpected)?,
            },
            hashed_password: self.hashed_password,
        })
    }
}

const SESSION_COLUMNS: &str = "id, date, opening_cash, total_sales, total_expenses, closing_cash, cash_variance, is_open, opened_by, closed_by, opened_at, closed_at, notes";

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn list_services(&self, active_only: bool) -> PortResult<Vec<Service>> {
        let records = sqlx::query_as::<_, ServiceRecord>(
            "SELECT id, name, price, duration_minutes, active FROM service WHERE active OR NOT $1 ORDER BY name ASC",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_service(&self, service_id: Uuid) -> PortResult<Service> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            "SELECT id, name, price, duration_minutes, active FROM service WHERE id = $1",
        )
        .bind(service_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Service {} not found", service_id)),
            _ => map_db_error(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_service(&self, draft: ServiceDraft) -> PortResult<Service> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            "INSERT INTO service (id, name, price, duration_minutes, active) VALUES ($1, $2, $3, $4, $5) RETURNING id, name, price, duration_minutes, active",
        )
        .bind(Uuid::new_v4())
        .bind(&draft.name)
        .bind(draft.price)
        .bind(db_int("duration_minutes", draft.duration_minutes)?)
        .bind(draft.active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.to_domain())
    }

    async fn update_service(&self, service_id: Uuid, draft: ServiceDraft) -> PortResult<Service> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            "UPDATE service SET name = $1, price = $2, duration_minutes = $3, active = $4 WHERE id = $5 RETURNING id, name, price, duration_minutes, active",
        )
        .bind(&draft.name)
        .bind(draft.price)
        .bind(db_int("duration_minutes", draft.duration_minutes)?)
        .bind(draft.active)
        .bind(service_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Service {} not found", service_id)),
            _ => map_db_error(e),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_service(&self, service_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM service WHERE id = $1")
            .bind(service_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        not_found_if_untouched(result.rows_affected(), "Service", service_id)
    }

    async fn list_clients(&self) -> PortResult<Vec<Client>> {
        let records = sqlx::query_as::<_, ClientRecord>(
            "SELECT id, name, phone, email, notes, user_id FROM client ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_client_by_phone(&self, phone: &str) -> PortResult<Option<Client>> {
        let record = sqlx::query_as::<_, ClientRecord>(
            "SELECT id, name, phone, email, notes, user_id FROM client WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_client(&self, client: NewClient) -> PortResult<Client> {
        let record = sqlx::query_as::<_, ClientRecord>(
            "INSERT INTO client (id, name, phone, email, notes, user_id) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id, name, phone, email, notes, user_id",
        )
        .bind(Uuid::new_v4())
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.notes)
        .bind(client.staff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.to_domain())
    }

    async fn update_client(&self, client: Client) -> PortResult<Client> {
        let record = sqlx::query_as::<_, ClientRecord>(
            "UPDATE client SET name = $1, phone = $2, email = $3, notes = $4, user_id = $5 WHERE id = $6 RETURNING id, name, phone, email, notes, user_id",
        )
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.notes)
        .bind(client.staff_id)
        .bind(client.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Client {} not found", client.id)),
            _ => map_db_error(e),
        })?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `AppointmentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AppointmentStore for DbAdapter {
    async fn list_appointments_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        status: Option<AppointmentStatus>,
    ) -> PortResult<Vec<Appointment>> {
        let records = sqlx::query_as::<_, AppointmentRecord>(
            "SELECT id, client_id, user_id, scheduled_at, status, notes, created_at, updated_at FROM cita WHERE scheduled_at >= $1 AND scheduled_at <= $2 AND ($3::TEXT IS NULL OR status = $3) ORDER BY scheduled_at ASC",
        )
        .bind(from)
        .bind(to)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        self.attach_services(records).await
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        self.load_appointment(appointment_id).await
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> PortResult<Appointment> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO cita (id, client_id, user_id, scheduled_at, status, notes) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(appointment.client_id)
        .bind(appointment.staff_id)
        .bind(appointment.scheduled_at)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| match map_db_error(e) {
            PortError::Conflict(_) => PortError::Conflict(format!(
                "The slot {} is already booked",
                appointment.scheduled_at.format("%Y-%m-%d %H:%M")
            )),
            other => other,
        })?;

        for (position, service) in appointment.services.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cita_service (cita_id, position, service_id, name, price, duration_minutes) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(db_int("position", position)?)
            .bind(service.service_id)
            .bind(&service.name)
            .bind(service.price)
            .bind(db_int("duration_minutes", service.duration_minutes)?)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        self.load_appointment(id).await
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> PortResult<Appointment> {
        let result = sqlx::query("UPDATE cita SET status = $1, updated_at = now() WHERE id = $2")
            .bind(status.as_str())
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        not_found_if_untouched(result.rows_affected(), "Appointment", appointment_id)?;
        self.load_appointment(appointment_id).await
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        scheduled_at: NaiveDateTime,
    ) -> PortResult<Appointment> {
        let result = sqlx::query("UPDATE cita SET scheduled_at = $1, updated_at = now() WHERE id = $2")
            .bind(scheduled_at)
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        not_found_if_untouched(result.rows_affected(), "Appointment", appointment_id)?;
        self.load_appointment(appointment_id).await
    }

    async fn assign_staff(
        &self,
        appointment_id: Uuid,
        staff_id: Option<Uuid>,
    ) -> PortResult<Appointment> {
        let result = sqlx::query("UPDATE cita SET user_id = $1, updated_at = now() WHERE id = $2")
            .bind(staff_id)
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        not_found_if_untouched(result.rows_affected(), "Appointment", appointment_id)?;
        self.load_appointment(appointment_id).await
    }

    async fn expire_overdue(&self, cutoff: NaiveDateTime) -> PortResult<u64> {
        let result = sqlx::query(
            "UPDATE cita SET status = 'CANCELLED', updated_at = now() WHERE scheduled_at < $1 AND status IN ('PENDING', 'CONFIRMED')",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected())
    }
}

//=========================================================================================
// `LedgerStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl LedgerStore for DbAdapter {
    async fn find_session(&self, date: NaiveDate) -> PortResult<Option<CashRegisterSession>> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM cash_register WHERE date = $1",
            SESSION_COLUMNS
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert_session(&self, session: &CashRegisterSession) -> PortResult<()> {
        sqlx::query(&format!(
            "INSERT INTO cash_register ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            SESSION_COLUMNS
        ))
        .bind(session.id)
        .bind(session.date)
        .bind(session.opening_cash)
        .bind(session.total_sales)
        .bind(session.total_expenses)
        .bind(session.closing_cash)
        .bind(session.cash_variance)
        .bind(session.is_open())
        .bind(session.opened_by)
        .bind(session.closed_by)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .bind(&session.notes)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn update_session(&self, session: &CashRegisterSession) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE cash_register SET opening_cash = $1, total_sales = $2, total_expenses = $3, closing_cash = $4, cash_variance = $5, is_open = $6, opened_by = $7, closed_by = $8, opened_at = $9, closed_at = $10, notes = $11 WHERE id = $12",
        )
        .bind(session.opening_cash)
        .bind(session.total_sales)
        .bind(session.total_expenses)
        .bind(session.closing_cash)
        .bind(session.cash_variance)
        .bind(session.is_open())
        .bind(session.opened_by)
        .bind(session.closed_by)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .bind(&session.notes)
        .bind(session.id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        not_found_if_untouched(result.rows_affected(), "Cash register session", session.id)
    }

    async fn append_movement(&self, movement: &CashMovement) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO cash_movement (id, session_id, kind, amount, description, appointment_id, created_by, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(movement.id)
        .bind(movement.session_id)
        .bind(movement.kind.as_str())
        .bind(movement.amount)
        .bind(&movement.description)
        .bind(movement.appointment_id)
        .bind(movement.created_by)
        .bind(movement.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn list_movements(&self, session_id: Uuid) -> PortResult<Vec<CashMovement>> {
        let records = sqlx::query_as::<_, MovementRecord>(
            "SELECT id, session_id, kind, amount, description, appointment_id, created_by, created_at FROM cash_movement WHERE session_id = $1 ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn insert_expense(&self, expense: &Expense) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO expense (id, session_id, amount, description, category, receipt_number, created_by, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(expense.id)
        .bind(expense.session_id)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(&expense.receipt_number)
        .bind(expense.created_by)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn list_expenses(&self, session_id: Uuid) -> PortResult<Vec<Expense>> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            "SELECT id, session_id, amount, description, category, receipt_number, created_by, created_at FROM expense WHERE session_id = $1 ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

//=========================================================================================
// `NotificationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl NotificationStore for DbAdapter {
    async fn list_notifications(&self, unread_only: bool) -> PortResult<Vec<Notification>> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            "SELECT id, kind, title, message, is_read, urgent, related_id, created_at, updated_at FROM notification WHERE NOT is_read OR NOT $1 ORDER BY created_at DESC",
        )
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_notification(&self, notification: &Notification) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO notification (id, kind, title, message, is_read, urgent, related_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(notification.id)
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.urgent)
        .bind(notification.related_id)
        .bind(notification.created_at)
        .bind(notification.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn mark_read(&self, notification_id: Uuid) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE notification SET is_read = TRUE, updated_at = now() WHERE id = $1")
                .bind(notification_id)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;
        not_found_if_untouched(result.rows_affected(), "Notification", notification_id)
    }

    async fn mark_all_read(&self) -> PortResult<u64> {
        let result = sqlx::query(
            "UPDATE notification SET is_read = TRUE, updated_at = now() WHERE NOT is_read",
        )
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected())
    }
}

//=========================================================================================
// `StaffStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl StaffStore for DbAdapter {
    async fn create_staff(
        &self,
        name: &str,
        email: &str,
        role: StaffRole,
        hashed_password: &str,
    ) -> PortResult<Staff> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, name, email, hashed_password, role_id) VALUES ($1, $2, $3, $4, (SELECT id FROM role WHERE name = $5))",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(Staff {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
        })
    }

    async fn get_staff_by_email(&self, email: &str) -> PortResult<StaffCredentials> {
        let record = sqlx::query_as::<_, StaffRecord>(
            "SELECT u.id, u.name, u.email, u.hashed_password, r.name AS role FROM users u JOIN role r ON r.id = u.role_id WHERE u.email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Staff {} not found", email)),
            _ => map_db_error(e),
        })?;
        record.to_domain()
    }

    async fn get_staff(&self, staff_id: Uuid) -> PortResult<Staff> {
        let record = sqlx::query_as::<_, StaffRecord>(
            "SELECT u.id, u.name, u.email, u.hashed_password, r.name AS role FROM users u JOIN role r ON r.id = u.role_id WHERE u.id = $1",
        )
        .bind(staff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Staff {} not found", staff_id))
            }
            _ => map_db_error(e),
        })?;
        Ok(record.to_domain()?.staff)
    }

    async fn has_staff(&self) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        staff_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(staff_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let staff_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        staff_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }
}
