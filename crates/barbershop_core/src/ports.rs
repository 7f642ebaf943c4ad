//! crates/barbershop_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete store (PostgreSQL, in-memory).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentStatus, CashMovement, CashRegisterSession, Client, Expense,
    NewAppointment, NewClient, Notification, Service, ServiceDraft, Staff, StaffCredentials,
    StaffRole,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external stores (e.g., database, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness guard rejected the write (slot taken, session already exists, ...).
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },
    /// The store is unreachable or its schema is missing.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The caller is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Failures of the store itself, as opposed to rejections of the request.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Unexpected(_))
    }

    /// The store cannot be reached at all. Only this switches the ledger to memory.
    pub fn is_outage(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Services ---
    async fn list_services(&self, active_only: bool) -> PortResult<Vec<Service>>;

    async fn get_service(&self, service_id: Uuid) -> PortResult<Service>;

    async fn create_service(&self, draft: ServiceDraft) -> PortResult<Service>;

    async fn update_service(&self, service_id: Uuid, draft: ServiceDraft) -> PortResult<Service>;

    /// Services are the only entity that is ever hard-deleted.
    async fn delete_service(&self, service_id: Uuid) -> PortResult<()>;

    // --- Clients ---
    async fn list_clients(&self) -> PortResult<Vec<Client>>;

    async fn find_client_by_phone(&self, phone: &str) -> PortResult<Option<Client>>;

    /// Returns `Conflict` if a client with the same phone already exists.
    async fn create_client(&self, client: NewClient) -> PortResult<Client>;

    async fn update_client(&self, client: Client) -> PortResult<Client>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Appointments whose timestamp lies in `[from, to]` (both inclusive).
    async fn list_appointments_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        status: Option<AppointmentStatus>,
    ) -> PortResult<Vec<Appointment>>;

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment>;

    /// Returns `Conflict` if a CONFIRMED appointment already starts at the same instant
    /// and the new one would be CONFIRMED too.
    async fn create_appointment(&self, appointment: NewAppointment) -> PortResult<Appointment>;

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> PortResult<Appointment>;

    /// Same conflict guard as `create_appointment`.
    async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        scheduled_at: NaiveDateTime,
    ) -> PortResult<Appointment>;

    async fn assign_staff(
        &self,
        appointment_id: Uuid,
        staff_id: Option<Uuid>,
    ) -> PortResult<Appointment>;

    /// Cancels every PENDING or CONFIRMED appointment scheduled before `cutoff`.
    async fn expire_overdue(&self, cutoff: NaiveDateTime) -> PortResult<u64>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_session(&self, date: NaiveDate) -> PortResult<Option<CashRegisterSession>>;

    /// Returns `Conflict` if a session already exists for the same date.
    async fn insert_session(&self, session: &CashRegisterSession) -> PortResult<()>;

    async fn update_session(&self, session: &CashRegisterSession) -> PortResult<()>;

    async fn append_movement(&self, movement: &CashMovement) -> PortResult<()>;

    async fn list_movements(&self, session_id: Uuid) -> PortResult<Vec<CashMovement>>;

    async fn insert_expense(&self, expense: &Expense) -> PortResult<()>;

    async fn list_expenses(&self, session_id: Uuid) -> PortResult<Vec<Expense>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Newest first.
    async fn list_notifications(&self, unread_only: bool) -> PortResult<Vec<Notification>>;

    async fn create_notification(&self, notification: &Notification) -> PortResult<()>;

    async fn mark_read(&self, notification_id: Uuid) -> PortResult<()>;

    async fn mark_all_read(&self) -> PortResult<u64>;
}

#[async_trait]
pub trait StaffStore: Send + Sync {
    /// Returns `Conflict` if the email is already registered.
    async fn create_staff(
        &self,
        name: &str,
        email: &str,
        role: StaffRole,
        hashed_password: &str,
    ) -> PortResult<Staff>;

    async fn get_staff_by_email(&self, email: &str) -> PortResult<StaffCredentials>;

    async fn get_staff(&self, staff_id: Uuid) -> PortResult<Staff>;

    /// False until the first account is created.
    async fn has_staff(&self) -> PortResult<bool>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        staff_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the staff id owning a live session, `Unauthorized` otherwise.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
