//! crates/barbershop_core/src/memory.rs
//!
//! An in-process implementation of every store port. It enforces the same
//! uniqueness rules as the database schema, atomically under a single lock, and
//! backs the cash ledger fallback, the `memory` backend and the tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentStatus, AuthSession, CashMovement, CashRegisterSession, Client,
    Expense, NewAppointment, NewClient, Notification, Service, ServiceDraft, Staff,
    StaffCredentials, StaffRole,
};
use crate::ports::{
    AppointmentStore, CatalogStore, LedgerStore, NotificationStore, PortError, PortResult,
    StaffStore,
};

#[derive(Default)]
struct Tables {
    services: Vec<Service>,
    clients: Vec<Client>,
    appointments: Vec<Appointment>,
    sessions: HashMap<NaiveDate, CashRegisterSession>,
    movements: Vec<CashMovement>,
    expenses: Vec<Expense>,
    notifications: Vec<Notification>,
    staff: Vec<StaffCredentials>,
    auth_sessions: HashMap<String, AuthSession>,
}

impl Tables {
    fn confirmed_at(&self, at: NaiveDateTime, except: Option<Uuid>) -> bool {
        self.appointments.iter().any(|a| {
            a.status == AppointmentStatus::Confirmed
                && a.scheduled_at == at
                && Some(a.id) != except
        })
    }

    fn appointment_mut(&mut self, id: Uuid) -> PortResult<&mut Appointment> {
        self.appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Appointment {} not found", id)))
    }
}

/// All tables of the shop, held in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("memory store lock poisoned".to_string()))
    }

    /// Stores `session` as the one for its date. A different session previously
    /// held for that date is dropped together with its movements and expenses.
    pub fn upsert_session(&self, session: &CashRegisterSession) -> PortResult<()> {
        let mut tables = self.lock()?;
        if let Some(previous) = tables.sessions.insert(session.date, session.clone()) {
            if previous.id != session.id {
                tables.movements.retain(|m| m.session_id != previous.id);
                tables.expenses.retain(|e| e.session_id != previous.id);
            }
        }
        Ok(())
    }

    /// Overwrites the movements held for `session_id`.
    pub fn replace_movements(&self, session_id: Uuid, movements: &[CashMovement]) -> PortResult<()> {
        let mut tables = self.lock()?;
        tables.movements.retain(|m| m.session_id != session_id);
        tables.movements.extend_from_slice(movements);
        Ok(())
    }

    /// Overwrites the expenses held for `session_id`.
    pub fn replace_expenses(&self, session_id: Uuid, expenses: &[Expense]) -> PortResult<()> {
        let mut tables = self.lock()?;
        tables.expenses.retain(|e| e.session_id != session_id);
        tables.expenses.extend_from_slice(expenses);
        Ok(())
    }

    /// Appends without checking anything, used by the ledger mirror.
    pub fn push_movement(&self, movement: &CashMovement) -> PortResult<()> {
        self.lock()?.movements.push(movement.clone());
        Ok(())
    }

    pub fn push_expense(&self, expense: &Expense) -> PortResult<()> {
        self.lock()?.expenses.push(expense.clone());
        Ok(())
    }
}

//=========================================================================================
// `CatalogStore` Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_services(&self, active_only: bool) -> PortResult<Vec<Service>> {
        let tables = self.lock()?;
        let mut services: Vec<Service> = tables
            .services
            .iter()
            .filter(|s| !active_only || s.active)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn get_service(&self, service_id: Uuid) -> PortResult<Service> {
        self.lock()?
            .services
            .iter()
            .find(|s| s.id == service_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Service {} not found", service_id)))
    }

    async fn create_service(&self, draft: ServiceDraft) -> PortResult<Service> {
        let service = Service {
            id: Uuid::new_v4(),
            name: draft.name,
            price: draft.price,
            duration_minutes: draft.duration_minutes,
            active: draft.active,
        };
        self.lock()?.services.push(service.clone());
        Ok(service)
    }

    async fn update_service(&self, service_id: Uuid, draft: ServiceDraft) -> PortResult<Service> {
        let mut tables = self.lock()?;
        let service = tables
            .services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or_else(|| PortError::NotFound(format!("Service {} not found", service_id)))?;
        service.name = draft.name;
        service.price = draft.price;
        service.duration_minutes = draft.duration_minutes;
        service.active = draft.active;
        Ok(service.clone())
    }

    async fn delete_service(&self, service_id: Uuid) -> PortResult<()> {
        let mut tables = self.lock()?;
        let before = tables.services.len();
        tables.services.retain(|s| s.id != service_id);
        if tables.services.len() == before {
            return Err(PortError::NotFound(format!("Service {} not found", service_id)));
        }
        Ok(())
    }

    async fn list_clients(&self) -> PortResult<Vec<Client>> {
        let mut clients = self.lock()?.clients.clone();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    async fn find_client_by_phone(&self, phone: &str) -> PortResult<Option<Client>> {
        Ok(self
            .lock()?
            .clients
            .iter()
            .find(|c| c.phone == phone)
            .cloned())
    }

    async fn create_client(&self, client: NewClient) -> PortResult<Client> {
        let mut tables = self.lock()?;
        if tables.clients.iter().any(|c| c.phone == client.phone) {
            return Err(PortError::Conflict(format!(
                "A client with phone {} already exists",
                client.phone
            )));
        }
        let created = Client {
            id: Uuid::new_v4(),
            name: client.name,
            phone: client.phone,
            email: client.email,
            notes: client.notes,
            staff_id: client.staff_id,
        };
        tables.clients.push(created.clone());
        Ok(created)
    }

    async fn update_client(&self, client: Client) -> PortResult<Client> {
        let mut tables = self.lock()?;
        if tables
            .clients
            .iter()
            .any(|c| c.phone == client.phone && c.id != client.id)
        {
            return Err(PortError::Conflict(format!(
                "A client with phone {} already exists",
                client.phone
            )));
        }
        let existing = tables
            .clients
            .iter_mut()
            .find(|c| c.id == client.id)
            .ok_or_else(|| PortError::NotFound(format!("Client {} not found", client.id)))?;
        *existing = client.clone();
        Ok(client)
    }
}

//=========================================================================================
// `AppointmentStore` Implementation
//=========================================================================================

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn list_appointments_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        status: Option<AppointmentStatus>,
    ) -> PortResult<Vec<Appointment>> {
        let tables = self.lock()?;
        let mut found: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| a.scheduled_at >= from && a.scheduled_at <= to)
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.scheduled_at);
        Ok(found)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        self.lock()?
            .appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Appointment {} not found", appointment_id)))
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> PortResult<Appointment> {
        let mut tables = self.lock()?;
        if appointment.status == AppointmentStatus::Confirmed
            && tables.confirmed_at(appointment.scheduled_at, None)
        {
            return Err(PortError::Conflict(format!(
                "The slot {} is already booked",
                appointment.scheduled_at.format("%Y-%m-%d %H:%M")
            )));
        }
        let now = Utc::now();
        let created = Appointment {
            id: Uuid::new_v4(),
            client_id: appointment.client_id,
            services: appointment.services,
            staff_id: appointment.staff_id,
            scheduled_at: appointment.scheduled_at,
            status: appointment.status,
            notes: appointment.notes,
            created_at: now,
            updated_at: now,
        };
        tables.appointments.push(created.clone());
        Ok(created)
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> PortResult<Appointment> {
        let mut tables = self.lock()?;
        let scheduled_at = tables.appointment_mut(appointment_id)?.scheduled_at;
        if status == AppointmentStatus::Confirmed
            && tables.confirmed_at(scheduled_at, Some(appointment_id))
        {
            return Err(PortError::Conflict(format!(
                "The slot {} is already booked",
                scheduled_at.format("%Y-%m-%d %H:%M")
            )));
        }
        let appointment = tables.appointment_mut(appointment_id)?;
        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        scheduled_at: NaiveDateTime,
    ) -> PortResult<Appointment> {
        let mut tables = self.lock()?;
        let status = tables.appointment_mut(appointment_id)?.status;
        if status == AppointmentStatus::Confirmed
            && tables.confirmed_at(scheduled_at, Some(appointment_id))
        {
            return Err(PortError::Conflict(format!(
                "The slot {} is already booked",
                scheduled_at.format("%Y-%m-%d %H:%M")
            )));
        }
        let appointment = tables.appointment_mut(appointment_id)?;
        appointment.scheduled_at = scheduled_at;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn assign_staff(
        &self,
        appointment_id: Uuid,
        staff_id: Option<Uuid>,
    ) -> PortResult<Appointment> {
        let mut tables = self.lock()?;
        let appointment = tables.appointment_mut(appointment_id)?;
        appointment.staff_id = staff_id;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn expire_overdue(&self, cutoff: NaiveDateTime) -> PortResult<u64> {
        let mut tables = self.lock()?;
        let updated_at = Utc::now();
        let mut expired = 0;
        for appointment in tables.appointments.iter_mut().filter(|a| {
            a.scheduled_at < cutoff
                && matches!(
                    a.status,
                    AppointmentStatus::Pending | AppointmentStatus::Confirmed
                )
        }) {
            appointment.status = AppointmentStatus::Cancelled;
            appointment.updated_at = updated_at;
            expired += 1;
        }
        Ok(expired)
    }
}

//=========================================================================================
// `LedgerStore` Implementation
//=========================================================================================

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_session(&self, date: NaiveDate) -> PortResult<Option<CashRegisterSession>> {
        Ok(self.lock()?.sessions.get(&date).cloned())
    }

    async fn insert_session(&self, session: &CashRegisterSession) -> PortResult<()> {
        let mut tables = self.lock()?;
        if tables.sessions.contains_key(&session.date) {
            return Err(PortError::Conflict(format!(
                "A cash register session already exists for {}",
                session.date
            )));
        }
        tables.sessions.insert(session.date, session.clone());
        Ok(())
    }

    async fn update_session(&self, session: &CashRegisterSession) -> PortResult<()> {
        let mut tables = self.lock()?;
        match tables.sessions.get_mut(&session.date) {
            Some(existing) if existing.id == session.id => {
                *existing = session.clone();
                Ok(())
            }
            _ => Err(PortError::NotFound(format!(
                "Cash register session {} not found",
                session.id
            ))),
        }
    }

    async fn append_movement(&self, movement: &CashMovement) -> PortResult<()> {
        self.push_movement(movement)
    }

    async fn list_movements(&self, session_id: Uuid) -> PortResult<Vec<CashMovement>> {
        Ok(self
            .lock()?
            .movements
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert_expense(&self, expense: &Expense) -> PortResult<()> {
        self.push_expense(expense)
    }

    async fn list_expenses(&self, session_id: Uuid) -> PortResult<Vec<Expense>> {
        Ok(self
            .lock()?
            .expenses
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }
}

//=========================================================================================
// `NotificationStore` Implementation
//=========================================================================================

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn list_notifications(&self, unread_only: bool) -> PortResult<Vec<Notification>> {
        let tables = self.lock()?;
        let mut found: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn create_notification(&self, notification: &Notification) -> PortResult<()> {
        self.lock()?.notifications.push(notification.clone());
        Ok(())
    }

    async fn mark_read(&self, notification_id: Uuid) -> PortResult<()> {
        let mut tables = self.lock()?;
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Notification {} not found", notification_id))
            })?;
        notification.read = true;
        notification.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_all_read(&self) -> PortResult<u64> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let mut marked = 0;
        for notification in tables.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            notification.updated_at = now;
            marked += 1;
        }
        Ok(marked)
    }
}

//=========================================================================================
// `StaffStore` Implementation
//=========================================================================================

#[async_trait]
impl StaffStore for MemoryStore {
    async fn create_staff(
        &self,
        name: &str,
        email: &str,
        role: StaffRole,
        hashed_password: &str,
    ) -> PortResult<Staff> {
        let mut tables = self.lock()?;
        if tables.staff.iter().any(|s| s.staff.email == email) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let staff = Staff {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
        };
        tables.staff.push(StaffCredentials {
            staff: staff.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(staff)
    }

    async fn get_staff_by_email(&self, email: &str) -> PortResult<StaffCredentials> {
        self.lock()?
            .staff
            .iter()
            .find(|s| s.staff.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Staff {} not found", email)))
    }

    async fn get_staff(&self, staff_id: Uuid) -> PortResult<Staff> {
        self.lock()?
            .staff
            .iter()
            .find(|s| s.staff.id == staff_id)
            .map(|s| s.staff.clone())
            .ok_or_else(|| PortError::NotFound(format!("Staff {} not found", staff_id)))
    }

    async fn has_staff(&self) -> PortResult<bool> {
        Ok(!self.lock()?.staff.is_empty())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        staff_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.lock()?.auth_sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                staff_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.lock()?.auth_sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.staff_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.lock()?.auth_sessions.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookedService;
    use rust_decimal::Decimal;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn confirmed(scheduled_at: NaiveDateTime) -> NewAppointment {
        NewAppointment {
            client_id: Uuid::new_v4(),
            services: vec![BookedService {
                service_id: Uuid::new_v4(),
                name: "Corte".into(),
                price: Decimal::new(15, 0),
                duration_minutes: 30,
            }],
            staff_id: None,
            scheduled_at,
            status: AppointmentStatus::Confirmed,
            notes: None,
        }
    }

    #[tokio::test]
    async fn second_confirmed_booking_at_same_instant_conflicts() {
        let store = MemoryStore::new();
        store.create_appointment(confirmed(at(10, 0))).await.unwrap();
        let err = store.create_appointment(confirmed(at(10, 0))).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let mut pending = confirmed(at(10, 0));
        pending.status = AppointmentStatus::Pending;
        assert!(store.create_appointment(pending).await.is_ok());
    }

    #[tokio::test]
    async fn expire_cancels_only_open_overdue_appointments() {
        let store = MemoryStore::new();
        let past = store.create_appointment(confirmed(at(9, 0))).await.unwrap();
        let future = store.create_appointment(confirmed(at(17, 0))).await.unwrap();
        let mut attended = confirmed(at(9, 30));
        attended.status = AppointmentStatus::Attended;
        let attended = store.create_appointment(attended).await.unwrap();

        assert_eq!(store.expire_overdue(at(12, 0)).await.unwrap(), 1);
        assert_eq!(
            store.get_appointment(past.id).await.unwrap().status,
            AppointmentStatus::Cancelled
        );
        assert_eq!(
            store.get_appointment(future.id).await.unwrap().status,
            AppointmentStatus::Confirmed
        );
        assert_eq!(
            store.get_appointment(attended.id).await.unwrap().status,
            AppointmentStatus::Attended
        );
    }

    #[tokio::test]
    async fn client_phone_is_unique() {
        let store = MemoryStore::new();
        let client = NewClient {
            name: "Ana".into(),
            phone: "612345678".into(),
            ..Default::default()
        };
        store.create_client(client.clone()).await.unwrap();
        assert!(matches!(
            store.create_client(client).await,
            Err(PortError::Conflict(_))
        ));
        assert!(store.find_client_by_phone("612345678").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn one_session_per_date() {
        let store = MemoryStore::new();
        let date = at(0, 0).date();
        let first = CashRegisterSession::open(date, Decimal::ZERO, None);
        let second = CashRegisterSession::open(date, Decimal::ZERO, None);
        store.insert_session(&first).await.unwrap();
        assert!(matches!(
            store.insert_session(&second).await,
            Err(PortError::Conflict(_))
        ));
        assert_eq!(store.find_session(date).await.unwrap().unwrap().id, first.id);
    }
}
