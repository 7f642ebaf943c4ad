//! crates/barbershop_core/src/appointments.rs
//!
//! Staff-side appointment lifecycle. Status changes follow
//! `AppointmentStatus::can_transition_to`; attending an appointment credits its
//! total to the cash ledger of the appointment's day.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::booking::validate_slot;
use crate::domain::{Appointment, AppointmentStatus};
use crate::ledger::{CashLedger, SaleInput};
use crate::ports::{AppointmentStore, PortError, PortResult};
use crate::slots::day_bounds;

#[derive(Clone)]
pub struct AppointmentService {
    store: Arc<dyn AppointmentStore>,
    ledger: Arc<CashLedger>,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn AppointmentStore>, ledger: Arc<CashLedger>) -> Self {
        Self { store, ledger }
    }

    /// Every appointment of `date`, whatever its status, by time.
    pub async fn list_for_date(&self, date: NaiveDate) -> PortResult<Vec<Appointment>> {
        let (from, to) = day_bounds(date);
        self.store.list_appointments_between(from, to, None).await
    }

    pub async fn get(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        self.store.get_appointment(appointment_id).await
    }

    pub async fn change_status(
        &self,
        appointment_id: Uuid,
        next: AppointmentStatus,
        staff_id: Option<Uuid>,
    ) -> PortResult<Appointment> {
        let current = self.store.get_appointment(appointment_id).await?;
        if current.status == next {
            return Ok(current);
        }
        if !current.status.can_transition_to(next) {
            return Err(PortError::validation(
                "status",
                format!("cannot change from {} to {}", current.status, next),
            ));
        }

        let updated = self
            .store
            .update_appointment_status(appointment_id, next)
            .await?;
        info!(
            "Appointment {} moved from {} to {}",
            appointment_id, current.status, next
        );

        if next == AppointmentStatus::Attended {
            self.credit_sale(&updated, staff_id).await;
        }
        Ok(updated)
    }

    /// The status change stands even if the ledger rejects the sale.
    async fn credit_sale(&self, appointment: &Appointment, staff_id: Option<Uuid>) {
        let amount = appointment.total_price();
        if appointment.services.is_empty() || amount <= Decimal::ZERO {
            return;
        }
        let description = appointment
            .services
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let sale = SaleInput {
            amount,
            appointment_id: Some(appointment.id),
            description: Some(description),
        };
        if let Err(e) = self
            .ledger
            .record_sale(appointment.scheduled_at.date(), sale, staff_id)
            .await
        {
            error!(
                "Failed to credit appointment {} to the cash register: {}",
                appointment.id, e
            );
        }
    }

    /// Moves an open appointment to another bookable slot.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        date: NaiveDate,
        time: &str,
        now: NaiveDateTime,
    ) -> PortResult<Appointment> {
        let scheduled_at = validate_slot(date, time, now)?;
        let current = self.store.get_appointment(appointment_id).await?;
        if current.status.is_terminal() {
            return Err(PortError::validation(
                "status",
                format!("a {} appointment cannot be rescheduled", current.status),
            ));
        }
        self.store
            .reschedule_appointment(appointment_id, scheduled_at)
            .await
    }

    pub async fn assign_staff(
        &self,
        appointment_id: Uuid,
        staff_id: Option<Uuid>,
    ) -> PortResult<Appointment> {
        self.store.assign_staff(appointment_id, staff_id).await
    }

    /// Cancels PENDING/CONFIRMED appointments of days that have ended.
    ///
    /// Appointments of the current day stay open so they can still be marked
    /// ATTENDED after the customer has been served.
    pub async fn expire_overdue(&self, now: NaiveDateTime) -> PortResult<u64> {
        let (start_of_today, _) = day_bounds(now.date());
        let expired = self.store.expire_overdue(start_of_today).await?;
        if expired > 0 {
            info!("Expired {} overdue appointment(s)", expired);
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookedService, NewAppointment};
    use crate::ledger::LedgerBackend;
    use crate::domain::MovementType;
    use crate::memory::MemoryStore;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn service_line(name: &str, price: i64, minutes: u32) -> BookedService {
        BookedService {
            service_id: Uuid::new_v4(),
            name: name.into(),
            price: Decimal::from(price),
            duration_minutes: minutes,
        }
    }

    async fn setup(status: AppointmentStatus) -> (AppointmentService, Arc<CashLedger>, Appointment) {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(CashLedger::new(LedgerBackend::InMemory));
        let appointment = store
            .create_appointment(NewAppointment {
                client_id: Uuid::new_v4(),
                services: vec![service_line("Corte", 15, 30), service_line("Barba", 10, 20)],
                staff_id: None,
                scheduled_at: day().and_hms_opt(10, 0, 0).unwrap(),
                status,
                notes: None,
            })
            .await
            .unwrap();
        (
            AppointmentService::new(store, ledger.clone()),
            ledger,
            appointment,
        )
    }

    #[tokio::test]
    async fn attending_credits_the_total_to_the_ledger() {
        let (service, ledger, appointment) = setup(AppointmentStatus::Confirmed).await;
        service
            .change_status(appointment.id, AppointmentStatus::Attended, None)
            .await
            .unwrap();

        let session = ledger.session_for(day()).await.unwrap();
        assert_eq!(session.total_sales, Decimal::from(25));
        let movements = ledger.movements(day()).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementType::Sale);
        assert_eq!(movements[0].appointment_id, Some(appointment.id));
        assert_eq!(movements[0].description, "Corte, Barba");

        // Re-applying the same status does not credit twice.
        service
            .change_status(appointment.id, AppointmentStatus::Attended, None)
            .await
            .unwrap();
        assert_eq!(
            ledger.session_for(day()).await.unwrap().total_sales,
            Decimal::from(25)
        );
    }

    #[tokio::test]
    async fn terminal_statuses_cannot_be_left() {
        let (service, _, appointment) = setup(AppointmentStatus::Pending).await;
        service
            .change_status(appointment.id, AppointmentStatus::Cancelled, None)
            .await
            .unwrap();
        let err = service
            .change_status(appointment.id, AppointmentStatus::Confirmed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
    }

    #[tokio::test]
    async fn closed_register_does_not_undo_attendance() {
        let (service, ledger, appointment) = setup(AppointmentStatus::Confirmed).await;
        ledger.session_for(day()).await.unwrap();
        ledger
            .close_session(day(), Decimal::ZERO, None, None)
            .await
            .unwrap();
        let updated = service
            .change_status(appointment.id, AppointmentStatus::Attended, None)
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Attended);
    }

    #[tokio::test]
    async fn reschedule_checks_the_grid_and_conflicts() {
        let (service, _, appointment) = setup(AppointmentStatus::Confirmed).await;
        let now = day().and_hms_opt(8, 0, 0).unwrap();
        let moved = service
            .reschedule(appointment.id, day(), "15:30", now)
            .await
            .unwrap();
        assert_eq!(moved.scheduled_at, day().and_hms_opt(15, 30, 0).unwrap());
        assert!(matches!(
            service.reschedule(appointment.id, day(), "15:45", now).await,
            Err(PortError::Validation { .. })
        ));

        let other = service
            .store
            .create_appointment(NewAppointment {
                client_id: Uuid::new_v4(),
                services: vec![service_line("Corte", 15, 30)],
                staff_id: None,
                scheduled_at: day().and_hms_opt(12, 0, 0).unwrap(),
                status: AppointmentStatus::Confirmed,
                notes: None,
            })
            .await
            .unwrap();
        assert!(matches!(
            service.reschedule(appointment.id, day(), "12:00", now).await,
            Err(PortError::Conflict(_))
        ));
        assert_eq!(
            service.get(appointment.id).await.unwrap().scheduled_at,
            day().and_hms_opt(15, 30, 0).unwrap()
        );
        assert_eq!(service.get(other.id).await.unwrap().status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn same_day_sweep_leaves_the_appointment_attendable() {
        let (service, ledger, appointment) = setup(AppointmentStatus::Confirmed).await;

        let just_started = day().and_hms_opt(10, 5, 0).unwrap();
        assert_eq!(service.expire_overdue(just_started).await.unwrap(), 0);
        let late_evening = day().and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(service.expire_overdue(late_evening).await.unwrap(), 0);

        service
            .change_status(appointment.id, AppointmentStatus::Attended, None)
            .await
            .unwrap();
        assert_eq!(
            ledger.session_for(day()).await.unwrap().total_sales,
            Decimal::from(25)
        );
    }

    #[tokio::test]
    async fn next_day_sweep_cancels_what_was_left_open() {
        let (service, _, appointment) = setup(AppointmentStatus::Confirmed).await;
        let next_morning = day().succ_opt().unwrap().and_hms_opt(0, 5, 0).unwrap();
        assert_eq!(service.expire_overdue(next_morning).await.unwrap(), 1);
        assert_eq!(
            service.get(appointment.id).await.unwrap().status,
            AppointmentStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn listing_includes_every_status() {
        let (service, _, appointment) = setup(AppointmentStatus::Pending).await;
        let listed = service.list_for_date(day()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, appointment.id);
        assert!(service
            .list_for_date(day().succ_opt().unwrap())
            .await
            .unwrap()
            .is_empty());
    }
}
