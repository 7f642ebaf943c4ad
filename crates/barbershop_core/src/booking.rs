//! crates/barbershop_core/src/booking.rs
//!
//! The booking protocol: validate locally, re-check the slot against a fresh slot
//! list, then let the store's uniqueness guard settle races. A conflict is handed
//! back to the caller unchanged; it is never retried here.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentStatus, BookedService, Client, NewAppointment, NewClient,
    Notification,
};
use crate::ports::{
    AppointmentStore, CatalogStore, NotificationStore, PortError, PortResult,
};
use crate::slots::{is_slot_start, SlotCalculator};
use crate::validation;

/// What a customer submits to book a slot.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    pub service_id: Uuid,
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
    pub notes: Option<String>,
}

/// Checks that `date` + `time` is a slot start of the working window lying after `now`.
pub fn validate_slot(date: NaiveDate, time: &str, now: NaiveDateTime) -> PortResult<NaiveDateTime> {
    let time = validation::time_of_day(time)?;
    if !is_slot_start(time) {
        return Err(PortError::validation(
            "time",
            "is not one of the bookable slots",
        ));
    }
    let scheduled_at = date.and_time(time);
    if scheduled_at <= now {
        return Err(PortError::validation("date", "the selected slot is in the past"));
    }
    Ok(scheduled_at)
}

#[derive(Clone)]
pub struct BookingService {
    catalog: Arc<dyn CatalogStore>,
    appointments: Arc<dyn AppointmentStore>,
    notifications: Arc<dyn NotificationStore>,
    slots: SlotCalculator,
    admin_contact: Option<String>,
}

impl BookingService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        appointments: Arc<dyn AppointmentStore>,
        notifications: Arc<dyn NotificationStore>,
        admin_contact: Option<String>,
    ) -> Self {
        Self {
            catalog,
            slots: SlotCalculator::new(appointments.clone()),
            appointments,
            notifications,
            admin_contact,
        }
    }

    pub fn slots(&self) -> &SlotCalculator {
        &self.slots
    }

    /// Books `request` as a CONFIRMED appointment.
    ///
    /// Returns `Validation` before touching any store when the input is malformed,
    /// and `Conflict` when the slot is (or just became) taken.
    pub async fn book(&self, request: BookingRequest, now: NaiveDateTime) -> PortResult<Appointment> {
        let name = validation::required("name", &request.name)?;
        let phone = validation::phone(&request.phone)?;
        let scheduled_at = validate_slot(request.date, &request.time, now)?;
        let notes = request.notes.filter(|n| !n.trim().is_empty());

        let service = match self.catalog.get_service(request.service_id).await {
            Ok(service) if service.active => service,
            Ok(_) | Err(PortError::NotFound(_)) => {
                return Err(PortError::validation(
                    "service_id",
                    "the selected service is not available",
                ))
            }
            Err(e) => return Err(e),
        };

        if !self.slots.is_available(scheduled_at).await? {
            return Err(PortError::Conflict(format!(
                "The slot {} is no longer available",
                scheduled_at.format("%Y-%m-%d %H:%M")
            )));
        }

        let client = self.find_or_create_client(name, phone).await?;
        let appointment = self
            .appointments
            .create_appointment(NewAppointment {
                client_id: client.id,
                services: vec![BookedService::from(&service)],
                staff_id: None,
                scheduled_at,
                status: AppointmentStatus::Confirmed,
                notes,
            })
            .await?;
        info!(
            "Booked appointment {} for client {} at {}",
            appointment.id, client.id, appointment.scheduled_at
        );

        self.notify_admin(&appointment, &client, &service.name).await;
        Ok(appointment)
    }

    /// The phone number is the dedup key; a concurrent insert of the same phone
    /// resolves to the row that won.
    async fn find_or_create_client(&self, name: String, phone: String) -> PortResult<Client> {
        if let Some(client) = self.catalog.find_client_by_phone(&phone).await? {
            return Ok(client);
        }
        let new_client = NewClient {
            name,
            phone: phone.clone(),
            ..Default::default()
        };
        match self.catalog.create_client(new_client).await {
            Ok(client) => Ok(client),
            Err(PortError::Conflict(_)) => self
                .catalog
                .find_client_by_phone(&phone)
                .await?
                .ok_or_else(|| PortError::Unexpected(format!("Client {} vanished", phone))),
            Err(e) => Err(e),
        }
    }

    async fn notify_admin(&self, appointment: &Appointment, client: &Client, service_name: &str) {
        let Some(admin) = &self.admin_contact else {
            return;
        };
        let mut notification = Notification::new(
            "new_appointment",
            "New appointment",
            format!(
                "{} booked {} on {}",
                client.name,
                service_name,
                appointment.scheduled_at.format("%Y-%m-%d %H:%M")
            ),
        );
        notification.related_id = Some(appointment.id);
        match self.notifications.create_notification(&notification).await {
            Ok(()) => info!("Queued new appointment notice for {}", admin),
            Err(e) => warn!("Failed to record booking notification: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceDraft;
    use crate::memory::MemoryStore;
    use rust_decimal::Decimal;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn morning() -> NaiveDateTime {
        day().and_hms_opt(8, 0, 0).unwrap()
    }

    async fn setup(admin: Option<&str>) -> (Arc<MemoryStore>, BookingService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let service = store
            .create_service(ServiceDraft {
                name: "Corte".into(),
                price: Decimal::new(15, 0),
                duration_minutes: 30,
                active: true,
            })
            .await
            .unwrap();
        let booking = BookingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            admin.map(str::to_string),
        );
        (store, booking, service.id)
    }

    fn request(service_id: Uuid, phone: &str, time: &str) -> BookingRequest {
        BookingRequest {
            name: "Ana".into(),
            phone: phone.into(),
            service_id,
            date: day(),
            time: time.into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn simultaneous_bookings_resolve_to_one_success_and_one_conflict() {
        let (_, booking, service_id) = setup(None).await;
        let before = booking.slots().slots_for(day()).await.unwrap();
        assert!(before.iter().find(|s| s.time == "10:00").unwrap().available);

        let (a, b) = tokio::join!(
            booking.book(request(service_id, "611111111", "10:00"), morning()),
            booking.book(request(service_id, "622222222", "10:00"), morning()),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(PortError::Conflict(_))))
                .count(),
            1
        );

        let after = booking.slots().slots_for(day()).await.unwrap();
        assert!(!after.iter().find(|s| s.time == "10:00").unwrap().available);
    }

    #[tokio::test]
    async fn booking_captures_service_and_reuses_client_by_phone() {
        let (store, booking, service_id) = setup(None).await;
        let first = booking
            .book(request(service_id, "611 111 111", "09:00"), morning())
            .await
            .unwrap();
        let second = booking
            .book(request(service_id, "611 111 111", "09:30"), morning())
            .await
            .unwrap();
        assert_eq!(first.client_id, second.client_id);
        assert_eq!(first.status, AppointmentStatus::Confirmed);
        assert_eq!(first.services.len(), 1);
        assert_eq!(first.total_price(), Decimal::new(15, 0));
        assert_eq!(store.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn differently_written_phones_are_one_client() {
        let (store, booking, service_id) = setup(None).await;
        let mut client_ids = Vec::new();
        for (phone, time) in [
            ("611111111", "09:00"),
            ("611 111 111", "09:30"),
            ("611-111-111", "10:00"),
        ] {
            let appointment = booking
                .book(request(service_id, phone, time), morning())
                .await
                .unwrap();
            client_ids.push(appointment.client_id);
        }
        client_ids.dedup();
        assert_eq!(client_ids.len(), 1);

        let clients = store.list_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].phone, "611111111");
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_the_store() {
        let (store, booking, service_id) = setup(None).await;
        let cases = [
            request(service_id, "not a phone", "10:00"),
            request(service_id, "611111111", "10:15"),
            request(service_id, "611111111", "18:00"),
            request(service_id, "611111111", "ten"),
        ];
        for case in cases {
            assert!(matches!(
                booking.book(case, morning()).await,
                Err(PortError::Validation { .. })
            ));
        }
        let late = day().and_hms_opt(12, 0, 0).unwrap();
        assert!(matches!(
            booking.book(request(service_id, "611111111", "10:00"), late).await,
            Err(PortError::Validation { .. })
        ));
        assert!(store.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_service_is_rejected() {
        let (store, booking, service_id) = setup(None).await;
        store
            .update_service(
                service_id,
                ServiceDraft {
                    name: "Corte".into(),
                    price: Decimal::new(15, 0),
                    duration_minutes: 30,
                    active: false,
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            booking
                .book(request(service_id, "611111111", "10:00"), morning())
                .await,
            Err(PortError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn admin_contact_enables_notifications() {
        let (store, booking, service_id) = setup(Some("owner@example.com")).await;
        let appointment = booking
            .book(request(service_id, "611111111", "11:00"), morning())
            .await
            .unwrap();
        let feed = store.list_notifications(true).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, "new_appointment");
        assert_eq!(feed[0].related_id, Some(appointment.id));

        let (store, booking, service_id) = setup(None).await;
        booking
            .book(request(service_id, "611111111", "11:00"), morning())
            .await
            .unwrap();
        assert!(store.list_notifications(false).await.unwrap().is_empty());
    }
}
