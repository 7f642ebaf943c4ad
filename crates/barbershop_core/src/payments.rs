//! The day's payments: attended appointments with their totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{AppointmentStatus, Payment, PaymentsReport};
use crate::ports::{AppointmentStore, PortResult};
use crate::slots::day_bounds;

/// Read-only aggregation over the ATTENDED appointments of `date`, by time.
pub async fn todays_payments(
    store: &dyn AppointmentStore,
    date: NaiveDate,
) -> PortResult<PaymentsReport> {
    let (from, to) = day_bounds(date);
    let mut attended = store
        .list_appointments_between(from, to, Some(AppointmentStatus::Attended))
        .await?;
    attended.sort_by_key(|a| a.scheduled_at);

    let payments: Vec<Payment> = attended
        .iter()
        .map(|a| Payment {
            appointment_id: a.id,
            client_id: a.client_id,
            scheduled_at: a.scheduled_at,
            services: a.services.iter().map(|s| s.name.clone()).collect(),
            total_price: a.total_price(),
            total_duration_minutes: a.total_duration_minutes(),
        })
        .collect();
    let total = payments.iter().map(|p| p.total_price).sum::<Decimal>();

    Ok(PaymentsReport {
        date,
        payments,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookedService, NewAppointment};
    use crate::memory::MemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn sums_only_attended_appointments_of_the_day() {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let entries = [
            (day.and_hms_opt(11, 0, 0), AppointmentStatus::Attended, vec![(15, 30), (10, 20)]),
            (day.and_hms_opt(9, 0, 0), AppointmentStatus::Attended, vec![(12, 25)]),
            (day.and_hms_opt(12, 0, 0), AppointmentStatus::Confirmed, vec![(40, 60)]),
            (day.succ_opt().unwrap().and_hms_opt(9, 0, 0), AppointmentStatus::Attended, vec![(99, 10)]),
        ];
        for (at, status, services) in entries {
            store
                .create_appointment(NewAppointment {
                    client_id: Uuid::new_v4(),
                    services: services
                        .into_iter()
                        .map(|(price, minutes)| BookedService {
                            service_id: Uuid::new_v4(),
                            name: format!("Service {}", price),
                            price: Decimal::from(price),
                            duration_minutes: minutes,
                        })
                        .collect(),
                    staff_id: None,
                    scheduled_at: at.unwrap(),
                    status,
                    notes: None,
                })
                .await
                .unwrap();
        }

        let report = todays_payments(&store, day).await.unwrap();
        assert_eq!(report.payments.len(), 2);
        assert_eq!(report.payments[0].total_price, Decimal::from(12));
        assert_eq!(report.payments[1].total_price, Decimal::from(25));
        assert_eq!(report.payments[1].total_duration_minutes, 50);
        assert_eq!(report.total, Decimal::from(37));
    }

    #[tokio::test]
    async fn empty_day_totals_zero() {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let report = todays_payments(&store, day).await.unwrap();
        assert!(report.payments.is_empty());
        assert_eq!(report.total, Decimal::ZERO);
    }
}
