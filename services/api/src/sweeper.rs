//! services/api/src/sweeper.rs
//!
//! Background task that periodically cancels PENDING/CONFIRMED appointments left
//! open on days that have ended.

use barbershop_core::AppointmentService;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::web::rest::shop_now;

pub struct ExpirySweeper {
    appointments: AppointmentService,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(
        appointments: AppointmentService,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            appointments,
            interval,
            shutdown,
        }
    }

    /// Runs one sweep per tick until the token is cancelled. The first tick fires
    /// immediately so overdue appointments are cleaned up at startup.
    pub async fn run(self) {
        info!("Expiry sweeper started (every {:?})", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.appointments.expire_overdue(shop_now()).await {
                        error!("Expiry sweep failed: {}", e);
                    }
                }
            }
        }
        info!("Expiry sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barbershop_core::domain::{AppointmentStatus, NewAppointment};
    use barbershop_core::ports::AppointmentStore;
    use barbershop_core::{CashLedger, LedgerBackend, MemoryStore};
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn cancels_overdue_appointments_and_stops_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let in_the_chair = store
            .create_appointment(NewAppointment {
                client_id: Uuid::new_v4(),
                services: Vec::new(),
                staff_id: None,
                scheduled_at: shop_now().date().and_hms_opt(0, 0, 0).unwrap(),
                status: AppointmentStatus::Confirmed,
                notes: None,
            })
            .await
            .unwrap();
        let overdue = store
            .create_appointment(NewAppointment {
                client_id: Uuid::new_v4(),
                services: Vec::new(),
                staff_id: None,
                scheduled_at: shop_now() - ChronoDuration::days(1),
                status: AppointmentStatus::Confirmed,
                notes: None,
            })
            .await
            .unwrap();

        let ledger = Arc::new(CashLedger::new(LedgerBackend::InMemory));
        let service = AppointmentService::new(store.clone(), ledger);
        let shutdown = CancellationToken::new();
        let sweeper = ExpirySweeper::new(service, Duration::from_millis(10), shutdown.clone());
        let handle = tokio::spawn(sweeper.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let after = store.get_appointment(overdue.id).await.unwrap();
        assert_eq!(after.status, AppointmentStatus::Cancelled);
        let today = store.get_appointment(in_the_chair.id).await.unwrap();
        assert_eq!(today.status, AppointmentStatus::Confirmed);
    }
}
