//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use barbershop_core::ports::{AppointmentStore, CatalogStore, NotificationStore, StaffStore};
use barbershop_core::{AppointmentService, BookingService, CashLedger, LedgerBackend, MemoryStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn CatalogStore>,
    pub appointment_store: Arc<dyn AppointmentStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub staff: Arc<dyn StaffStore>,
    pub booking: BookingService,
    pub appointments: AppointmentService,
    pub ledger: Arc<CashLedger>,
}

impl AppState {
    /// Wires every service onto one store implementing all the ports.
    pub fn new<S>(config: Arc<Config>, store: Arc<S>, ledger_backend: LedgerBackend) -> Self
    where
        S: CatalogStore + AppointmentStore + NotificationStore + StaffStore + 'static,
    {
        let catalog: Arc<dyn CatalogStore> = store.clone();
        let appointment_store: Arc<dyn AppointmentStore> = store.clone();
        let notifications: Arc<dyn NotificationStore> = store.clone();
        let staff: Arc<dyn StaffStore> = store;

        let ledger = Arc::new(CashLedger::new(ledger_backend));
        let booking = BookingService::new(
            catalog.clone(),
            appointment_store.clone(),
            notifications.clone(),
            config.admin_email.clone(),
        );
        let appointments = AppointmentService::new(appointment_store.clone(), ledger.clone());

        Self {
            config,
            catalog,
            appointment_store,
            notifications,
            staff,
            booking,
            appointments,
            ledger,
        }
    }

    /// Everything in process memory; nothing survives a restart.
    pub fn in_memory(config: Arc<Config>) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), LedgerBackend::InMemory)
    }
}
