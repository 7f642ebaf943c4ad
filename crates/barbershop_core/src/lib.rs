pub mod appointments;
pub mod booking;
pub mod domain;
pub mod ledger;
pub mod memory;
pub mod payments;
pub mod ports;
pub mod slots;
pub mod validation;

pub use appointments::AppointmentService;
pub use booking::{BookingRequest, BookingService};
pub use domain::{
    Appointment, AppointmentStatus, AuthSession, BookedService, CashMovement,
    CashRegisterSession, Client, Expense, MovementType, NewAppointment, NewClient, Notification,
    Payment, PaymentsReport, Service, ServiceDraft, SessionStatus, Slot, Staff, StaffCredentials,
    StaffRole,
};
pub use ledger::{CashLedger, ExpenseInput, LedgerBackend, SaleInput};
pub use memory::MemoryStore;
pub use ports::{
    AppointmentStore, CatalogStore, LedgerStore, NotificationStore, PortError, PortResult,
    StaffStore,
};
pub use slots::SlotCalculator;
