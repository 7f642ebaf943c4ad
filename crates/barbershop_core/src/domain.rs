//! crates/barbershop_core/src/domain.rs
//!
//! Defines the pure, core data structures for the barbershop.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Catalog
//=========================================================================================

/// A priced, timed offering of the shop.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    pub active: bool,
}

/// Fields accepted when creating or replacing a service.
#[derive(Debug, Clone)]
pub struct ServiceDraft {
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    pub active: bool,
}

/// A customer. The phone number is the natural dedup key.
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub staff_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub staff_id: Option<Uuid>,
}

//=========================================================================================
// Appointments
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Attended,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Attended => "ATTENDED",
        }
    }

    /// Cancelled and attended appointments are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Attended)
    }

    /// Whether a staff member may move an appointment from `self` to `next`.
    /// Re-applying the current status is always allowed.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, Attended)
                | (Confirmed, Cancelled)
                | (Confirmed, Attended)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "ATTENDED" => Ok(Self::Attended),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

/// A service as it was priced when the appointment was booked.
#[derive(Debug, Clone, PartialEq)]
pub struct BookedService {
    pub service_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
}

impl From<&Service> for BookedService {
    fn from(service: &Service) -> Self {
        Self {
            service_id: service.id,
            name: service.name.clone(),
            price: service.price,
            duration_minutes: service.duration_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub services: Vec<BookedService>,
    pub staff_id: Option<Uuid>,
    /// Shop-local time, no zone attached.
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn total_price(&self) -> Decimal {
        self.services.iter().map(|s| s.price).sum()
    }

    pub fn total_duration_minutes(&self) -> u32 {
        self.services.iter().map(|s| s.duration_minutes).sum()
    }
}

/// The data needed to insert an appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub services: Vec<BookedService>,
    pub staff_id: Option<Uuid>,
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

/// One bookable start time and whether it is still free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// `HH:MM`
    pub time: String,
    pub available: bool,
}

//=========================================================================================
// Cash register
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closed,
}

/// The cash register session of a single calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct CashRegisterSession {
    pub id: Uuid,
    pub date: NaiveDate,
    pub opening_cash: Decimal,
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    pub closing_cash: Option<Decimal>,
    /// `closing_cash - expected_cash()` at the moment of closing.
    pub cash_variance: Option<Decimal>,
    pub status: SessionStatus,
    pub opened_by: Option<Uuid>,
    pub closed_by: Option<Uuid>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl CashRegisterSession {
    /// A freshly opened session for `date` with zero in every total.
    pub fn open(date: NaiveDate, opening_cash: Decimal, opened_by: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            opening_cash,
            total_sales: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            closing_cash: None,
            cash_variance: None,
            status: SessionStatus::Open,
            opened_by,
            closed_by: None,
            opened_at: Utc::now(),
            closed_at: None,
            notes: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Always derived from the three stored totals.
    pub fn current_cash(&self) -> Decimal {
        self.opening_cash + self.total_sales - self.total_expenses
    }

    pub fn expected_cash(&self) -> Decimal {
        self.current_cash()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementType {
    Sale,
    Expense,
    Opening,
    Closing,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Expense => "EXPENSE",
            Self::Opening => "OPENING",
            Self::Closing => "CLOSING",
            Self::Adjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALE" => Ok(Self::Sale),
            "EXPENSE" => Ok(Self::Expense),
            "OPENING" => Ok(Self::Opening),
            "CLOSING" => Ok(Self::Closing),
            "ADJUSTMENT" => Ok(Self::Adjustment),
            other => Err(format!("unknown movement type '{}'", other)),
        }
    }
}

/// Append-only ledger entry. Expenses carry a negative amount.
#[derive(Debug, Clone, PartialEq)]
pub struct CashMovement {
    pub id: Uuid,
    pub session_id: Uuid,
    pub kind: MovementType,
    pub amount: Decimal,
    pub description: String,
    pub appointment_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    pub fn new(
        session_id: Uuid,
        kind: MovementType,
        amount: Decimal,
        description: impl Into<String>,
        appointment_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            kind,
            amount,
            description: description.into(),
            appointment_id,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// A categorized supply purchase paid from the till.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub session_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub receipt_number: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One attended appointment in the day's payment report.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub services: Vec<String>,
    pub total_price: Decimal,
    pub total_duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentsReport {
    pub date: NaiveDate,
    pub payments: Vec<Payment>,
    pub total: Decimal,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub urgent: bool,
    pub related_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: &str, title: impl Into<String>, message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
            title: title.into(),
            message: message.into(),
            read: false,
            urgent: false,
            related_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

//=========================================================================================
// Staff and auth
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRole {
    Admin,
    Barber,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Barber => "barber",
        }
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "barber" => Ok(Self::Barber),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

// Represents a staff account - used throughout the app
#[derive(Debug, Clone, PartialEq)]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct StaffCredentials {
    pub staff: Staff,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub staff_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_follow_table() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Attended));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Attended.can_transition_to(Cancelled));
        assert!(Attended.can_transition_to(Attended));
    }

    #[test]
    fn status_parses_wire_names() {
        assert_eq!("confirmed".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Confirmed));
        assert!("DONE".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn current_cash_is_derived() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut session = CashRegisterSession::open(date, Decimal::new(50, 0), None);
        session.total_sales = Decimal::new(3000, 2);
        session.total_expenses = Decimal::new(125, 1);
        assert_eq!(session.current_cash(), Decimal::new(675, 1));
    }

    #[test]
    fn appointment_totals_sum_services() {
        let now = Utc::now();
        let appt = Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            services: vec![
                BookedService {
                    service_id: Uuid::new_v4(),
                    name: "Corte".into(),
                    price: Decimal::new(15, 0),
                    duration_minutes: 30,
                },
                BookedService {
                    service_id: Uuid::new_v4(),
                    name: "Barba".into(),
                    price: Decimal::new(1050, 2),
                    duration_minutes: 20,
                },
            ],
            staff_id: None,
            scheduled_at: NaiveDate::from_ymd_opt(2024, 6, 10)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            status: AppointmentStatus::Attended,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(appt.total_price(), Decimal::new(2550, 2));
        assert_eq!(appt.total_duration_minutes(), 50);
    }
}
