//! crates/barbershop_core/src/ledger.rs
//!
//! The daily cash register: one session per date moving `NO_SESSION -> OPEN -> CLOSED`,
//! with sales and expenses accumulated on the session and an append-only movement log.
//!
//! Every write is applied to the configured store and to an in-memory mirror. When the
//! store is unavailable (unreachable, missing tables) the ledger logs a warning and keeps
//! serving from the mirror for the rest of the process lifetime, so callers see the same
//! data shape either way. Any other store error is returned to the caller.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{CashMovement, CashRegisterSession, Expense, MovementType, SessionStatus};
use crate::memory::MemoryStore;
use crate::ports::{LedgerStore, PortError, PortResult};
use crate::validation;

/// Category stored on expenses recorded without one.
pub const DEFAULT_EXPENSE_CATEGORY: &str = "supplies";

/// Where the ledger keeps its state.
#[derive(Clone)]
pub enum LedgerBackend {
    /// A durable store, mirrored in memory.
    Persistent(Arc<dyn LedgerStore>),
    /// Process memory only.
    InMemory,
}

/// A supply purchase paid from the till.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub concept: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub category: Option<String>,
    pub receipt_number: Option<String>,
}

/// A payment received at the till.
#[derive(Debug, Clone)]
pub struct SaleInput {
    pub amount: Decimal,
    pub appointment_id: Option<Uuid>,
    pub description: Option<String>,
}

enum LedgerWrite<'a> {
    InsertSession(&'a CashRegisterSession),
    UpdateSession(&'a CashRegisterSession),
    Movement(&'a CashMovement),
    Expense(&'a Expense),
}

impl LedgerWrite<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::InsertSession(_) => "insert_session",
            Self::UpdateSession(_) => "update_session",
            Self::Movement(_) => "append_movement",
            Self::Expense(_) => "insert_expense",
        }
    }

    async fn apply(&self, store: &dyn LedgerStore) -> PortResult<()> {
        match self {
            Self::InsertSession(session) => store.insert_session(session).await,
            Self::UpdateSession(session) => store.update_session(session).await,
            Self::Movement(movement) => store.append_movement(movement).await,
            Self::Expense(expense) => store.insert_expense(expense).await,
        }
    }

    fn mirror(&self, mirror: &MemoryStore) -> PortResult<()> {
        match self {
            Self::InsertSession(session) | Self::UpdateSession(session) => {
                mirror.upsert_session(session)
            }
            Self::Movement(movement) => mirror.push_movement(movement),
            Self::Expense(expense) => mirror.push_expense(expense),
        }
    }
}

pub struct CashLedger {
    primary: Option<Arc<dyn LedgerStore>>,
    mirror: MemoryStore,
    degraded: AtomicBool,
    /// Serializes ledger operations so concurrent first views of a date open one session.
    serial: Mutex<()>,
}

impl CashLedger {
    pub fn new(backend: LedgerBackend) -> Self {
        let primary = match backend {
            LedgerBackend::Persistent(store) => Some(store),
            LedgerBackend::InMemory => None,
        };
        Self {
            primary,
            mirror: MemoryStore::new(),
            degraded: AtomicBool::new(false),
            serial: Mutex::new(()),
        }
    }

    /// True once a store failure has switched the ledger to its in-memory mirror.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    fn active_primary(&self) -> Option<&Arc<dyn LedgerStore>> {
        self.primary.as_ref().filter(|_| !self.is_degraded())
    }

    fn degrade(&self, operation: &str, error: &PortError) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            warn!(
                "Cash ledger store failed during {}: {}. Continuing with the in-memory ledger.",
                operation, error
            );
        } else {
            warn!("Cash ledger store failed during {}: {}", operation, error);
        }
    }

    async fn commit(&self, write: LedgerWrite<'_>) -> PortResult<()> {
        if let Some(primary) = self.active_primary() {
            match write.apply(primary.as_ref()).await {
                Ok(()) => {}
                Err(e) if e.is_outage() => self.degrade(write.name(), &e),
                Err(e) => return Err(e),
            }
        }
        write.mirror(&self.mirror)
    }

    async fn find(&self, date: NaiveDate) -> PortResult<Option<CashRegisterSession>> {
        if let Some(primary) = self.active_primary() {
            match primary.find_session(date).await {
                Ok(found) => {
                    if let Some(session) = &found {
                        self.mirror.upsert_session(session)?;
                    }
                    return Ok(found);
                }
                Err(e) if e.is_outage() => self.degrade("find_session", &e),
                Err(e) => return Err(e),
            }
        }
        self.mirror.find_session(date).await
    }

    /// The session of `date`, opened with zero cash if none exists yet.
    async fn session_or_open(&self, date: NaiveDate) -> PortResult<CashRegisterSession> {
        if let Some(session) = self.find(date).await? {
            return Ok(session);
        }
        let session = CashRegisterSession::open(date, Decimal::ZERO, None);
        match self.commit(LedgerWrite::InsertSession(&session)).await {
            Ok(()) => {
                info!("Auto-opened cash register session for {}", date);
                Ok(session)
            }
            // Another process opened the date first.
            Err(PortError::Conflict(_)) => self.find(date).await?.ok_or_else(|| {
                PortError::Unexpected(format!("Cash register session for {} vanished", date))
            }),
            Err(e) => Err(e),
        }
    }

    fn require_open(session: &CashRegisterSession) -> PortResult<()> {
        if !session.is_open() {
            return Err(PortError::validation(
                "session",
                format!("the cash register for {} is closed", session.date),
            ));
        }
        Ok(())
    }

    /// Views the ledger for `date`, creating an open session with zero cash on first view.
    pub async fn session_for(&self, date: NaiveDate) -> PortResult<CashRegisterSession> {
        let _serial = self.serial.lock().await;
        self.session_or_open(date).await
    }

    /// Sets the opening cash of the day, (re-)initializing an open session.
    /// A closed session cannot be reopened.
    pub async fn open_session(
        &self,
        date: NaiveDate,
        opening_cash: Decimal,
        notes: Option<String>,
        staff_id: Option<Uuid>,
    ) -> PortResult<CashRegisterSession> {
        let opening_cash = validation::non_negative("opening_cash", opening_cash)
            .and_then(|c| validation::money("opening_cash", c))?;
        let _serial = self.serial.lock().await;

        let mut session = self.session_or_open(date).await?;
        if !session.is_open() {
            return Err(PortError::Conflict(format!(
                "The cash register for {} is already closed",
                date
            )));
        }
        session.opening_cash = opening_cash;
        session.opened_by = staff_id;
        session.opened_at = Utc::now();
        if notes.is_some() {
            session.notes = notes;
        }
        self.commit(LedgerWrite::UpdateSession(&session)).await?;

        let movement = CashMovement::new(
            session.id,
            MovementType::Opening,
            opening_cash,
            "Cash register opened",
            None,
            staff_id,
        );
        self.commit(LedgerWrite::Movement(&movement)).await?;
        info!("Opened cash register for {} with {}", date, opening_cash);
        Ok(session)
    }

    /// Closes the day with the counted cash. The variance against the expected
    /// balance is recorded for display only.
    pub async fn close_session(
        &self,
        date: NaiveDate,
        closing_cash: Decimal,
        notes: Option<String>,
        staff_id: Option<Uuid>,
    ) -> PortResult<CashRegisterSession> {
        let closing_cash = validation::non_negative("closing_cash", closing_cash)
            .and_then(|c| validation::money("closing_cash", c))?;
        let _serial = self.serial.lock().await;

        let mut session = self.find(date).await?.ok_or_else(|| {
            PortError::NotFound(format!("No cash register session for {}", date))
        })?;
        if !session.is_open() {
            return Err(PortError::Conflict(format!(
                "The cash register for {} is already closed",
                date
            )));
        }
        let variance = closing_cash - session.expected_cash();
        session.closing_cash = Some(closing_cash);
        session.cash_variance = Some(variance);
        session.status = SessionStatus::Closed;
        session.closed_by = staff_id;
        session.closed_at = Some(Utc::now());
        if notes.is_some() {
            session.notes = notes;
        }
        self.commit(LedgerWrite::UpdateSession(&session)).await?;

        let movement = CashMovement::new(
            session.id,
            MovementType::Closing,
            closing_cash,
            "Cash register closed",
            None,
            staff_id,
        );
        self.commit(LedgerWrite::Movement(&movement)).await?;
        info!(
            "Closed cash register for {}: counted {}, variance {}",
            date, closing_cash, variance
        );
        Ok(session)
    }

    /// Records `quantity x unit_price`, rounded to cents, as an expense of the day.
    pub async fn record_expense(
        &self,
        date: NaiveDate,
        input: ExpenseInput,
        staff_id: Option<Uuid>,
    ) -> PortResult<Expense> {
        let concept = validation::required("concept", &input.concept)?;
        let quantity = validation::positive("quantity", input.quantity)?;
        let unit_price = validation::positive("unit_price", input.unit_price)
            .and_then(|p| validation::money("unit_price", p))?;
        let amount = validation::positive("amount", validation::to_cents(quantity * unit_price))
            .and_then(|a| validation::money("amount", a))?;
        let _serial = self.serial.lock().await;

        let mut session = self.session_or_open(date).await?;
        Self::require_open(&session)?;
        session.total_expenses += amount;
        self.commit(LedgerWrite::UpdateSession(&session)).await?;

        let movement = CashMovement::new(
            session.id,
            MovementType::Expense,
            -amount,
            concept.clone(),
            None,
            staff_id,
        );
        self.commit(LedgerWrite::Movement(&movement)).await?;

        let expense = Expense {
            id: Uuid::new_v4(),
            session_id: session.id,
            amount,
            description: concept,
            category: input
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_EXPENSE_CATEGORY.to_string()),
            receipt_number: input.receipt_number.filter(|r| !r.trim().is_empty()),
            created_by: staff_id,
            created_at: movement.created_at,
        };
        self.commit(LedgerWrite::Expense(&expense)).await?;
        Ok(expense)
    }

    /// Adds a sale to the day's running total.
    pub async fn record_sale(
        &self,
        date: NaiveDate,
        input: SaleInput,
        staff_id: Option<Uuid>,
    ) -> PortResult<CashRegisterSession> {
        let amount = validation::positive("amount", input.amount)
            .and_then(|a| validation::money("amount", a))?;
        let _serial = self.serial.lock().await;

        let mut session = self.session_or_open(date).await?;
        Self::require_open(&session)?;
        session.total_sales += amount;
        self.commit(LedgerWrite::UpdateSession(&session)).await?;

        let description = input
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "Sale".to_string());
        let movement = CashMovement::new(
            session.id,
            MovementType::Sale,
            amount,
            description,
            input.appointment_id,
            staff_id,
        );
        self.commit(LedgerWrite::Movement(&movement)).await?;
        Ok(session)
    }

    /// `opening + sales - expenses`, recomputed on every call.
    pub async fn current_cash(&self, date: NaiveDate) -> PortResult<Decimal> {
        Ok(self.session_for(date).await?.current_cash())
    }

    /// The movement log of the day, oldest first.
    pub async fn movements(&self, date: NaiveDate) -> PortResult<Vec<CashMovement>> {
        let session = self.session_for(date).await?;
        let mut movements = match self.active_primary() {
            Some(primary) => match primary.list_movements(session.id).await {
                Ok(movements) => {
                    self.mirror.replace_movements(session.id, &movements)?;
                    movements
                }
                Err(e) if e.is_outage() => {
                    self.degrade("list_movements", &e);
                    self.mirror.list_movements(session.id).await?
                }
                Err(e) => return Err(e),
            },
            None => self.mirror.list_movements(session.id).await?,
        };
        movements.sort_by_key(|m| m.created_at);
        Ok(movements)
    }

    /// The categorized expenses of the day, oldest first.
    pub async fn expenses(&self, date: NaiveDate) -> PortResult<Vec<Expense>> {
        let session = self.session_for(date).await?;
        let mut expenses = match self.active_primary() {
            Some(primary) => match primary.list_expenses(session.id).await {
                Ok(expenses) => {
                    self.mirror.replace_expenses(session.id, &expenses)?;
                    expenses
                }
                Err(e) if e.is_outage() => {
                    self.degrade("list_expenses", &e);
                    self.mirror.list_expenses(session.id).await?
                }
                Err(e) => return Err(e),
            },
            None => self.mirror.list_expenses(session.id).await?,
        };
        expenses.sort_by_key(|e| e.created_at);
        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn sale(amount: Decimal) -> SaleInput {
        SaleInput {
            amount,
            appointment_id: None,
            description: Some("Corte".into()),
        }
    }

    fn expense(concept: &str, quantity: i64, unit_price: Decimal) -> ExpenseInput {
        ExpenseInput {
            concept: concept.into(),
            quantity: Decimal::from(quantity),
            unit_price,
            category: None,
            receipt_number: None,
        }
    }

    /// A store that rejects every call, as if the tables did not exist.
    struct MissingTables;

    #[async_trait]
    impl LedgerStore for MissingTables {
        async fn find_session(&self, _: NaiveDate) -> PortResult<Option<CashRegisterSession>> {
            Err(PortError::Unavailable("relation \"cash_register\" does not exist".into()))
        }
        async fn insert_session(&self, _: &CashRegisterSession) -> PortResult<()> {
            Err(PortError::Unavailable("relation \"cash_register\" does not exist".into()))
        }
        async fn update_session(&self, _: &CashRegisterSession) -> PortResult<()> {
            Err(PortError::Unavailable("relation \"cash_register\" does not exist".into()))
        }
        async fn append_movement(&self, _: &CashMovement) -> PortResult<()> {
            Err(PortError::Unavailable("relation \"cash_movement\" does not exist".into()))
        }
        async fn list_movements(&self, _: Uuid) -> PortResult<Vec<CashMovement>> {
            Err(PortError::Unavailable("relation \"cash_movement\" does not exist".into()))
        }
        async fn insert_expense(&self, _: &Expense) -> PortResult<()> {
            Err(PortError::Unavailable("relation \"expense\" does not exist".into()))
        }
        async fn list_expenses(&self, _: Uuid) -> PortResult<Vec<Expense>> {
            Err(PortError::Unavailable("relation \"expense\" does not exist".into()))
        }
    }

    /// A reachable store that refuses expense rows, like a failed check constraint.
    struct RefusesExpenses(MemoryStore);

    #[async_trait]
    impl LedgerStore for RefusesExpenses {
        async fn find_session(&self, date: NaiveDate) -> PortResult<Option<CashRegisterSession>> {
            self.0.find_session(date).await
        }
        async fn insert_session(&self, session: &CashRegisterSession) -> PortResult<()> {
            self.0.insert_session(session).await
        }
        async fn update_session(&self, session: &CashRegisterSession) -> PortResult<()> {
            self.0.update_session(session).await
        }
        async fn append_movement(&self, movement: &CashMovement) -> PortResult<()> {
            self.0.append_movement(movement).await
        }
        async fn list_movements(&self, session_id: Uuid) -> PortResult<Vec<CashMovement>> {
            self.0.list_movements(session_id).await
        }
        async fn insert_expense(&self, _: &Expense) -> PortResult<()> {
            Err(PortError::Unexpected("expense_amount_check".into()))
        }
        async fn list_expenses(&self, session_id: Uuid) -> PortResult<Vec<Expense>> {
            self.0.list_expenses(session_id).await
        }
    }

    #[tokio::test]
    async fn first_view_auto_opens_with_zero_cash() {
        let ledger = CashLedger::new(LedgerBackend::InMemory);
        let session = ledger.session_for(day()).await.unwrap();
        assert!(session.is_open());
        assert_eq!(session.opening_cash, Decimal::ZERO);
        assert_eq!(ledger.session_for(day()).await.unwrap().id, session.id);
    }

    #[tokio::test]
    async fn concurrent_first_views_create_one_session() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(CashLedger::new(LedgerBackend::Persistent(store.clone())));
        let (a, b) = tokio::join!(ledger.session_for(day()), ledger.session_for(day()));
        assert_eq!(a.unwrap().id, b.unwrap().id);

        // A second process sharing the store resolves to the same session too.
        let other = CashLedger::new(LedgerBackend::Persistent(store.clone()));
        let seen = other.session_for(day()).await.unwrap();
        assert_eq!(store.find_session(day()).await.unwrap().unwrap().id, seen.id);
    }

    #[tokio::test]
    async fn balance_identity_holds_at_every_step() {
        let ledger = CashLedger::new(LedgerBackend::InMemory);
        let opening = Decimal::new(50, 0);
        ledger.open_session(day(), opening, None, None).await.unwrap();

        let mut sales = Decimal::ZERO;
        let mut expenses = Decimal::ZERO;
        for (i, amount) in [Decimal::new(15, 0), Decimal::new(2250, 2), Decimal::new(8, 0)]
            .into_iter()
            .enumerate()
        {
            ledger.record_sale(day(), sale(amount), None).await.unwrap();
            sales += amount;
            assert_eq!(ledger.current_cash(day()).await.unwrap(), opening + sales - expenses);

            let unit = Decimal::new(3 + i as i64, 0);
            ledger
                .record_expense(day(), expense("Gel", 2, unit), None)
                .await
                .unwrap();
            expenses += unit * Decimal::from(2);
            assert_eq!(ledger.current_cash(day()).await.unwrap(), opening + sales - expenses);
        }
    }

    #[tokio::test]
    async fn expense_is_quantity_times_unit_price() {
        let ledger = CashLedger::new(LedgerBackend::InMemory);
        let before = ledger.session_for(day()).await.unwrap();
        let recorded = ledger
            .record_expense(day(), expense("Toallas", 10, Decimal::new(125, 1)), None)
            .await
            .unwrap();
        assert_eq!(recorded.amount, Decimal::from(125));
        assert_eq!(recorded.category, DEFAULT_EXPENSE_CATEGORY);

        let after = ledger.session_for(day()).await.unwrap();
        assert_eq!(after.total_expenses - before.total_expenses, Decimal::from(125));

        let movements = ledger.movements(day()).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementType::Expense);
        assert_eq!(movements[0].amount, Decimal::from(-125));
        assert_eq!(ledger.expenses(day()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_amounts_are_rejected_before_any_write() {
        let ledger = CashLedger::new(LedgerBackend::InMemory);
        assert!(matches!(
            ledger.open_session(day(), Decimal::new(-1, 0), None, None).await,
            Err(PortError::Validation { .. })
        ));
        assert!(matches!(
            ledger.record_sale(day(), sale(Decimal::ZERO), None).await,
            Err(PortError::Validation { .. })
        ));
        assert!(matches!(
            ledger
                .record_expense(day(), expense("  ", 1, Decimal::ONE), None)
                .await,
            Err(PortError::Validation { .. })
        ));
        assert!(ledger.mirror.find_session(day()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expense_amount_is_rounded_to_cents() {
        let ledger = CashLedger::new(LedgerBackend::InMemory);
        let fractional = ExpenseInput {
            concept: "Cuchillas".into(),
            quantity: Decimal::new(3, 0),
            unit_price: Decimal::new(333, 2),
            category: None,
            receipt_number: None,
        };
        let recorded = ledger.record_expense(day(), fractional, None).await.unwrap();
        assert_eq!(recorded.amount, Decimal::new(999, 2));

        // 0.1 x 0.04 is 0.004, which is no money at all once stored.
        let dust = ExpenseInput {
            concept: "Gel".into(),
            quantity: Decimal::new(1, 1),
            unit_price: Decimal::new(4, 2),
            category: None,
            receipt_number: None,
        };
        assert!(matches!(
            ledger.record_expense(day(), dust, None).await,
            Err(PortError::Validation { field, .. }) if field == "amount"
        ));
        assert!(matches!(
            ledger.record_sale(day(), sale(Decimal::new(1001, 3)), None).await,
            Err(PortError::Validation { .. })
        ));
        assert_eq!(
            ledger.session_for(day()).await.unwrap().total_expenses,
            Decimal::new(999, 2)
        );
    }

    #[tokio::test]
    async fn rejected_writes_do_not_switch_to_memory() {
        let store = Arc::new(RefusesExpenses(MemoryStore::new()));
        let ledger = CashLedger::new(LedgerBackend::Persistent(store.clone()));
        assert!(matches!(
            ledger
                .record_expense(day(), expense("Gel", 1, Decimal::ONE), None)
                .await,
            Err(PortError::Unexpected(_))
        ));
        assert!(!ledger.is_degraded());

        // Later writes still reach the store.
        ledger
            .record_sale(day(), sale(Decimal::new(15, 0)), None)
            .await
            .unwrap();
        let stored = store.find_session(day()).await.unwrap().unwrap();
        assert_eq!(stored.total_sales, Decimal::new(15, 0));
    }

    #[tokio::test]
    async fn closing_records_variance_and_blocks_further_writes() {
        let ledger = CashLedger::new(LedgerBackend::InMemory);
        ledger
            .open_session(day(), Decimal::new(20, 0), None, None)
            .await
            .unwrap();
        ledger
            .record_sale(day(), sale(Decimal::new(30, 0)), None)
            .await
            .unwrap();
        let closed = ledger
            .close_session(day(), Decimal::new(45, 0), Some("short".into()), None)
            .await
            .unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert_eq!(closed.closing_cash, Some(Decimal::new(45, 0)));
        assert_eq!(closed.cash_variance, Some(Decimal::new(-5, 0)));

        assert!(matches!(
            ledger.record_sale(day(), sale(Decimal::ONE), None).await,
            Err(PortError::Validation { .. })
        ));
        assert!(matches!(
            ledger.open_session(day(), Decimal::ZERO, None, None).await,
            Err(PortError::Conflict(_))
        ));
        assert!(matches!(
            ledger.close_session(day(), Decimal::ZERO, None, None).await,
            Err(PortError::Conflict(_))
        ));
        let kinds: Vec<MovementType> = ledger
            .movements(day())
            .await
            .unwrap()
            .iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![MovementType::Opening, MovementType::Sale, MovementType::Closing]
        );
    }

    type Observed = (
        Decimal,
        Decimal,
        Decimal,
        Decimal,
        SessionStatus,
        Vec<(MovementType, Decimal, String)>,
    );

    async fn run_scenario(ledger: &CashLedger) -> Observed {
        ledger
            .open_session(day(), Decimal::new(100, 0), None, None)
            .await
            .unwrap();
        ledger
            .record_sale(day(), sale(Decimal::new(25, 0)), None)
            .await
            .unwrap();
        ledger
            .record_expense(day(), expense("Toallas", 10, Decimal::new(125, 1)), None)
            .await
            .unwrap();
        ledger
            .record_sale(day(), sale(Decimal::new(1750, 2)), None)
            .await
            .unwrap();
        let session = ledger.session_for(day()).await.unwrap();
        let movements = ledger
            .movements(day())
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.kind, m.amount, m.description))
            .collect();
        (
            session.opening_cash,
            session.total_sales,
            session.total_expenses,
            session.current_cash(),
            session.status,
            movements,
        )
    }

    #[tokio::test]
    async fn fallback_is_transparent_to_callers() {
        let healthy = CashLedger::new(LedgerBackend::Persistent(Arc::new(MemoryStore::new())));
        let broken = CashLedger::new(LedgerBackend::Persistent(Arc::new(MissingTables)));

        let expected = run_scenario(&healthy).await;
        let observed = run_scenario(&broken).await;

        assert_eq!(observed, expected);
        assert!(!healthy.is_degraded());
        assert!(broken.is_degraded());
        // 100 + 25 - 125 + 17.50
        assert_eq!(observed.3, Decimal::new(1750, 2));
    }
}
