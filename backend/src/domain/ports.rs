//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain expects to interact with storage
//! and messaging adapters; driving ports are the use-case surface consumed
//! by inbound adapters. Each trait exposes strongly typed errors so
//! adapters map their failures into predictable variants.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error as ThisError;
use uuid::Uuid;

use super::Error;
use super::blackout::BlackoutSlot;
use super::reservation::{NewReservation, Slot};
use super::user::{Email, User, UserId};

// ---------------------------------------------------------------------------
// Driven port errors
// ---------------------------------------------------------------------------

/// Persistence errors raised by [`ReservationRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ReservationPersistenceError {
    /// Repository connection could not be established.
    #[error("reservation repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("reservation repository query failed: {message}")]
    Query { message: String },
    /// The `(date, hour)` uniqueness constraint rejected an insert: another
    /// actor holds the slot. The whole submission has been rolled back.
    #[error("slot {date} {hour}:00 is already reserved")]
    SlotTaken { date: NaiveDate, hour: u8 },
}

impl ReservationPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors raised by [`CreditLedger`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum LedgerError {
    /// Ledger connection could not be established.
    #[error("credit ledger connection failed: {message}")]
    Connection { message: String },
    /// The balance mutation failed during execution.
    #[error("credit ledger operation failed: {message}")]
    Operation { message: String },
}

impl LedgerError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for operation failures.
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`UserRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
}

impl UserPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`MaintenanceSlotRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum MaintenanceSlotRepositoryError {
    /// Repository connection could not be established.
    #[error("maintenance repository connection failed: {message}")]
    Connection { message: String },
    /// Query failed during execution.
    #[error("maintenance repository query failed: {message}")]
    Query { message: String },
}

impl MaintenanceSlotRepositoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`SystemSettingsRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SystemSettingsRepositoryError {
    /// Repository connection could not be established.
    #[error("settings repository connection failed: {message}")]
    Connection { message: String },
    /// Query failed during execution.
    #[error("settings repository query failed: {message}")]
    Query { message: String },
}

impl SystemSettingsRepositoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors raised by [`NotificationDispatcher`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum NotificationError {
    /// The relay is unreachable or timing out.
    #[error("notification relay unavailable: {message}")]
    Unavailable { message: String },
    /// The relay rejected the message.
    #[error("notification rejected: {message}")]
    Rejected { message: String },
}

impl NotificationError {
    /// Helper for relay outages.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Helper for rejected messages.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Driven ports
// ---------------------------------------------------------------------------

/// Persistence port for confirmed reservations.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert every row in one storage transaction.
    ///
    /// All-or-nothing: if any insert trips the `(date, hour)` uniqueness
    /// constraint the whole batch rolls back and the adapter returns
    /// [`ReservationPersistenceError::SlotTaken`] for the losing slot.
    async fn insert_all(
        &self,
        reservations: &[NewReservation],
    ) -> Result<Vec<Uuid>, ReservationPersistenceError>;

    /// Hours already reserved (by anyone) on the date.
    async fn reserved_hours(&self, date: NaiveDate)
    -> Result<Vec<u8>, ReservationPersistenceError>;

    /// Hours the given user holds on the date.
    async fn user_hours_on(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<u8>, ReservationPersistenceError>;
}

/// Atomic per-user credit balance operations.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Conditionally decrement the balance by `amount`.
    ///
    /// Must be a single indivisible operation at the storage layer, never a
    /// read-then-write in request code. Returns the new balance, or `None`
    /// when the balance was insufficient at the moment of debit.
    async fn debit(&self, user_id: &UserId, amount: u32) -> Result<Option<i32>, LedgerError>;

    /// Unconditionally increase the balance, used for compensating refunds.
    /// Returns the new balance.
    async fn credit(&self, user_id: &UserId, amount: u32) -> Result<i32, LedgerError>;
}

/// Persistence port for user aggregates.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by login email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError>;

    /// Record that the user's first-login flow finished.
    async fn mark_first_login(&self, id: &UserId) -> Result<(), UserPersistenceError>;
}

/// Persistence port for scheduled maintenance blocks.
#[async_trait]
pub trait MaintenanceSlotRepository: Send + Sync {
    /// Maintenance blackouts scheduled for the date.
    async fn slots_for(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BlackoutSlot>, MaintenanceSlotRepositoryError>;
}

/// Persistence port for facility-wide toggles.
#[async_trait]
pub trait SystemSettingsRepository: Send + Sync {
    /// Whether the recurring weekend program currently claims its hours.
    async fn recurring_program_enabled(&self) -> Result<bool, SystemSettingsRepositoryError>;
}

/// Confirmation message handed to the dispatcher after a commit.
///
/// The relay is responsible for composing the email, including the access
/// code for the physical lock; the domain only supplies booking facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    /// Recipient address.
    pub email: Email,
    /// Recipient name for the message salutation.
    pub full_name: String,
    /// Slots just confirmed.
    pub slots: Vec<Slot>,
    /// Balance after the debit.
    pub credits_remaining: i32,
}

/// Outbound port delivering booking confirmations. Best-effort: callers
/// never let a dispatch failure roll back a committed reservation.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver a confirmation for a committed booking.
    async fn booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError>;
}

// ---------------------------------------------------------------------------
// Driving ports
// ---------------------------------------------------------------------------

/// A booking submission from an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    /// Authenticated requester.
    pub user_id: UserId,
    /// Proposed slots, at most two.
    pub slots: Vec<Slot>,
}

/// Result of a committed booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOutcome {
    /// Identifiers of the rows just created.
    pub reservation_ids: Vec<Uuid>,
    /// Credit balance after the debit.
    pub credits: i32,
}

/// Driving port for booking submissions.
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Evaluate the admission rules and, on allow, commit the reservation.
    async fn submit(&self, request: BookingRequest) -> Result<BookingOutcome, Error>;
}

/// Availability of one calendar day, shaped for grid rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    /// The day queried.
    pub date: NaiveDate,
    /// Every bookable hour at this facility.
    pub hours: Vec<u8>,
    /// Hours already reserved by any user.
    pub reserved_hours: Vec<u8>,
    /// Blackouts in effect, maintenance and derived program entries alike.
    pub blackouts: Vec<BlackoutSlot>,
}

/// Driving port for the availability grid.
#[async_trait]
pub trait AvailabilityQuery: Send + Sync {
    /// Availability snapshot for the date.
    async fn day(&self, date: NaiveDate) -> Result<DayAvailability, Error>;
}

/// Driving port establishing sessions for known, active users.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Resolve an email to an active user, or fail with `unauthorized`.
    async fn login_by_email(&self, email: &Email) -> Result<User, Error>;
}

/// Driving port for the authenticated user's own profile.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Fetch the caller's profile.
    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;

    /// Mark the caller's first-login flow complete.
    async fn complete_first_login(&self, user_id: &UserId) -> Result<(), Error>;
}

// ---------------------------------------------------------------------------
// In-memory fixtures
// ---------------------------------------------------------------------------
//
// Fixtures back the no-database server mode and the handler tests. They
// honour the same contracts as the Diesel adapters, including the slot
// uniqueness conflict and the conditional debit.

/// In-memory [`ReservationRepository`] enforcing slot uniqueness.
#[derive(Default)]
pub struct FixtureReservationRepository {
    store: Mutex<HashMap<(NaiveDate, u8), (Uuid, UserId)>>,
}

impl FixtureReservationRepository {
    /// Pre-claim a slot for another user, simulating a lost race.
    pub fn seed(&self, slot: Slot, owner: &UserId) {
        let mut guard = self.store.lock().expect("fixture store poisoned");
        guard.insert((slot.date, slot.hour), (Uuid::new_v4(), owner.clone()));
    }
}

#[async_trait]
impl ReservationRepository for FixtureReservationRepository {
    async fn insert_all(
        &self,
        reservations: &[NewReservation],
    ) -> Result<Vec<Uuid>, ReservationPersistenceError> {
        let mut guard = self.store.lock().expect("fixture store poisoned");
        // All-or-nothing, like the transactional adapter.
        for reservation in reservations {
            let key = (reservation.slot.date, reservation.slot.hour);
            if guard.contains_key(&key) {
                return Err(ReservationPersistenceError::SlotTaken {
                    date: reservation.slot.date,
                    hour: reservation.slot.hour,
                });
            }
        }
        let mut ids = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            let id = Uuid::new_v4();
            guard.insert(
                (reservation.slot.date, reservation.slot.hour),
                (id, reservation.user_id.clone()),
            );
            ids.push(id);
        }
        Ok(ids)
    }

    async fn reserved_hours(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<u8>, ReservationPersistenceError> {
        let guard = self.store.lock().expect("fixture store poisoned");
        let mut hours: Vec<u8> = guard
            .keys()
            .filter(|(slot_date, _)| *slot_date == date)
            .map(|(_, hour)| *hour)
            .collect();
        hours.sort_unstable();
        Ok(hours)
    }

    async fn user_hours_on(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<u8>, ReservationPersistenceError> {
        let guard = self.store.lock().expect("fixture store poisoned");
        let mut hours: Vec<u8> = guard
            .iter()
            .filter(|((slot_date, _), (_, owner))| *slot_date == date && owner == user_id)
            .map(|((_, hour), _)| *hour)
            .collect();
        hours.sort_unstable();
        Ok(hours)
    }
}

/// In-memory [`CreditLedger`] with the conditional-decrement contract.
#[derive(Default)]
pub struct FixtureCreditLedger {
    balances: Mutex<HashMap<UserId, i32>>,
}

impl FixtureCreditLedger {
    /// Set a user's starting balance.
    pub fn set_balance(&self, user_id: &UserId, credits: i32) {
        let mut guard = self.balances.lock().expect("fixture ledger poisoned");
        guard.insert(user_id.clone(), credits);
    }

    /// Read a balance without mutating it.
    pub fn balance(&self, user_id: &UserId) -> Option<i32> {
        let guard = self.balances.lock().expect("fixture ledger poisoned");
        guard.get(user_id).copied()
    }
}

#[async_trait]
impl CreditLedger for FixtureCreditLedger {
    async fn debit(&self, user_id: &UserId, amount: u32) -> Result<Option<i32>, LedgerError> {
        let mut guard = self.balances.lock().expect("fixture ledger poisoned");
        let balance = guard
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::operation(format!("unknown user {user_id}")))?;
        let amount = i32::try_from(amount)
            .map_err(|_| LedgerError::operation("debit amount out of range"))?;
        if *balance < amount {
            return Ok(None);
        }
        *balance -= amount;
        Ok(Some(*balance))
    }

    async fn credit(&self, user_id: &UserId, amount: u32) -> Result<i32, LedgerError> {
        let mut guard = self.balances.lock().expect("fixture ledger poisoned");
        let balance = guard
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::operation(format!("unknown user {user_id}")))?;
        let amount = i32::try_from(amount)
            .map_err(|_| LedgerError::operation("credit amount out of range"))?;
        *balance += amount;
        Ok(*balance)
    }
}

/// In-memory [`UserRepository`].
#[derive(Default)]
pub struct FixtureUserRepository {
    users: Mutex<Vec<User>>,
}

impl FixtureUserRepository {
    /// Register a user in the fixture store.
    pub fn add(&self, user: User) {
        let mut guard = self.users.lock().expect("fixture users poisoned");
        guard.push(user);
    }
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let guard = self.users.lock().expect("fixture users poisoned");
        Ok(guard.iter().find(|user| user.id() == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let guard = self.users.lock().expect("fixture users poisoned");
        Ok(guard.iter().find(|user| user.email() == email).cloned())
    }

    async fn mark_first_login(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        let mut guard = self.users.lock().expect("fixture users poisoned");
        let position = guard.iter().position(|user| user.id() == id);
        match position {
            Some(index) => {
                let current = guard
                    .get(index)
                    .cloned()
                    .ok_or_else(|| UserPersistenceError::query("fixture index out of range"))?;
                let updated = crate::domain::user::User::new(crate::domain::user::UserDraft {
                    id: current.id().clone(),
                    email: current.email().clone(),
                    full_name: current.full_name().to_owned(),
                    credits: current.credits(),
                    is_vip: current.is_vip(),
                    is_active: current.is_active(),
                    first_login_completed: true,
                })
                .map_err(|err| UserPersistenceError::query(err.to_string()))?;
                if let Some(entry) = guard.get_mut(index) {
                    *entry = updated;
                }
                Ok(())
            }
            None => Err(UserPersistenceError::query(format!("unknown user {id}"))),
        }
    }
}

/// In-memory [`MaintenanceSlotRepository`].
#[derive(Default)]
pub struct FixtureMaintenanceSlots {
    rows: Mutex<Vec<BlackoutSlot>>,
}

impl FixtureMaintenanceSlots {
    /// Schedule a maintenance block.
    pub fn add(&self, date: NaiveDate, hour: u8, reason: impl Into<String>) {
        let mut guard = self.rows.lock().expect("fixture maintenance poisoned");
        guard.push(BlackoutSlot {
            date,
            hour,
            reason: reason.into(),
            source: super::blackout::BlackoutSource::Maintenance,
        });
    }
}

#[async_trait]
impl MaintenanceSlotRepository for FixtureMaintenanceSlots {
    async fn slots_for(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BlackoutSlot>, MaintenanceSlotRepositoryError> {
        let guard = self.rows.lock().expect("fixture maintenance poisoned");
        Ok(guard.iter().filter(|row| row.date == date).cloned().collect())
    }
}

/// In-memory [`SystemSettingsRepository`] with a fixed toggle.
#[derive(Debug, Clone, Copy)]
pub struct FixtureSystemSettings {
    recurring_program: bool,
}

impl FixtureSystemSettings {
    /// Settings with the weekend program active.
    pub fn enabled() -> Self {
        Self {
            recurring_program: true,
        }
    }

    /// Settings with the weekend program switched off.
    pub fn disabled() -> Self {
        Self {
            recurring_program: false,
        }
    }
}

#[async_trait]
impl SystemSettingsRepository for FixtureSystemSettings {
    async fn recurring_program_enabled(&self) -> Result<bool, SystemSettingsRepositoryError> {
        Ok(self.recurring_program)
    }
}

/// Dispatcher that records confirmations instead of sending them.
#[derive(Default)]
pub struct RecordingNotificationDispatcher {
    sent: Mutex<Vec<BookingConfirmation>>,
}

impl RecordingNotificationDispatcher {
    /// Confirmations recorded so far.
    pub fn sent(&self) -> Vec<BookingConfirmation> {
        let guard = self.sent.lock().expect("fixture dispatcher poisoned");
        guard.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotificationDispatcher {
    async fn booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        let mut guard = self.sent.lock().expect("fixture dispatcher poisoned");
        guard.push(confirmation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).expect("valid date")
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_repository_rejects_taken_slot_without_partial_insert() {
        let repo = FixtureReservationRepository::default();
        let holder = UserId::random();
        repo.seed(Slot::new(date(4), 10), &holder);

        let requester = UserId::random();
        let batch = vec![
            NewReservation {
                user_id: requester.clone(),
                slot: Slot::new(date(4), 9),
            },
            NewReservation {
                user_id: requester.clone(),
                slot: Slot::new(date(4), 10),
            },
        ];

        let error = repo.insert_all(&batch).await.expect_err("slot conflict");
        assert!(matches!(
            error,
            ReservationPersistenceError::SlotTaken { hour: 10, .. }
        ));
        // The losing batch must leave no trace of its first slot.
        let hours = repo
            .user_hours_on(&requester, date(4))
            .await
            .expect("query");
        assert!(hours.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_ledger_refuses_overdraft() {
        let ledger = FixtureCreditLedger::default();
        let user = UserId::random();
        ledger.set_balance(&user, 1);

        assert_eq!(ledger.debit(&user, 2).await.expect("debit"), None);
        assert_eq!(ledger.balance(&user), Some(1));
        assert_eq!(ledger.debit(&user, 1).await.expect("debit"), Some(0));
        assert_eq!(ledger.credit(&user, 2).await.expect("credit"), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_users_flip_first_login_flag() {
        let repo = FixtureUserRepository::default();
        let user = crate::domain::user::User::new(crate::domain::user::UserDraft {
            id: UserId::random(),
            email: Email::new("leo@example.com").expect("valid email"),
            full_name: "Leo Vidal".to_owned(),
            credits: 3,
            is_vip: false,
            is_active: true,
            first_login_completed: false,
        })
        .expect("valid user");
        let id = user.id().clone();
        repo.add(user);

        repo.mark_first_login(&id).await.expect("mark");
        let reloaded = repo.find_by_id(&id).await.expect("query").expect("present");
        assert!(reloaded.first_login_completed());
    }
}
