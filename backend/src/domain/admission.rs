//! Admission engine: the booking rule evaluator and transactional committer.
//!
//! Every rule is re-evaluated here from fresh reads regardless of what the
//! client showed the user; grid previews are a UX optimisation only. Rules
//! run in a fixed order and the first failing check wins. Checks before the
//! debit are pure reads so a denial leaves no side effect; only failures
//! after the debit need the compensating refund.

use std::sync::Arc;

use serde_json::json;
use tracing::{error, warn};

use super::Error;
use super::blackout::{BlackoutRegistry, BlackoutSlot, BlackoutSource};
use super::catalog::SlotCatalog;
use super::clock::FacilityClock;
use super::ports::{
    BookingCommand, BookingConfirmation, BookingOutcome, BookingRequest, CreditLedger,
    LedgerError, NotificationDispatcher, ReservationPersistenceError, ReservationRepository,
    UserPersistenceError, UserRepository,
};
use super::reservation::{DAILY_CAP, NewReservation, Selection, Slot};
use super::user::User;
use async_trait::async_trait;

/// Collaborators the admission engine orchestrates.
pub struct AdmissionDeps {
    pub users: Arc<dyn UserRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub ledger: Arc<dyn CreditLedger>,
    pub blackouts: BlackoutRegistry,
    pub catalog: SlotCatalog,
    pub clock: Arc<dyn FacilityClock>,
    pub notifier: Arc<dyn NotificationDispatcher>,
}

/// The booking rule engine.
///
/// Stateless between requests: all coordination with concurrent submissions
/// happens through the storage layer (the conditional debit and the
/// `(date, hour)` uniqueness constraint).
pub struct AdmissionService {
    users: Arc<dyn UserRepository>,
    reservations: Arc<dyn ReservationRepository>,
    ledger: Arc<dyn CreditLedger>,
    blackouts: BlackoutRegistry,
    catalog: SlotCatalog,
    clock: Arc<dyn FacilityClock>,
    notifier: Arc<dyn NotificationDispatcher>,
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

fn map_reservation_error(error: ReservationPersistenceError) -> Error {
    match error {
        ReservationPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("reservation repository unavailable: {message}"))
        }
        ReservationPersistenceError::Query { message } => {
            Error::internal(format!("reservation repository error: {message}"))
        }
        ReservationPersistenceError::SlotTaken { date, hour } => {
            Error::conflict("El horario acaba de ser tomado por otro usuario").with_details(json!({
                "rule": "slot_taken",
                "date": date.to_string(),
                "hour": hour,
            }))
        }
    }
}

fn map_ledger_error(error: LedgerError) -> Error {
    match error {
        LedgerError::Connection { message } => {
            Error::service_unavailable(format!("credit ledger unavailable: {message}"))
        }
        LedgerError::Operation { message } => {
            Error::internal(format!("credit ledger error: {message}"))
        }
    }
}

fn insufficient_credits() -> Error {
    Error::conflict("No tienes créditos suficientes").with_details(json!({
        "rule": "insufficient_credits",
    }))
}

impl AdmissionService {
    /// Assemble the engine from its collaborators.
    pub fn new(deps: AdmissionDeps) -> Self {
        let AdmissionDeps {
            users,
            reservations,
            ledger,
            blackouts,
            catalog,
            clock,
            notifier,
        } = deps;
        Self {
            users,
            reservations,
            ledger,
            blackouts,
            catalog,
            clock,
            notifier,
        }
    }

    /// Shape validation: 1-2 distinct, same-day, consecutive slots.
    fn validate_selection(&self, slots: Vec<Slot>) -> Result<Selection, Error> {
        Selection::new(slots).map_err(|cause| {
            Error::invalid_request("Selecciona como máximo 2 horas consecutivas del mismo día")
                .with_details(json!({
                    "rule": "selection_shape",
                    "cause": cause.to_string(),
                }))
        })
    }

    /// The grid spans today and tomorrow only; each slot must fall on one of
    /// those dates, inside the bookable range, and not already in the past.
    fn validate_slots(&self, selection: &Selection) -> Result<(), Error> {
        let today = self.clock.today();
        let tomorrow = self.clock.tomorrow();
        let date = selection.date();
        if date != today && date != tomorrow {
            return Err(
                Error::invalid_request("Solo puedes reservar para hoy o mañana").with_details(
                    json!({
                        "rule": "date_out_of_range",
                        "date": date.to_string(),
                    }),
                ),
            );
        }
        for slot in selection.slots() {
            if !self.catalog.contains(slot.hour) {
                return Err(Error::invalid_request(
                    "La hora seleccionada está fuera del horario de la cancha",
                )
                .with_details(json!({
                    "rule": "hour_out_of_range",
                    "hour": slot.hour,
                })));
            }
            if self.catalog.is_past(slot.date, slot.hour, self.clock.as_ref()) {
                return Err(Error::invalid_request(
                    "No puedes reservar una hora que ya pasó",
                )
                .with_details(json!({
                    "rule": "past_slot",
                    "hour": slot.hour,
                })));
            }
        }
        Ok(())
    }

    /// Submissions are only accepted while the caller's booking window is
    /// open, with distinct before-open and after-close denials.
    fn check_window(&self, user: &User) -> Result<(), Error> {
        let window = self.catalog.window_for(user.is_vip());
        let now = self.clock.current_hour();
        if now < window.opens() {
            return Err(Error::conflict(format!(
                "Las reservas abren a las {}:00",
                window.opens()
            ))
            .with_details(json!({
                "rule": "window_before_open",
                "opens": window.opens(),
            })));
        }
        if now > window.closes() {
            return Err(Error::conflict(format!(
                "Las reservas cierran a las {}:00",
                window.closes()
            ))
            .with_details(json!({
                "rule": "window_after_close",
                "closes": window.closes(),
            })));
        }
        Ok(())
    }

    /// A user may not hold the same hour on two adjacent calendar days;
    /// within the rolling two-day grid that would let one user pin an hour
    /// indefinitely.
    async fn check_cross_day(&self, user: &User, selection: &Selection) -> Result<(), Error> {
        let date = selection.date();
        let adjacent = [date.pred_opt(), date.succ_opt()];
        for day in adjacent.into_iter().flatten() {
            let held = self
                .reservations
                .user_hours_on(user.id(), day)
                .await
                .map_err(map_reservation_error)?;
            for slot in selection.slots() {
                if held.contains(&slot.hour) {
                    return Err(Error::conflict(
                        "Ya tienes una reserva a esta hora en el día anterior o siguiente",
                    )
                    .with_details(json!({
                        "rule": "cross_day_same_hour",
                        "hour": slot.hour,
                        "held_on": day.to_string(),
                    })));
                }
            }
        }
        Ok(())
    }

    /// Confirmed reservations on the target date plus this submission must
    /// stay within the daily cap.
    async fn check_daily_cap(&self, user: &User, selection: &Selection) -> Result<(), Error> {
        let held = self
            .reservations
            .user_hours_on(user.id(), selection.date())
            .await
            .map_err(map_reservation_error)?;
        if held.len() + selection.slots().len() > DAILY_CAP {
            return Err(
                Error::conflict(format!("Máximo {DAILY_CAP} horas por día")).with_details(json!({
                    "rule": "daily_cap",
                    "held": held.len(),
                    "requested": selection.slots().len(),
                })),
            );
        }
        Ok(())
    }

    /// None of the requested slots may be blacked out.
    async fn check_blackouts(&self, selection: &Selection) -> Result<(), Error> {
        let blackouts = self.blackouts.blackouts_for(selection.date()).await?;
        for slot in selection.slots() {
            if let Some(hit) = blackouts.iter().find(|b| b.hour == slot.hour) {
                return Err(blackout_denial(hit, slot));
            }
        }
        Ok(())
    }

    /// Refund a debit that can no longer back a reservation. Failure to
    /// refund is logged loudly; the caller still reports the original error.
    async fn refund(&self, user: &User, amount: u32) {
        if let Err(refund_error) = self.ledger.credit(user.id(), amount).await {
            error!(
                user_id = %user.id(),
                amount,
                error = %refund_error,
                "compensating refund failed; balance requires manual correction"
            );
        }
    }

    /// Dispatch the confirmation without blocking or failing the booking.
    fn notify(&self, user: &User, selection: &Selection, credits_remaining: i32) {
        let confirmation = BookingConfirmation {
            email: user.email().clone(),
            full_name: user.full_name().to_owned(),
            slots: selection.slots().to_vec(),
            credits_remaining,
        };
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(dispatch_error) = notifier.booking_confirmed(&confirmation).await {
                warn!(error = %dispatch_error, "booking confirmation dispatch failed");
            }
        });
    }
}

fn blackout_denial(hit: &BlackoutSlot, slot: &Slot) -> Error {
    let message = match hit.source {
        BlackoutSource::Maintenance => "Horario bloqueado por mantenimiento",
        BlackoutSource::RecurringProgram => "Horario reservado para la escuela de fin de semana",
    };
    Error::conflict(message).with_details(json!({
        "rule": "blackout",
        "source": hit.source,
        "hour": slot.hour,
        "reason": hit.reason,
    }))
}

#[async_trait]
impl BookingCommand for AdmissionService {
    async fn submit(&self, request: BookingRequest) -> Result<BookingOutcome, Error> {
        let BookingRequest { user_id, slots } = request;

        let user = self
            .users
            .find_by_id(&user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("Sesión no válida"))?;

        let selection = self.validate_selection(slots)?;
        self.validate_slots(&selection)?;
        self.check_window(&user)?;
        self.check_cross_day(&user, &selection).await?;
        self.check_daily_cap(&user, &selection).await?;
        self.check_blackouts(&selection).await?;

        // Pure pre-check; the conditional debit below is authoritative.
        let cost = selection.hour_count();
        if user.credits() < cost as i32 {
            return Err(insufficient_credits());
        }

        let balance = match self.ledger.debit(user.id(), cost).await {
            Ok(Some(balance)) => balance,
            Ok(None) => return Err(insufficient_credits()),
            Err(ledger_error) => return Err(map_ledger_error(ledger_error)),
        };

        let rows: Vec<NewReservation> = selection
            .slots()
            .iter()
            .map(|slot| NewReservation {
                user_id: user.id().clone(),
                slot: *slot,
            })
            .collect();

        let reservation_ids = match self.reservations.insert_all(&rows).await {
            Ok(ids) => ids,
            Err(insert_error) => {
                // The debit already landed; undo it before reporting.
                self.refund(&user, cost).await;
                return Err(map_reservation_error(insert_error));
            }
        };

        self.notify(&user, &selection, balance);

        Ok(BookingOutcome {
            reservation_ids,
            credits: balance,
        })
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
