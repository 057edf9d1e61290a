//! Builders for the HTTP state and its repository-backed services.

use std::sync::Arc;

use actix_web::web;

use crate::domain::accounts::AccountService;
use crate::domain::admission::{AdmissionDeps, AdmissionService};
use crate::domain::availability::AvailabilityService;
use crate::domain::blackout::BlackoutRegistry;
use crate::domain::clock::{FacilityClock, SystemClock};
use crate::domain::ports::{
    CreditLedger, FixtureCreditLedger, FixtureMaintenanceSlots, FixtureReservationRepository,
    FixtureSystemSettings, FixtureUserRepository, MaintenanceSlotRepository,
    NotificationDispatcher, ReservationRepository, SystemSettingsRepository, UserRepository,
};
use crate::domain::user::{Email, User, UserDraft, UserId};
use crate::inbound::http::state::HttpState;
use crate::outbound::notify::{HttpNotificationRelay, LogOnlyNotificationRelay};
use crate::outbound::persistence::{
    DieselCreditLedger, DieselMaintenanceRepository, DieselReservationRepository,
    DieselSettingsRepository, DieselUserRepository,
};

use super::ServerConfig;

const DEMO_USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_FULL_NAME: &str = "Ana Torres";
const DEMO_CREDITS: i32 = 10;

/// Driven ports backing the domain services, either database-backed or
/// in-memory fixtures.
struct DomainPorts {
    users: Arc<dyn UserRepository>,
    reservations: Arc<dyn ReservationRepository>,
    ledger: Arc<dyn CreditLedger>,
    maintenance: Arc<dyn MaintenanceSlotRepository>,
    settings: Arc<dyn SystemSettingsRepository>,
}

fn diesel_ports(pool: &crate::outbound::persistence::DbPool) -> DomainPorts {
    DomainPorts {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        reservations: Arc::new(DieselReservationRepository::new(pool.clone())),
        ledger: Arc::new(DieselCreditLedger::new(pool.clone())),
        maintenance: Arc::new(DieselMaintenanceRepository::new(pool.clone())),
        settings: Arc::new(DieselSettingsRepository::new(pool.clone())),
    }
}

/// Demo account available when no database is configured.
///
/// # Panics
/// Never: all fields are valid constants.
fn demo_user() -> User {
    let id = UserId::new(DEMO_USER_ID)
        .unwrap_or_else(|err| unreachable!("demo user id constant is valid: {err}"));
    let email = Email::new(DEMO_EMAIL)
        .unwrap_or_else(|err| unreachable!("demo email constant is valid: {err}"));
    User::new(UserDraft {
        id,
        email,
        full_name: DEMO_FULL_NAME.to_owned(),
        credits: DEMO_CREDITS,
        is_vip: false,
        is_active: true,
        first_login_completed: false,
    })
    .unwrap_or_else(|err| unreachable!("demo user constants are valid: {err}"))
}

fn fixture_ports() -> DomainPorts {
    let user = demo_user();
    let users = FixtureUserRepository::default();
    let ledger = FixtureCreditLedger::default();
    ledger.set_balance(user.id(), user.credits());
    users.add(user);

    DomainPorts {
        users: Arc::new(users),
        reservations: Arc::new(FixtureReservationRepository::default()),
        ledger: Arc::new(ledger),
        maintenance: Arc::new(FixtureMaintenanceSlots::default()),
        settings: Arc::new(FixtureSystemSettings::enabled()),
    }
}

/// Select the confirmation dispatcher from configuration.
///
/// # Errors
/// Returns [`std::io::Error`] when the relay HTTP client cannot be built.
fn build_notifier(config: &ServerConfig) -> std::io::Result<Arc<dyn NotificationDispatcher>> {
    match &config.notify_relay {
        Some(endpoint) => {
            let relay = HttpNotificationRelay::new(endpoint.clone()).map_err(|err| {
                std::io::Error::other(format!("notification relay setup failed: {err}"))
            })?;
            Ok(Arc::new(relay))
        }
        None => Ok(Arc::new(LogOnlyNotificationRelay)),
    }
}

/// Build the shared HTTP state from configured ports and fixture fallbacks.
///
/// # Errors
/// Propagates [`std::io::Error`] from notifier construction.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let ports = match &config.db_pool {
        Some(pool) => diesel_ports(pool),
        None => fixture_ports(),
    };
    let notifier = build_notifier(config)?;

    let blackouts = BlackoutRegistry::new(ports.maintenance, ports.settings);
    let clock: Arc<dyn FacilityClock> = Arc::new(SystemClock);

    let bookings = Arc::new(AdmissionService::new(AdmissionDeps {
        users: ports.users.clone(),
        reservations: ports.reservations.clone(),
        ledger: ports.ledger,
        blackouts: blackouts.clone(),
        catalog: config.catalog.clone(),
        clock: clock.clone(),
        notifier,
    }));
    let availability = Arc::new(AvailabilityService::new(
        ports.reservations,
        blackouts,
        config.catalog.clone(),
        clock,
    ));
    let accounts = Arc::new(AccountService::new(ports.users));

    Ok(web::Data::new(HttpState::new(
        bookings,
        availability,
        accounts.clone(),
        accounts,
    )))
}
