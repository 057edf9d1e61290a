//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use chrono::NaiveDate;

use crate::domain::accounts::AccountService;
use crate::domain::admission::{AdmissionDeps, AdmissionService};
use crate::domain::availability::AvailabilityService;
use crate::domain::blackout::BlackoutRegistry;
use crate::domain::catalog::SlotCatalog;
use crate::domain::clock::FixtureClock;
use crate::domain::ports::{
    FixtureCreditLedger, FixtureMaintenanceSlots, FixtureReservationRepository,
    FixtureSystemSettings, FixtureUserRepository, RecordingNotificationDispatcher,
};
use crate::domain::user::{Email, User, UserDraft, UserId};
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Fixture-backed application state with handles onto the stores, so tests
/// can seed users, reservations, and maintenance blocks behind the handlers.
pub struct TestBackend {
    pub users: Arc<FixtureUserRepository>,
    pub reservations: Arc<FixtureReservationRepository>,
    pub ledger: Arc<FixtureCreditLedger>,
    pub maintenance: Arc<FixtureMaintenanceSlots>,
    pub notifier: Arc<RecordingNotificationDispatcher>,
    pub state: HttpState,
}

/// Assemble an [`HttpState`] over in-memory fixtures with a pinned clock.
pub fn test_backend(clock: FixtureClock) -> TestBackend {
    let users = Arc::new(FixtureUserRepository::default());
    let reservations = Arc::new(FixtureReservationRepository::default());
    let ledger = Arc::new(FixtureCreditLedger::default());
    let maintenance = Arc::new(FixtureMaintenanceSlots::default());
    let notifier = Arc::new(RecordingNotificationDispatcher::default());
    let blackouts = BlackoutRegistry::new(
        Arc::clone(&maintenance) as Arc<_>,
        Arc::new(FixtureSystemSettings::enabled()),
    );
    let clock = Arc::new(clock);

    let bookings = Arc::new(AdmissionService::new(AdmissionDeps {
        users: Arc::clone(&users) as Arc<_>,
        reservations: Arc::clone(&reservations) as Arc<_>,
        ledger: Arc::clone(&ledger) as Arc<_>,
        blackouts: blackouts.clone(),
        catalog: SlotCatalog::default(),
        clock: Arc::clone(&clock) as Arc<_>,
        notifier: Arc::clone(&notifier) as Arc<_>,
    }));
    let availability = Arc::new(AvailabilityService::new(
        Arc::clone(&reservations) as Arc<_>,
        blackouts,
        SlotCatalog::default(),
        Arc::clone(&clock) as Arc<_>,
    ));
    let accounts = Arc::new(AccountService::new(Arc::clone(&users) as Arc<_>));

    let state = HttpState::new(
        bookings,
        availability,
        Arc::clone(&accounts) as Arc<_>,
        accounts as Arc<_>,
    );
    TestBackend {
        users,
        reservations,
        ledger,
        maintenance,
        notifier,
        state,
    }
}

/// Register an active user and fund the ledger with the same balance.
pub fn seed_user(backend: &TestBackend, email: &str, credits: i32, is_vip: bool) -> UserId {
    let id = UserId::random();
    let user = User::new(UserDraft {
        id: id.clone(),
        email: Email::new(email).expect("fixture email"),
        full_name: "Clara Ibáñez".to_owned(),
        credits,
        is_vip,
        is_active: true,
        first_login_completed: true,
    })
    .expect("fixture user");
    backend.users.add(user);
    backend.ledger.set_balance(&id, credits);
    id
}

/// Monday 2026-03-16 at 10:00 facility time: a plain weekday inside every
/// booking window.
pub fn weekday_clock() -> FixtureClock {
    FixtureClock::at_local(
        NaiveDate::from_ymd_opt(2026, 3, 16).expect("valid date"),
        10,
    )
}
