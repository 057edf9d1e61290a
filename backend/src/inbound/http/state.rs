//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AvailabilityQuery, BookingCommand, LoginService, ProfileService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub bookings: Arc<dyn BookingCommand>,
    pub availability: Arc<dyn AvailabilityQuery>,
    pub login: Arc<dyn LoginService>,
    pub profile: Arc<dyn ProfileService>,
}

impl HttpState {
    /// Construct state from the driving ports.
    pub fn new(
        bookings: Arc<dyn BookingCommand>,
        availability: Arc<dyn AvailabilityQuery>,
        login: Arc<dyn LoginService>,
        profile: Arc<dyn ProfileService>,
    ) -> Self {
        Self {
            bookings,
            availability,
            login,
            profile,
        }
    }
}
