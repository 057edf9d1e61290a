//! Availability read model for the two-day booking grid.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use super::Error;
use super::blackout::BlackoutRegistry;
use super::catalog::SlotCatalog;
use super::clock::FacilityClock;
use super::ports::{
    AvailabilityQuery, DayAvailability, ReservationPersistenceError, ReservationRepository,
};

/// Serves the grid snapshot for a single day.
///
/// Purely advisory: the admission engine re-reads everything at submission
/// time, so a stale snapshot can never admit an invalid booking.
pub struct AvailabilityService {
    reservations: Arc<dyn ReservationRepository>,
    blackouts: BlackoutRegistry,
    catalog: SlotCatalog,
    clock: Arc<dyn FacilityClock>,
}

fn map_reservation_error(error: ReservationPersistenceError) -> Error {
    match error {
        ReservationPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("reservation repository unavailable: {message}"))
        }
        ReservationPersistenceError::Query { message } => {
            Error::internal(format!("reservation repository error: {message}"))
        }
        // reserved_hours never inserts, so a conflict here is a bug.
        ReservationPersistenceError::SlotTaken { date, hour } => Error::internal(format!(
            "unexpected slot conflict reading availability for {date} {hour}:00"
        )),
    }
}

impl AvailabilityService {
    /// Assemble the read model from its collaborators.
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        blackouts: BlackoutRegistry,
        catalog: SlotCatalog,
        clock: Arc<dyn FacilityClock>,
    ) -> Self {
        Self {
            reservations,
            blackouts,
            catalog,
            clock,
        }
    }
}

#[async_trait]
impl AvailabilityQuery for AvailabilityService {
    async fn day(&self, date: NaiveDate) -> Result<DayAvailability, Error> {
        let today = self.clock.today();
        let tomorrow = self.clock.tomorrow();
        if date != today && date != tomorrow {
            return Err(
                Error::invalid_request("Solo puedes consultar hoy o mañana").with_details(json!({
                    "rule": "date_out_of_range",
                    "date": date.to_string(),
                })),
            );
        }

        let reserved_hours = self
            .reservations
            .reserved_hours(date)
            .await
            .map_err(map_reservation_error)?;
        let blackouts = self.blackouts.blackouts_for(date).await?;

        Ok(DayAvailability {
            date,
            hours: self.catalog.hours_of_day(),
            reserved_hours,
            blackouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::blackout::BlackoutSource;
    use crate::domain::clock::FixtureClock;
    use crate::domain::ports::{
        FixtureMaintenanceSlots, FixtureReservationRepository, FixtureSystemSettings,
    };
    use crate::domain::reservation::Slot;
    use crate::domain::user::UserId;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn service(
        reservations: Arc<FixtureReservationRepository>,
        maintenance: Arc<FixtureMaintenanceSlots>,
        clock: FixtureClock,
    ) -> AvailabilityService {
        let blackouts = BlackoutRegistry::new(
            maintenance as Arc<_>,
            Arc::new(FixtureSystemSettings::enabled()),
        );
        AvailabilityService::new(
            reservations as Arc<_>,
            blackouts,
            SlotCatalog::default(),
            Arc::new(clock),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn snapshot_combines_reservations_and_blackouts() {
        let friday = date(2026, 3, 20);
        let saturday = date(2026, 3, 21);
        let reservations = Arc::new(FixtureReservationRepository::default());
        reservations.seed(Slot::new(saturday, 14), &UserId::random());
        let maintenance = Arc::new(FixtureMaintenanceSlots::default());
        maintenance.add(saturday, 16, "Pintura de líneas");

        let service = service(
            reservations,
            maintenance,
            FixtureClock::at_local(friday, 10),
        );
        let day = service.day(saturday).await.expect("snapshot");

        assert_eq!(day.date, saturday);
        assert_eq!(day.hours.first(), Some(&6));
        assert_eq!(day.reserved_hours, vec![14]);
        let program_hours: Vec<u8> = day
            .blackouts
            .iter()
            .filter(|b| b.source == BlackoutSource::RecurringProgram)
            .map(|b| b.hour)
            .collect();
        assert_eq!(program_hours, vec![8, 9, 10, 11]);
        assert!(
            day.blackouts
                .iter()
                .any(|b| b.source == BlackoutSource::Maintenance && b.hour == 16)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn dates_outside_the_grid_are_rejected() {
        let service = service(
            Arc::new(FixtureReservationRepository::default()),
            Arc::new(FixtureMaintenanceSlots::default()),
            FixtureClock::at_local(date(2026, 3, 16), 10),
        );

        let error = service.day(date(2026, 3, 19)).await.expect_err("denied");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }
}
