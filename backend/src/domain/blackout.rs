//! Blackout registry: maintenance blocks and the recurring weekend program.
//!
//! Recurring-program blackouts are derived, never stored. The derivation is
//! a single pure function so the availability preview and the admission
//! check can never disagree about which hours a program removes.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::Error;
use super::ports::{
    MaintenanceSlotRepository, MaintenanceSlotRepositoryError, SystemSettingsRepository,
    SystemSettingsRepositoryError,
};

/// Hours removed by the weekend clinic program (inclusive).
const PROGRAM_HOURS: std::ops::RangeInclusive<u8> = 8..=11;

/// Display label attached to derived program blackouts.
const PROGRAM_REASON: &str = "Escuela de tenis de fin de semana";

/// Origin of a blackout entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlackoutSource {
    /// Persisted maintenance row scheduled by facility staff.
    Maintenance,
    /// Ephemeral entry synthesised from the weekend program rule.
    RecurringProgram,
}

/// A slot rendered unbookable independent of reservation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackoutSlot {
    /// Calendar day the blackout applies to.
    pub date: NaiveDate,
    /// Blocked hour of day.
    pub hour: u8,
    /// Human-readable reason shown on the grid.
    pub reason: String,
    /// Where the entry came from.
    pub source: BlackoutSource,
}

/// Hours the recurring weekend program removes on the given date.
///
/// Pure and deterministic: Saturday and Sunday block hours 8 through 11,
/// every other weekday blocks nothing. Both the availability preview and
/// the authoritative admission path call this same function.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use courtbook::domain::blackout::recurring_program_hours;
///
/// let saturday = NaiveDate::from_ymd_opt(2026, 3, 21).unwrap();
/// assert_eq!(recurring_program_hours(saturday), vec![8, 9, 10, 11]);
///
/// let monday = NaiveDate::from_ymd_opt(2026, 3, 23).unwrap();
/// assert!(recurring_program_hours(monday).is_empty());
/// ```
pub fn recurring_program_hours(date: NaiveDate) -> Vec<u8> {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => PROGRAM_HOURS.collect(),
        _ => Vec::new(),
    }
}

/// Read model combining persisted maintenance rows with derived program
/// entries.
#[derive(Clone)]
pub struct BlackoutRegistry {
    maintenance: Arc<dyn MaintenanceSlotRepository>,
    settings: Arc<dyn SystemSettingsRepository>,
}

fn map_maintenance_error(error: MaintenanceSlotRepositoryError) -> Error {
    match error {
        MaintenanceSlotRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("maintenance repository unavailable: {message}"))
        }
        MaintenanceSlotRepositoryError::Query { message } => {
            Error::internal(format!("maintenance repository error: {message}"))
        }
    }
}

fn map_settings_error(error: SystemSettingsRepositoryError) -> Error {
    match error {
        SystemSettingsRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("settings repository unavailable: {message}"))
        }
        SystemSettingsRepositoryError::Query { message } => {
            Error::internal(format!("settings repository error: {message}"))
        }
    }
}

impl BlackoutRegistry {
    /// Create a registry over the maintenance and settings ports.
    pub fn new(
        maintenance: Arc<dyn MaintenanceSlotRepository>,
        settings: Arc<dyn SystemSettingsRepository>,
    ) -> Self {
        Self {
            maintenance,
            settings,
        }
    }

    /// All blackouts in effect for the date: persisted maintenance rows plus
    /// derived program entries when the program is enabled.
    pub async fn blackouts_for(&self, date: NaiveDate) -> Result<Vec<BlackoutSlot>, Error> {
        let mut blackouts = self
            .maintenance
            .slots_for(date)
            .await
            .map_err(map_maintenance_error)?;

        let program_enabled = self
            .settings
            .recurring_program_enabled()
            .await
            .map_err(map_settings_error)?;

        if program_enabled {
            blackouts.extend(recurring_program_hours(date).into_iter().map(|hour| {
                BlackoutSlot {
                    date,
                    hour,
                    reason: PROGRAM_REASON.to_owned(),
                    source: BlackoutSource::RecurringProgram,
                }
            }));
        }

        Ok(blackouts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureMaintenanceSlots, FixtureSystemSettings};
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[rstest]
    #[case(date(2026, 3, 21), vec![8, 9, 10, 11])] // Saturday
    #[case(date(2026, 3, 22), vec![8, 9, 10, 11])] // Sunday
    #[case(date(2026, 3, 23), vec![])] // Monday
    #[case(date(2026, 3, 27), vec![])] // Friday
    fn program_blocks_weekend_mornings(#[case] day: NaiveDate, #[case] expected: Vec<u8>) {
        assert_eq!(recurring_program_hours(day), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn registry_merges_maintenance_and_program_rows() {
        let saturday = date(2026, 3, 21);
        let maintenance = FixtureMaintenanceSlots::default();
        maintenance.add(saturday, 14, "Cambio de red");
        let registry = BlackoutRegistry::new(
            Arc::new(maintenance),
            Arc::new(FixtureSystemSettings::enabled()),
        );

        let blackouts = registry.blackouts_for(saturday).await.expect("blackouts");
        let maintenance_hours: Vec<u8> = blackouts
            .iter()
            .filter(|b| b.source == BlackoutSource::Maintenance)
            .map(|b| b.hour)
            .collect();
        let program_hours: Vec<u8> = blackouts
            .iter()
            .filter(|b| b.source == BlackoutSource::RecurringProgram)
            .map(|b| b.hour)
            .collect();
        assert_eq!(maintenance_hours, vec![14]);
        assert_eq!(program_hours, vec![8, 9, 10, 11]);
    }

    #[rstest]
    #[tokio::test]
    async fn disabled_program_leaves_only_maintenance_rows() {
        let saturday = date(2026, 3, 21);
        let registry = BlackoutRegistry::new(
            Arc::new(FixtureMaintenanceSlots::default()),
            Arc::new(FixtureSystemSettings::disabled()),
        );

        let blackouts = registry.blackouts_for(saturday).await.expect("blackouts");
        assert!(blackouts.is_empty());
    }
}
