//! Facility clock: resolves "now" in the facility's fixed time zone.
//!
//! The facility runs on a fixed UTC-5 offset with no daylight saving, so
//! there are no transitions to model. Calendar days and the current hour are
//! derived from the zone-adjusted instant's local fields; truncating a
//! UTC-normalised string instead would shift the day near local midnight.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

/// Seconds west of UTC for the facility zone (UTC-5, no DST).
const FACILITY_OFFSET_SECONDS: i32 = 5 * 3600;

/// Fixed facility offset.
///
/// # Panics
/// Never: the offset constant is within chrono's accepted range.
pub fn facility_offset() -> FixedOffset {
    FixedOffset::west_opt(FACILITY_OFFSET_SECONDS)
        .unwrap_or_else(|| unreachable!("facility offset constant is valid"))
}

/// Clock port resolving the current instant in facility-local time.
///
/// `today`, `tomorrow`, and `current_hour` are all derived from [`now`]
/// through default methods so every implementation stays internally
/// consistent.
///
/// [`now`]: FacilityClock::now
pub trait FacilityClock: Send + Sync {
    /// Current instant, already adjusted to the facility zone.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Calendar day of the facility-local "now".
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Calendar day after [`today`](FacilityClock::today).
    fn tomorrow(&self) -> NaiveDate {
        self.today()
            .succ_opt()
            .unwrap_or_else(|| unreachable!("calendar does not end"))
    }

    /// Facility-local hour of day, 0-23.
    fn current_hour(&self) -> u8 {
        // Timelike::hour is always < 24.
        self.now().hour() as u8
    }
}

/// Production clock reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl FacilityClock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&facility_offset())
    }
}

/// Deterministic clock pinned to a single instant, for tests and fixtures.
#[derive(Debug, Clone, Copy)]
pub struct FixtureClock {
    instant: DateTime<FixedOffset>,
}

impl FixtureClock {
    /// Pin the clock to the given facility-local instant.
    pub fn at(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }

    /// Pin the clock to a facility-local date and hour.
    ///
    /// # Panics
    /// Panics if `hour` is not a valid hour of day; fixtures supply
    /// constants.
    pub fn at_local(date: NaiveDate, hour: u8) -> Self {
        let naive = date
            .and_hms_opt(u32::from(hour), 0, 0)
            .unwrap_or_else(|| panic!("invalid fixture hour: {hour}"));
        let instant = naive
            .and_local_timezone(facility_offset())
            .single()
            .unwrap_or_else(|| unreachable!("fixed offsets are unambiguous"));
        Self { instant }
    }
}

impl FacilityClock for FixtureClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}
