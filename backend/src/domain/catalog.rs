//! Slot catalog: the closed set of reservable hours and booking windows.
//!
//! The bookable range and the per-class booking windows are deployment
//! constants. They are configured once at startup and never derived from
//! reservation state.

use std::ops::RangeInclusive;

use chrono::NaiveDate;

use super::clock::FacilityClock;

/// Default bookable hours (inclusive).
pub const DEFAULT_OPEN_HOUR: u8 = 6;
/// Default last bookable hour (inclusive).
pub const DEFAULT_CLOSE_HOUR: u8 = 21;
/// Default window in which standard users may submit bookings.
pub const DEFAULT_STANDARD_WINDOW: RangeInclusive<u8> = 8..=16;
/// Default window in which VIP users may submit bookings.
pub const DEFAULT_VIP_WINDOW: RangeInclusive<u8> = 8..=20;

/// Closed interval of local hours in which a user class may submit bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingWindow {
    opens: u8,
    closes: u8,
}

impl BookingWindow {
    /// Build a window from an inclusive hour range.
    pub fn new(range: RangeInclusive<u8>) -> Self {
        Self {
            opens: *range.start(),
            closes: *range.end(),
        }
    }

    /// First hour (inclusive) at which submissions are accepted.
    pub fn opens(&self) -> u8 {
        self.opens
    }

    /// Last hour (inclusive) at which submissions are accepted.
    pub fn closes(&self) -> u8 {
        self.closes
    }

    /// Whether the given local hour falls inside the window.
    pub fn contains(&self, hour: u8) -> bool {
        (self.opens..=self.closes).contains(&hour)
    }
}

/// Facility-wide slot catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCatalog {
    open_hour: u8,
    close_hour: u8,
    standard_window: BookingWindow,
    vip_window: BookingWindow,
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_OPEN_HOUR..=DEFAULT_CLOSE_HOUR,
            DEFAULT_STANDARD_WINDOW,
            DEFAULT_VIP_WINDOW,
        )
    }
}

impl SlotCatalog {
    /// Build a catalog from deployment constants.
    pub fn new(
        bookable: RangeInclusive<u8>,
        standard_window: RangeInclusive<u8>,
        vip_window: RangeInclusive<u8>,
    ) -> Self {
        Self {
            open_hour: *bookable.start(),
            close_hour: *bookable.end(),
            standard_window: BookingWindow::new(standard_window),
            vip_window: BookingWindow::new(vip_window),
        }
    }

    /// The fixed ordered sequence of bookable integer hours.
    pub fn hours_of_day(&self) -> Vec<u8> {
        (self.open_hour..=self.close_hour).collect()
    }

    /// Whether the hour is a bookable slot at this facility.
    pub fn contains(&self, hour: u8) -> bool {
        (self.open_hour..=self.close_hour).contains(&hour)
    }

    /// Booking window for the given user class.
    pub fn window_for(&self, is_vip: bool) -> &BookingWindow {
        if is_vip {
            &self.vip_window
        } else {
            &self.standard_window
        }
    }

    /// Whether the slot already lies in the past.
    ///
    /// Only slots on today's date can be past; tomorrow's slots are never
    /// past regardless of the current hour.
    pub fn is_past(&self, date: NaiveDate, hour: u8, clock: &dyn FacilityClock) -> bool {
        date == clock.today() && hour < clock.current_hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixtureClock;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[rstest]
    fn hours_of_day_is_the_full_inclusive_range() {
        let catalog = SlotCatalog::default();
        let hours = catalog.hours_of_day();
        assert_eq!(hours.first(), Some(&DEFAULT_OPEN_HOUR));
        assert_eq!(hours.last(), Some(&DEFAULT_CLOSE_HOUR));
        assert_eq!(hours.len(), 16);
    }

    #[rstest]
    #[case(5, false)]
    #[case(6, true)]
    #[case(21, true)]
    #[case(22, false)]
    fn contains_respects_bounds(#[case] hour: u8, #[case] expected: bool) {
        assert_eq!(SlotCatalog::default().contains(hour), expected);
    }

    #[rstest]
    fn vip_window_extends_past_standard_close() {
        let catalog = SlotCatalog::default();
        assert!(!catalog.window_for(false).contains(18));
        assert!(catalog.window_for(true).contains(18));
        assert!(!catalog.window_for(true).contains(21));
    }

    #[rstest]
    #[case(9, true)]
    #[case(10, false)]
    #[case(11, false)]
    fn today_slots_age_out_with_the_clock(#[case] hour: u8, #[case] past: bool) {
        let today = date(2026, 3, 16);
        let clock = FixtureClock::at_local(today, 10);
        assert_eq!(SlotCatalog::default().is_past(today, hour, &clock), past);
    }

    #[rstest]
    fn tomorrow_is_never_past() {
        let clock = FixtureClock::at_local(date(2026, 3, 16), 23);
        let catalog = SlotCatalog::default();
        assert!(!catalog.is_past(date(2026, 3, 17), 6, &clock));
    }
}
