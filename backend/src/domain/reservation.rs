//! Reservation aggregate and the transient booking selection.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Most hours a user may hold on one calendar day, confirmed plus pending.
pub const DAILY_CAP: usize = 2;

/// A single bookable (date, hour) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Calendar day in facility-local time.
    pub date: NaiveDate,
    /// Hour of day, 0-23.
    pub hour: u8,
}

impl Slot {
    /// Construct a slot.
    pub fn new(date: NaiveDate, hour: u8) -> Self {
        Self { date, hour }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00", self.date, self.hour)
    }
}

/// Validation errors raised when shaping a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionValidationError {
    Empty,
    TooManySlots { max: usize },
    MixedDates,
    NonConsecutiveHours,
    DuplicateSlot,
    InvalidHour { hour: u8 },
}

impl fmt::Display for SelectionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "selection must contain at least one slot"),
            Self::TooManySlots { max } => {
                write!(f, "selection must contain at most {max} slots")
            }
            Self::MixedDates => write!(f, "selected slots must share the same date"),
            Self::NonConsecutiveHours => write!(f, "selected hours must be consecutive"),
            Self::DuplicateSlot => write!(f, "selected slots must be distinct"),
            Self::InvalidHour { hour } => write!(f, "{hour} is not a valid hour of day"),
        }
    }
}

impl std::error::Error for SelectionValidationError {}

/// Ordered set of at most two consecutive same-day slots proposed in one
/// submission. Never persisted; fully validated before commit and discarded
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    slots: Vec<Slot>,
}

impl Selection {
    /// Validate the shape of a submission: 1-2 slots, valid hours, and when
    /// two are present, the same date and numerically consecutive hours.
    pub fn new(mut slots: Vec<Slot>) -> Result<Self, SelectionValidationError> {
        if slots.is_empty() {
            return Err(SelectionValidationError::Empty);
        }
        if slots.len() > DAILY_CAP {
            return Err(SelectionValidationError::TooManySlots { max: DAILY_CAP });
        }
        if let Some(bad) = slots.iter().find(|slot| slot.hour > 23) {
            return Err(SelectionValidationError::InvalidHour { hour: bad.hour });
        }

        slots.sort_by_key(|slot| (slot.date, slot.hour));
        if let [first, second] = slots.as_slice() {
            if first == second {
                return Err(SelectionValidationError::DuplicateSlot);
            }
            if first.date != second.date {
                return Err(SelectionValidationError::MixedDates);
            }
            if second.hour - first.hour != 1 {
                return Err(SelectionValidationError::NonConsecutiveHours);
            }
        }

        Ok(Self { slots })
    }

    /// Slots in ascending hour order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The single date every slot in the selection shares.
    ///
    /// # Panics
    /// Never: the constructor rejects empty selections.
    pub fn date(&self) -> NaiveDate {
        self.slots
            .first()
            .map(|slot| slot.date)
            .unwrap_or_else(|| unreachable!("selections are never empty"))
    }

    /// Number of hours (and therefore credits) this submission costs.
    pub fn hour_count(&self) -> u32 {
        self.slots.len() as u32
    }
}

/// One confirmed booked hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    id: Uuid,
    user_id: UserId,
    slot: Slot,
    created_at: DateTime<Utc>,
}

impl Reservation {
    /// Rehydrate a reservation from persisted fields.
    pub fn new(id: Uuid, user_id: UserId, slot: Slot, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            slot,
            created_at,
        }
    }

    /// Stable reservation identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Booked slot.
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Commit timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Fields for a reservation row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    /// Owning user.
    pub user_id: UserId,
    /// Slot being claimed.
    pub slot: Slot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).expect("valid date")
    }

    #[rstest]
    fn empty_selection_is_rejected() {
        assert_eq!(Selection::new(vec![]), Err(SelectionValidationError::Empty));
    }

    #[rstest]
    fn three_slots_exceed_the_cap() {
        let slots = vec![
            Slot::new(date(1), 9),
            Slot::new(date(1), 10),
            Slot::new(date(1), 11),
        ];
        assert_eq!(
            Selection::new(slots),
            Err(SelectionValidationError::TooManySlots { max: 2 })
        );
    }

    #[rstest]
    fn mixed_dates_are_rejected() {
        let slots = vec![Slot::new(date(1), 9), Slot::new(date(2), 10)];
        assert_eq!(
            Selection::new(slots),
            Err(SelectionValidationError::MixedDates)
        );
    }

    #[rstest]
    #[case(9, 11)]
    #[case(9, 14)]
    fn non_consecutive_hours_are_rejected(#[case] first: u8, #[case] second: u8) {
        let slots = vec![Slot::new(date(1), first), Slot::new(date(1), second)];
        assert_eq!(
            Selection::new(slots),
            Err(SelectionValidationError::NonConsecutiveHours)
        );
    }

    #[rstest]
    fn duplicate_slots_are_rejected() {
        let slots = vec![Slot::new(date(1), 9), Slot::new(date(1), 9)];
        assert_eq!(
            Selection::new(slots),
            Err(SelectionValidationError::DuplicateSlot)
        );
    }

    #[rstest]
    fn hours_are_normalised_into_ascending_order() {
        let selection =
            Selection::new(vec![Slot::new(date(1), 10), Slot::new(date(1), 9)]).expect("valid");
        let hours: Vec<u8> = selection.slots().iter().map(|slot| slot.hour).collect();
        assert_eq!(hours, vec![9, 10]);
        assert_eq!(selection.hour_count(), 2);
        assert_eq!(selection.date(), date(1));
    }

    #[rstest]
    fn out_of_range_hour_is_rejected() {
        assert_eq!(
            Selection::new(vec![Slot::new(date(1), 24)]),
            Err(SelectionValidationError::InvalidHour { hour: 24 })
        );
    }
}
