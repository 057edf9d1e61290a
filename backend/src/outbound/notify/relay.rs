//! Notification dispatch via the facility's mail relay.
//!
//! The relay owns message composition, including the access code for the
//! physical lock; this adapter only posts booking facts to it. Dispatch is
//! best-effort by contract: callers never fail a committed reservation on a
//! relay error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::domain::ports::{BookingConfirmation, NotificationDispatcher, NotificationError};

/// Wire payload posted to the relay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmationPayload<'a> {
    to: &'a str,
    full_name: &'a str,
    slots: Vec<SlotPayload>,
    credits_remaining: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotPayload {
    date: String,
    hour: u8,
}

fn payload_for(confirmation: &BookingConfirmation) -> ConfirmationPayload<'_> {
    ConfirmationPayload {
        to: confirmation.email.as_ref(),
        full_name: &confirmation.full_name,
        slots: confirmation
            .slots
            .iter()
            .map(|slot| SlotPayload {
                date: slot.date.to_string(),
                hour: slot.hour,
            })
            .collect(),
        credits_remaining: confirmation.credits_remaining,
    }
}

/// HTTP client for the mail relay's confirmation endpoint.
pub struct HttpNotificationRelay {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotificationRelay {
    /// Build a relay client for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| NotificationError::unavailable(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationRelay {
    async fn booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload_for(confirmation))
            .send()
            .await
            .map_err(|err| NotificationError::unavailable(err.to_string()))?;

        if let Err(err) = response.error_for_status_ref() {
            return Err(NotificationError::rejected(err.to_string()));
        }
        Ok(())
    }
}

/// Dispatcher used when no relay is configured: records the confirmation in
/// the logs and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyNotificationRelay;

#[async_trait]
impl NotificationDispatcher for LogOnlyNotificationRelay {
    async fn booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        info!(
            to = %confirmation.email,
            slots = confirmation.slots.len(),
            credits_remaining = confirmation.credits_remaining,
            "booking confirmation (no relay configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::Slot;
    use crate::domain::user::Email;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    fn payload_serialises_in_camel_case() {
        let confirmation = BookingConfirmation {
            email: Email::new("ana@example.com").expect("valid email"),
            full_name: "Ana Torres".to_owned(),
            slots: vec![Slot::new(
                NaiveDate::from_ymd_opt(2026, 3, 16).expect("valid date"),
                14,
            )],
            credits_remaining: 2,
        };

        let value = serde_json::to_value(payload_for(&confirmation)).expect("serialises");
        assert_eq!(value["to"], "ana@example.com");
        assert_eq!(value["fullName"], "Ana Torres");
        assert_eq!(value["creditsRemaining"], 2);
        assert_eq!(value["slots"][0]["date"], "2026-03-16");
        assert_eq!(value["slots"][0]["hour"], 14);
    }

    #[rstest]
    #[tokio::test]
    async fn log_only_relay_always_succeeds() {
        let confirmation = BookingConfirmation {
            email: Email::new("ana@example.com").expect("valid email"),
            full_name: "Ana Torres".to_owned(),
            slots: Vec::new(),
            credits_remaining: 0,
        };
        LogOnlyNotificationRelay
            .booking_confirmed(&confirmation)
            .await
            .expect("always succeeds");
    }
}
